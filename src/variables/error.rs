//! Variable resolution errors.

/// Errors that can occur while resolving `${...}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum VarError {
    /// A placeholder path could not be fully resolved.
    ///
    /// Carries the path as written inside the placeholder.
    UnresolvedReference(String),
    /// A placeholder path does not follow the path grammar (e.g. `a[x]`).
    InvalidPath(String),
}

impl std::fmt::Display for VarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarError::UnresolvedReference(path) => {
                write!(f, "Unresolved reference: {}", path)
            }
            VarError::InvalidPath(path) => write!(f, "Invalid variable path: {}", path),
        }
    }
}

impl std::error::Error for VarError {}
