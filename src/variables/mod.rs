//! Variables module
//!
//! Resolution of `${...}` placeholders against a layered variable context,
//! including request-local array mutation directives.

pub mod context;
pub mod error;
pub mod mutation;
pub mod substitution;

pub use context::VariableContext;
pub use error::VarError;
pub use mutation::{apply_overrides, Mutation};
pub use substitution::{substitute, substitute_string, substitute_text};
