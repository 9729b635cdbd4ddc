//! Data models shared by the substitution engine, the matcher and the pipeline.

pub mod request;
pub mod response;
pub mod value;

pub use request::{Body, HttpMethod, Request, RequestDetails, Validation};
pub use response::Response;
pub use value::{parse_path, resolve_index, Dictionary, PathSegment, Value};
