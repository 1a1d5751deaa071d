//! Utility types shared by the codec modules.
//!
//! - [`Error`] / [`Result`] / [`ErrorKind`] - Error handling
//! - [`validate_resource_uri`] - Sandbox check for external references
//! - [`percent_encode_path`] - Relative reference from a file name

mod error;
mod uri;

pub use error::*;
pub use uri::*;
