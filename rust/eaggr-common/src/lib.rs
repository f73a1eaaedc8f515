//! Core definitions shared by all eaggr-* crates: the error type, the `Result`
//! alias, argument verification macros and the engine status codes.

pub mod error;
pub mod result;
pub mod status;

pub use result::Result;
pub use status::StatusCode;
