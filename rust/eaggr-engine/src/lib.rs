//! Sessions against the native DGGS geometry engine.
//!
//! The engine is reached through the [`EngineBoundary`] trait, which mirrors
//! the engine's C entry points one to one and speaks only in boundary records
//! and raw status codes. [`EngineSession`] sits on top of a boundary, owns one
//! engine handle, and exposes the operations in terms of cell ids and shapes.
//!
//! With the `native` feature, [`native::NativeEngine`] binds the boundary to
//! the `eaggr` shared library.

pub mod allocation;
pub mod boundary;
#[cfg(feature = "native")]
pub mod native;
pub mod session;

pub use allocation::BoundaryAllocation;
pub use boundary::{EngineBoundary, RawResult, RawStatus};
pub use session::EngineSession;

/// Maximum number of parents a cell can have.
pub const MAX_PARENT_CELLS: usize = 3;

/// Maximum number of children a cell can have.
pub const MAX_CHILD_CELLS: usize = 7;

/// Maximum number of siblings a cell can have.
pub const MAX_SIBLING_CELLS: usize = 15;

/// Size of the engine version string buffer, terminator included.
pub const VERSION_STRING_LENGTH: usize = 5;
