//! Test support: a deterministic engine double and reference data.
//!
//! [`ScriptedEngine`] implements the engine boundary without the native
//! library. Projections, hexagonal-grid relations and predicate outcomes are
//! scripted; the triangular grid's hierarchy is derived from the ids
//! themselves. Every boundary call is counted and every buffer handed out is
//! tracked until it is deallocated, see [`EngineStats`].

pub mod datasets;
pub mod engine;
pub mod hierarchy;
pub mod stats;

pub use engine::{ScriptedEngine, ScriptedHandle, ScriptedShapes, ScriptedString};
pub use stats::{Call, EngineStats};
