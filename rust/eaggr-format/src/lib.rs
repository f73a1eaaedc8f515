//! Data model and boundary wire format for DGGS shapes.
//!
//! - [`cell`]: cell identifiers and their fixed-width encoding.
//! - [`shape`]: cell-based shapes and their geographic counterparts.
//! - [`topology`]: the supported grid topologies.
//! - [`predicate`]: spatial predicate vocabulary.
//! - [`shape_string`]: textual shape formats understood by the engine.
//! - [`wire`]: tagged-union records exchanged with the engine.

pub mod cell;
pub mod predicate;
pub mod shape;
pub mod shape_string;
pub mod topology;
pub mod wire;
#[cfg(test)]
mod tests;

pub use cell::{CellId, EncodedCell, MAX_CELL_LEN};
pub use predicate::Predicate;
pub use shape::{
    GeoLinestring, GeoPoint, GeoPolygon, GeoShape, Linestring, Polygon, Shape, ShapeLocation,
};
pub use shape_string::ShapeStringFormat;
pub use topology::Topology;
