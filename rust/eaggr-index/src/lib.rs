//! Multi-resolution cell indexing on top of an engine session.
//!
//! A location is indexed by every cell covering it, from the requested
//! resolution up to the polyhedron face, so that a search index can match it
//! at any resolution with a single exact-token lookup. Queries resolve to one
//! cell at the query accuracy.

pub mod ancestors;
pub mod bounding;
pub mod indexer;
pub mod mapping;
pub mod query;

pub use bounding::BoundingCellResolver;
pub use indexer::{IndexerOptions, MultiResolutionIndexer};
pub use mapping::{CELL_ID_FIELD, CellFieldIndexer, CellFieldMapping, IndexedCells};
pub use query::{CellQuery, QueryCellResolver, resolve_query};
