//! Cell tokens for a search index field.

use eaggr_common::{Result, error::Error};
use eaggr_engine::{EngineBoundary, EngineSession};
use eaggr_format::{CellId, GeoPoint, GeoShape, Topology};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::indexer::{IndexerOptions, MultiResolutionIndexer};

/// Name of the field the cell tokens are stored under.
pub const CELL_ID_FIELD: &str = "eaggr-dggs-cellid";

/// Mapping parameters of a cell-indexed field.
///
/// ```json
/// { "accuracy": 3.879, "model": "ISEA3H", "points_only": false }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellFieldMapping {
    /// Area in square metres of the finest cells indexed.
    pub accuracy: f64,
    #[serde(default)]
    pub model: Topology,
    /// Rejects anything but points when set.
    #[serde(default)]
    pub points_only: bool,
}

impl CellFieldMapping {
    pub fn new(accuracy: f64, model: Topology) -> CellFieldMapping {
        CellFieldMapping {
            accuracy,
            model,
            points_only: false,
        }
    }

    pub fn points_only(mut self, points_only: bool) -> Self {
        self.points_only = points_only;
        self
    }

    pub fn from_json(text: &str) -> Result<CellFieldMapping> {
        let mapping: CellFieldMapping = serde_json::from_str(text)
            .map_err(|e| Error::invalid_format("field mapping", e.to_string()))?;
        mapping.validate()?;
        Ok(mapping)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(Error::invalid_arg(
                "accuracy",
                format!("accuracy {} must be a positive area", self.accuracy),
            ));
        }
        Ok(())
    }
}

/// Tokens to store for one indexed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedCells {
    pub field: &'static str,
    pub tokens: Vec<CellId>,
}

impl std::fmt::Display for IndexedCells {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [{}]", self.field, self.tokens.iter().join(", "))
    }
}

/// Produces field tokens for documents under one mapping.
pub struct CellFieldIndexer<'s, B: EngineBoundary> {
    indexer: MultiResolutionIndexer<'s, B>,
    mapping: CellFieldMapping,
}

impl<'s, B: EngineBoundary> CellFieldIndexer<'s, B> {
    /// Creates an indexer for `mapping` over a session of the mapping's model.
    pub fn new(session: &'s EngineSession<B>, mapping: CellFieldMapping) -> Result<Self> {
        Self::with_options(session, mapping, IndexerOptions::default())
    }

    pub fn with_options(
        session: &'s EngineSession<B>,
        mapping: CellFieldMapping,
        options: IndexerOptions,
    ) -> Result<Self> {
        mapping.validate()?;
        if session.topology() != mapping.model {
            return Err(Error::invalid_arg(
                "session",
                format!(
                    "mapping model {} does not match the {} session",
                    mapping.model,
                    session.topology()
                ),
            ));
        }
        Ok(CellFieldIndexer {
            indexer: options.indexer(session),
            mapping,
        })
    }

    pub fn mapping(&self) -> &CellFieldMapping {
        &self.mapping
    }

    pub fn index_point(&self, latitude: f64, longitude: f64) -> Result<IndexedCells> {
        let point = GeoPoint::new(latitude, longitude, self.mapping.accuracy);
        Ok(self.tokens(self.indexer.index_point(&point)?))
    }

    /// Indexes a shape at the mapping accuracy. The accuracy carried by the
    /// shape's own points is ignored.
    pub fn index_shape(&self, shape: &GeoShape) -> Result<IndexedCells> {
        if self.mapping.points_only && !matches!(shape, GeoShape::Point(_)) {
            return Err(Error::invalid_arg(
                "shape",
                format!("field {CELL_ID_FIELD} is configured for points only"),
            ));
        }
        let vertices = shape
            .vertices()
            .iter()
            .map(|point| point.with_accuracy(self.mapping.accuracy))
            .collect_vec();
        Ok(self.tokens(self.indexer.index_vertices(&vertices)?))
    }

    fn tokens(&self, tokens: Vec<CellId>) -> IndexedCells {
        let cells = IndexedCells {
            field: CELL_ID_FIELD,
            tokens,
        };
        log::trace!("{cells}");
        cells
    }
}
