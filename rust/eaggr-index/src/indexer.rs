//! Multi-resolution indexing of points and shapes.

use eaggr_common::{Result, verify_arg};
use eaggr_engine::{EngineBoundary, EngineSession};
use eaggr_format::{CellId, GeoPoint, GeoShape, Topology};

use crate::{
    ancestors::{aperture_ancestors, hierarchical_ancestors, rescale_accuracy},
    bounding::BoundingCellResolver,
};

/// Options for creating a [`MultiResolutionIndexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerOptions {
    max_iterations: usize,
}

impl IndexerOptions {
    /// Upper bound on re-projections for the aperture topology. Walking from
    /// the finest resolution the engine supports to a face takes far fewer.
    pub const DEFAULT_MAX_ITERATIONS: usize = 128;

    pub fn new() -> IndexerOptions {
        IndexerOptions {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the maximum number of re-projections before indexing fails with
    /// `IndexerDidNotTerminate`.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Creates an indexer over `session` with these options.
    pub fn indexer<B: EngineBoundary>(
        self,
        session: &EngineSession<B>,
    ) -> MultiResolutionIndexer<'_, B> {
        MultiResolutionIndexer {
            session,
            options: self,
        }
    }
}

impl Default for IndexerOptions {
    fn default() -> Self {
        IndexerOptions::new()
    }
}

/// Derives the cell ids of every resolution level covering a point or shape.
///
/// The strategy follows the session topology. For the hierarchical topology
/// ancestors are prefixes of the projected id and are listed shortest first;
/// for the aperture topology they come from re-projecting at coarser
/// accuracies and are listed finest first. Either way the result is the set
/// of tokens a search index stores for the location.
pub struct MultiResolutionIndexer<'s, B: EngineBoundary> {
    session: &'s EngineSession<B>,
    options: IndexerOptions,
}

impl<'s, B: EngineBoundary> MultiResolutionIndexer<'s, B> {
    pub fn new(session: &'s EngineSession<B>) -> Self {
        IndexerOptions::default().indexer(session)
    }

    pub fn topology(&self) -> Topology {
        self.session.topology()
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    /// Returns the cells covering `point` at its accuracy and every coarser
    /// resolution.
    pub fn index_point(&self, point: &GeoPoint) -> Result<Vec<CellId>> {
        let cell = self.session.project_point(point)?;
        self.expand(cell, point)
    }

    /// Returns the cells covering the extent of `shape` at every resolution
    /// from its bounding cell up to the face.
    pub fn index_shape(&self, shape: &GeoShape) -> Result<Vec<CellId>> {
        self.index_vertices(shape.vertices())
    }

    /// Indexes the extent described by `vertices`.
    ///
    /// A single vertex is indexed as a point. Otherwise every vertex is
    /// projected, the bounding cell of the projections seeds the expansion,
    /// and for the aperture topology the first vertex is re-projected with
    /// its accuracy scaled to the bounding cell's resolution.
    pub fn index_vertices(&self, vertices: &[GeoPoint]) -> Result<Vec<CellId>> {
        verify_arg!(vertices, !vertices.is_empty());
        let first = &vertices[0];
        if vertices.len() == 1 {
            return self.index_point(first);
        }
        let cells = self.session.project_points(vertices)?;
        let bounding = BoundingCellResolver::new(self.session).resolve(&cells)?;
        let topology = self.topology();
        if topology.is_hierarchical() {
            return hierarchical_ancestors(&bounding);
        }
        let accuracy = rescale_accuracy(
            first.accuracy,
            topology.aperture(),
            topology.resolution(&cells[0])?,
            topology.resolution(&bounding)?,
        );
        log::trace!(
            "bounding cell {bounding} of {} vertices, start accuracy {accuracy}",
            vertices.len()
        );
        self.expand(bounding, &first.with_accuracy(accuracy))
    }

    fn expand(&self, seed: CellId, point: &GeoPoint) -> Result<Vec<CellId>> {
        let topology = self.topology();
        if topology.is_hierarchical() {
            return hierarchical_ancestors(&seed);
        }
        aperture_ancestors(
            seed,
            point,
            topology.aperture(),
            self.options.max_iterations,
            |point| self.session.project_point(point),
        )
    }
}
