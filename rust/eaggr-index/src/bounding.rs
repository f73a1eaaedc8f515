//! Smallest common ancestor of a set of cells.

use eaggr_common::{
    Result, StatusCode,
    error::{Error, ErrorKind},
    verify_arg,
};
use eaggr_engine::{EngineBoundary, EngineSession};
use eaggr_format::{CellId, GeoPoint};

/// Fragment of the engine message reported for cells on different faces.
const NO_COMMON_PARENT: &str = "common parent";

/// Resolves bounding cells through an engine session.
pub struct BoundingCellResolver<'s, B: EngineBoundary> {
    session: &'s EngineSession<B>,
}

impl<'s, B: EngineBoundary> BoundingCellResolver<'s, B> {
    pub fn new(session: &'s EngineSession<B>) -> Self {
        BoundingCellResolver { session }
    }

    /// Returns the smallest cell that is an ancestor of every cell in `cells`.
    ///
    /// A single cell bounds itself. Cells on disjoint faces fail with
    /// `NoCommonAncestor`; any other engine failure is returned unchanged.
    pub fn resolve(&self, cells: &[CellId]) -> Result<CellId> {
        verify_arg!(cells, !cells.is_empty());
        self.session
            .bounding_cell(cells)
            .map_err(no_common_ancestor)
    }

    /// Projects `points` and returns the bounding cell of the result.
    pub fn resolve_points(&self, points: &[GeoPoint]) -> Result<CellId> {
        verify_arg!(points, !points.is_empty());
        let cells = self.session.project_points(points)?;
        self.resolve(&cells)
    }
}

fn no_common_ancestor(err: Error) -> Error {
    match err.kind() {
        ErrorKind::EngineOperationFailed {
            code: StatusCode::InvalidParam,
            message,
            ..
        } if message.contains(NO_COMMON_PARENT) => ErrorKind::NoCommonAncestor {
            message: message.clone(),
        }
        .into(),
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaggr_format::Topology;
    use eaggr_testkit::{
        Call, ScriptedEngine,
        datasets::{self, ISEA4T_ADJACENT, ISEA4T_ADJACENT_BOUNDING},
    };

    fn cells(ids: &[&str]) -> Vec<CellId> {
        ids.iter().map(|id| CellId::new(*id)).collect()
    }

    #[test]
    fn test_adjacent_cells() {
        let mut session = EngineSession::open(ScriptedEngine::new(), Topology::Isea4t).unwrap();
        let resolver = BoundingCellResolver::new(&session);
        let bounding = resolver.resolve(&cells(&ISEA4T_ADJACENT)).unwrap();
        assert_eq!(bounding.as_str(), ISEA4T_ADJACENT_BOUNDING);
        session.close().unwrap();
    }

    #[test]
    fn test_single_cell_bounds_itself() {
        for topology in [Topology::Isea4t, Topology::Isea3h] {
            let mut session = EngineSession::open(datasets::reference_engine(), topology).unwrap();
            let cell = CellId::new(datasets::ISEA3H_SINGLE_PARENT.0);
            let bounding = BoundingCellResolver::new(&session).resolve(&[cell.clone()]);
            assert_eq!(bounding.unwrap(), cell);
            session.close().unwrap();
        }
    }

    #[test]
    fn test_disjoint_faces() {
        let mut session = EngineSession::open(ScriptedEngine::new(), Topology::Isea4t).unwrap();
        let err = BoundingCellResolver::new(&session)
            .resolve(&cells(&["0700", "1200"]))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NoCommonAncestor { .. }));
        session.close().unwrap();
    }

    #[test]
    fn test_other_failures_pass_through() {
        let engine = ScriptedEngine::new().with_failure(
            Call::BoundingCell,
            StatusCode::ModelError,
            "model failure",
        );
        let mut session = EngineSession::open(engine, Topology::Isea4t).unwrap();
        let err = BoundingCellResolver::new(&session)
            .resolve(&cells(&ISEA4T_ADJACENT))
            .unwrap_err();
        assert_eq!(err.engine_code(), Some(StatusCode::ModelError));
        session.close().unwrap();
    }

    #[test]
    fn test_empty_input_is_rejected_locally() {
        let engine = ScriptedEngine::new();
        let stats = engine.stats();
        let mut session = EngineSession::open(engine, Topology::Isea4t).unwrap();
        let resolver = BoundingCellResolver::new(&session);
        assert!(matches!(
            resolver.resolve(&[]).unwrap_err().kind(),
            ErrorKind::InvalidArgument { .. }
        ));
        assert!(resolver.resolve_points(&[]).is_err());
        assert_eq!(stats.calls(Call::BoundingCell), 0);
        session.close().unwrap();
    }

    #[test]
    fn test_resolve_points() {
        let mut session =
            EngineSession::open(datasets::reference_engine(), Topology::Isea3h).unwrap();
        let points = [datasets::POINT_A, datasets::POINT_B];
        let bounding = BoundingCellResolver::new(&session)
            .resolve_points(&points)
            .unwrap();
        assert_eq!(bounding.as_str(), datasets::POINTS_ISEA3H_BOUNDING);
        session.close().unwrap();
    }
}
