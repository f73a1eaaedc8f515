//! Ancestor expansion strategies for the two grid topologies.
//!
//! Both strategies are pure with respect to the engine: the aperture strategy
//! receives the projection as a closure, so it can be driven by a session or
//! by a test double alike.

use eaggr_common::{
    Result,
    error::{Error, ErrorKind},
};
use eaggr_format::{CellId, GeoPoint, topology::FACE_ID_LEN};
use itertools::Itertools;

/// Returns every ancestor of a hierarchical cell id, shortest first.
///
/// The sequence is `id[..2], id[..3], ..., id` and always ends with the cell
/// itself. Ids shorter than a face id are rejected.
pub fn hierarchical_ancestors(cell: &CellId) -> Result<Vec<CellId>> {
    if cell.len() < FACE_ID_LEN {
        return Err(Error::invalid_arg(
            "cell",
            format!("'{cell}' is shorter than a face id"),
        ));
    }
    (FACE_ID_LEN..=cell.len())
        .map(|len| {
            cell.prefix(len).ok_or_else(|| {
                Error::invalid_arg("cell", format!("'{cell}' is not a hierarchical id"))
            })
        })
        .collect()
}

/// Returns `seed` followed by the cells `point` projects to at successively
/// coarser accuracies, finest first.
///
/// Each step multiplies the accuracy by `aperture` and re-projects. The walk
/// stops as soon as a projection repeats the previous cell, which is then the
/// whole polyhedron face; that cell appears once. Fails with
/// `IndexerDidNotTerminate` if no repeat is seen within `max_iterations`
/// projections.
pub fn aperture_ancestors<F>(
    seed: CellId,
    point: &GeoPoint,
    aperture: u32,
    max_iterations: usize,
    mut project: F,
) -> Result<Vec<CellId>>
where
    F: FnMut(&GeoPoint) -> Result<CellId>,
{
    let mut accuracy = point.accuracy;
    let mut cells = vec![seed];
    for iteration in 1..=max_iterations {
        accuracy *= f64::from(aperture);
        let cell = project(&point.with_accuracy(accuracy))?;
        log::trace!("aperture step {iteration}: accuracy {accuracy} -> {cell}");
        if cells.last() == Some(&cell) {
            return Ok(cells);
        }
        cells.push(cell);
    }
    log::debug!(
        "no repeated cell after {max_iterations} projections, last cells: {}",
        cells.iter().rev().take(3).join(", ")
    );
    Err(ErrorKind::IndexerDidNotTerminate {
        iterations: max_iterations,
    }
    .into())
}

/// Scales `accuracy`, chosen for cells at `from_resolution`, to the matching
/// accuracy for the coarser `to_resolution`.
///
/// A target finer than the source leaves the accuracy unchanged.
pub fn rescale_accuracy(
    accuracy: f64,
    aperture: u32,
    from_resolution: u32,
    to_resolution: u32,
) -> f64 {
    let steps = from_resolution.saturating_sub(to_resolution);
    let exponent = i32::try_from(steps).unwrap_or(i32::MAX);
    accuracy * f64::from(aperture).powi(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(cells: &'static [&'static str]) -> impl FnMut(&GeoPoint) -> Result<CellId> {
        let mut remaining = cells.iter();
        move |_| {
            remaining
                .next()
                .map(|id| CellId::new(*id))
                .ok_or_else(|| Error::invalid_arg("point", "chain exhausted"))
        }
    }

    #[test]
    fn test_hierarchical_ancestors() {
        let cell = CellId::new("07231131111113100331001");
        let ancestors = hierarchical_ancestors(&cell).unwrap();
        assert_eq!(ancestors.len(), 22);
        assert_eq!(ancestors[0].as_str(), "07");
        assert_eq!(ancestors[1].as_str(), "072");
        assert_eq!(ancestors[2].as_str(), "0723");
        assert_eq!(ancestors.last(), Some(&cell));
        for (shorter, longer) in ancestors.iter().tuple_windows() {
            assert_eq!(shorter.len() + 1, longer.len());
            assert!(longer.as_str().starts_with(shorter.as_str()));
        }
    }

    #[test]
    fn test_hierarchical_face_cell() {
        let ancestors = hierarchical_ancestors(&"07".into()).unwrap();
        assert_eq!(ancestors, vec![CellId::new("07")]);
        assert!(matches!(
            hierarchical_ancestors(&"0".into()).unwrap_err().kind(),
            ErrorKind::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_aperture_emits_face_once() {
        let cells = aperture_ancestors(
            "07040,12".into(),
            &GeoPoint::new(1.0, 2.0, 3.0),
            3,
            16,
            chain(&["07031,7", "07020,4", "07000,0", "07000,0"]),
        )
        .unwrap();
        let ids = cells.iter().map(CellId::as_str).collect_vec();
        assert_eq!(ids, ["07040,12", "07031,7", "07020,4", "07000,0"]);
    }

    #[test]
    fn test_aperture_seed_already_face() {
        let cells = aperture_ancestors(
            "07000,0".into(),
            &GeoPoint::new(1.0, 2.0, 3.0),
            3,
            16,
            chain(&["07000,0"]),
        )
        .unwrap();
        assert_eq!(cells, vec![CellId::new("07000,0")]);
    }

    #[test]
    fn test_aperture_scales_accuracy() {
        let mut seen = Vec::new();
        let cells = aperture_ancestors(
            "a".into(),
            &GeoPoint::new(1.0, 2.0, 2.0),
            3,
            16,
            |point: &GeoPoint| {
                seen.push(point.accuracy);
                Ok(CellId::new(if point.accuracy < 10.0 { "b" } else { "c" }))
            },
        )
        .unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(seen, [6.0, 18.0, 54.0]);
    }

    #[test]
    fn test_aperture_bounded() {
        let mut next = 0u32;
        let err = aperture_ancestors(
            "seed".into(),
            &GeoPoint::new(1.0, 2.0, 3.0),
            3,
            5,
            |_: &GeoPoint| {
                next += 1;
                Ok(CellId::new(next.to_string()))
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::IndexerDidNotTerminate { iterations: 5 }
        ));
        assert_eq!(next, 5);
    }

    #[test]
    fn test_aperture_propagates_projection_error() {
        let err = aperture_ancestors(
            "07040,12".into(),
            &GeoPoint::new(1.0, 2.0, 3.0),
            3,
            16,
            chain(&[]),
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_rescale_accuracy() {
        assert_eq!(rescale_accuracy(2.0, 3, 4, 2), 18.0);
        assert_eq!(rescale_accuracy(2.0, 3, 2, 2), 2.0);
        assert_eq!(rescale_accuracy(2.0, 3, 1, 2), 2.0);
        assert_eq!(rescale_accuracy(1.0, 4, 3, 0), 64.0);
    }
}
