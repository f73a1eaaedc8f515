//! Reference data for tests and an engine scripted with it.
//!
//! Triangular projections, hexagonal parents, children and siblings, and
//! [`POINT_A_ISEA3H`] are values the native engine returns. The hexagonal
//! aperture chains and their bounding cell are scripted: they use a short
//! id layout that keeps the walk readable and are never compared against
//! the native engine.

use eaggr_format::{GeoPoint, Topology};

use crate::ScriptedEngine;

pub const POINT_A: GeoPoint = GeoPoint::new(1.234, 2.345, 3.879);
pub const POINT_B: GeoPoint = GeoPoint::new(3.456, 4.567, 3.879);

pub const POINT_A_ISEA4T: &str = "07231131111113100331001";
pub const POINT_B_ISEA4T: &str = "07012000001303022011321";

/// Hexagonal cell the native engine projects `POINT_A` to at its accuracy.
pub const POINT_A_ISEA3H: &str = "0728-549628,-522499";

/// Scripted hexagonal cells for `POINT_A` at its accuracy times successive
/// powers of three, ending at the whole face.
pub const POINT_A_ISEA3H_CHAIN: [&str; 5] = ["07040,12", "07031,7", "07020,4", "07011,2", "07000,0"];

/// Scripted hexagonal cells for `POINT_B`, as for [`POINT_A_ISEA3H_CHAIN`].
pub const POINT_B_ISEA3H_CHAIN: [&str; 5] = ["07040,15", "07031,9", "07020,4", "07011,2", "07000,0"];

/// Scripted bounding cell of the finest cells of both chains.
pub const POINTS_ISEA3H_BOUNDING: &str = "07020,4";

pub const ISEA3H_SINGLE_PARENT: (&str, &[&str]) = ("01033,6", &["01022,3"]);

pub const ISEA3H_THREE_PARENTS: (&str, &[&str]) = ("01035,2", &["01023,1", "01024,1", "01023,0"]);

pub const ISEA3H_CHILDREN: (&str, &[&str]) = (
    "01031,3",
    &["01043,4", "01042,4", "01043,5", "01044,4", "01043,3", "01042,5", "01044,5"],
);

pub const ISEA3H_SIBLINGS: (&str, &[&str]) = (
    "01054,2",
    &[
        "01054,3", "01053,3", "01054,4", "01055,3", "01055,4", "01055,2", "01054,1", "01053,1",
        "01055,1", "01054,0", "01055,0", "01053,2", "01052,2", "01052,3", "01052,1",
    ],
);

/// Three adjacent triangular cells and their bounding cell.
pub const ISEA4T_ADJACENT: [&str; 3] = ["07001", "07002", "07003"];
pub const ISEA4T_ADJACENT_BOUNDING: &str = "0700";

/// Triangular shapes used for predicate checks.
pub mod triangles {
    pub const CELL: &str = "0000";
    pub const CHILD: &str = "00000";
    pub const PARENT: &str = "000";
    pub const DISJOINT: &str = "0011";
    pub const LINESTRING: [&str; 3] = ["0001", "0002", "0003"];
    pub const POLYGON_OUTER: [&str; 4] = ["00111", "0002", "0001", "00333"];
    pub const POLYGON_INNER: [&str; 3] = ["00312", "00302", "00321"];
}

/// An engine scripted with every reference value in this module.
pub fn reference_engine() -> ScriptedEngine {
    let engine = ScriptedEngine::new()
        .with_projection(Topology::Isea4t, POINT_A, POINT_A_ISEA4T)
        .with_projection(Topology::Isea4t, POINT_B, POINT_B_ISEA4T)
        .with_aperture_chain(Topology::Isea3h, POINT_A, &POINT_A_ISEA3H_CHAIN)
        .with_aperture_chain(Topology::Isea3h, POINT_B, &POINT_B_ISEA3H_CHAIN)
        .with_bounding(
            &[POINT_A_ISEA3H_CHAIN[0], POINT_B_ISEA3H_CHAIN[0]],
            POINTS_ISEA3H_BOUNDING,
        )
        .with_centre(POINT_A_ISEA4T, POINT_A)
        .with_centre(POINT_B_ISEA4T, POINT_B);
    [
        ISEA3H_SINGLE_PARENT,
        ISEA3H_THREE_PARENTS,
    ]
    .into_iter()
    .fold(engine, |engine, (cell, parents)| engine.with_parents(cell, parents))
    .with_children(ISEA3H_CHILDREN.0, ISEA3H_CHILDREN.1)
    .with_siblings(ISEA3H_SIBLINGS.0, ISEA3H_SIBLINGS.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chains_share_face() {
        assert_eq!(POINT_A_ISEA3H_CHAIN.last(), POINT_B_ISEA3H_CHAIN.last());
        assert!(POINT_A_ISEA3H_CHAIN.contains(&POINTS_ISEA3H_BOUNDING));
        assert_eq!(ISEA3H_CHILDREN.1.len(), 7);
        assert_eq!(ISEA3H_SIBLINGS.1.len(), 15);
    }
}
