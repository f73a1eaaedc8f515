//! Shapes expressed as grid cells, and the geographic shapes they are projected from.

use eaggr_common::{Result, error::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::cell::CellId;

/// How many polyhedron faces a point-derived cell touches.
///
/// Only cells produced from points carry a meaningful location; linestrings
/// and polygons are always [`ShapeLocation::NoLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ShapeLocation {
    OneFace = 0,
    TwoFaces = 1,
    ManyFaces = 2,
    NoLocation = 3,
}

impl ShapeLocation {
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ShapeLocation {
    type Error = eaggr_common::error::Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(ShapeLocation::OneFace),
            1 => Ok(ShapeLocation::TwoFaces),
            2 => Ok(ShapeLocation::ManyFaces),
            3 => Ok(ShapeLocation::NoLocation),
            _ => Err(ErrorKind::InvalidFormat {
                element: "shape location".to_string(),
                message: format!("unknown value {raw}"),
            }
            .into()),
        }
    }
}

/// An ordered chain of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Linestring {
    cells: Vec<CellId>,
}

impl Linestring {
    pub fn new(cells: Vec<CellId>) -> Linestring {
        Linestring { cells }
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<CellId> {
        self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<C: Into<CellId>> FromIterator<C> for Linestring {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Linestring::new(iter.into_iter().map(Into::into).collect())
    }
}

/// A polygon with a mandatory outer ring and any number of holes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    outer: Linestring,
    inner: Vec<Linestring>,
}

impl Polygon {
    pub fn new(outer: Linestring, inner: Vec<Linestring>) -> Polygon {
        Polygon { outer, inner }
    }

    pub fn outer_ring(&self) -> &Linestring {
        &self.outer
    }

    pub fn inner_rings(&self) -> &[Linestring] {
        &self.inner
    }
}

/// A shape made of grid cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Cell {
        cell: CellId,
        location: ShapeLocation,
    },
    Linestring(Linestring),
    Polygon(Polygon),
}

impl Shape {
    /// Creates a single-cell shape lying on one face, the location the engine
    /// assumes for caller-supplied cells.
    pub fn cell(cell: impl Into<CellId>) -> Shape {
        Shape::Cell {
            cell: cell.into(),
            location: ShapeLocation::OneFace,
        }
    }

    pub fn location(&self) -> ShapeLocation {
        match self {
            Shape::Cell { location, .. } => *location,
            Shape::Linestring(_) | Shape::Polygon(_) => ShapeLocation::NoLocation,
        }
    }

    pub fn as_cell(&self) -> Option<&CellId> {
        match self {
            Shape::Cell { cell, .. } => Some(cell),
            _ => None,
        }
    }

    pub fn as_linestring(&self) -> Option<&Linestring> {
        match self {
            Shape::Linestring(linestring) => Some(linestring),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Shape::Polygon(polygon) => Some(polygon),
            _ => None,
        }
    }
}

impl From<Linestring> for Shape {
    fn from(linestring: Linestring) -> Self {
        Shape::Linestring(linestring)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

/// A WGS84 location together with the ground resolution it should be indexed at.
///
/// `accuracy` is an area in square metres. It selects the grid resolution the
/// engine projects to; it is not a measurement error bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64, accuracy: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
            accuracy,
        }
    }

    /// Returns the same location at a different accuracy.
    pub const fn with_accuracy(self, accuracy: f64) -> GeoPoint {
        GeoPoint { accuracy, ..self }
    }
}

/// An ordered chain of geographic points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLinestring {
    points: Vec<GeoPoint>,
}

impl GeoLinestring {
    pub fn new(points: Vec<GeoPoint>) -> GeoLinestring {
        GeoLinestring { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<GeoPoint> for GeoLinestring {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        GeoLinestring::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPolygon {
    outer: GeoLinestring,
    inner: Vec<GeoLinestring>,
}

impl GeoPolygon {
    pub fn new(outer: GeoLinestring, inner: Vec<GeoLinestring>) -> GeoPolygon {
        GeoPolygon { outer, inner }
    }

    pub fn outer_ring(&self) -> &GeoLinestring {
        &self.outer
    }

    pub fn inner_rings(&self) -> &[GeoLinestring] {
        &self.inner
    }
}

/// A shape in geographic coordinates, used only as engine input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeoShape {
    Point(GeoPoint),
    Linestring(GeoLinestring),
    Polygon(GeoPolygon),
}

impl GeoShape {
    /// The points that define the extent of the shape: the point itself, every
    /// point of a linestring, or the outer ring of a polygon.
    pub fn vertices(&self) -> &[GeoPoint] {
        match self {
            GeoShape::Point(point) => std::slice::from_ref(point),
            GeoShape::Linestring(linestring) => linestring.points(),
            GeoShape::Polygon(polygon) => polygon.outer_ring().points(),
        }
    }
}

impl From<GeoPoint> for GeoShape {
    fn from(point: GeoPoint) -> Self {
        GeoShape::Point(point)
    }
}

impl From<GeoLinestring> for GeoShape {
    fn from(linestring: GeoLinestring) -> Self {
        GeoShape::Linestring(linestring)
    }
}

impl From<GeoPolygon> for GeoShape {
    fn from(polygon: GeoPolygon) -> Self {
        GeoShape::Polygon(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_of_extended_shapes() {
        let line: Linestring = ["0001", "0002"].into_iter().collect();
        assert_eq!(Shape::from(line.clone()).location(), ShapeLocation::NoLocation);
        let polygon = Polygon::new(line, vec![]);
        assert_eq!(Shape::from(polygon).location(), ShapeLocation::NoLocation);
        assert_eq!(Shape::cell("0000").location(), ShapeLocation::OneFace);
    }

    #[test]
    fn test_shape_location_raw_values() {
        for raw in 0..4 {
            assert_eq!(ShapeLocation::try_from(raw).unwrap().as_raw(), raw);
        }
        assert!(ShapeLocation::try_from(4).is_err());
    }

    #[test]
    fn test_vertices_of_polygon_use_outer_ring() {
        let outer: GeoLinestring = [
            GeoPoint::new(1.0, 2.0, 3.0),
            GeoPoint::new(1.5, 2.5, 3.0),
        ]
        .into_iter()
        .collect();
        let hole: GeoLinestring = [GeoPoint::new(1.2, 2.2, 3.0)].into_iter().collect();
        let shape = GeoShape::from(GeoPolygon::new(outer.clone(), vec![hole]));
        assert_eq!(shape.vertices(), outer.points());

        let point = GeoPoint::new(1.0, 2.0, 3.0);
        assert_eq!(GeoShape::from(point).vertices(), &[point]);
    }

    #[test]
    fn test_with_accuracy_keeps_location() {
        let point = GeoPoint::new(1.234, 2.345, 3.879).with_accuracy(9.0);
        assert_eq!(point, GeoPoint::new(1.234, 2.345, 9.0));
    }
}
