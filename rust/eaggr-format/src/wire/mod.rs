//! Boundary wire format for shapes.
//!
//! Shapes are converted to [`TaggedRecord`]s right before a boundary call and
//! decoded back into [`Shape`]s right after one; raw records never travel
//! further than that.

pub mod flat;
pub mod record;

use eaggr_common::{Result, error::Error, error::ErrorKind};

use crate::{
    cell::CellId,
    shape::{GeoLinestring, GeoPolygon, GeoShape, Linestring, Polygon, Shape, ShapeLocation},
};

pub use flat::{CellBuffer, FlatBuffer, FlatSlice, GeoPointRecord, PointBuffer};
pub use record::{GeoShapeRecord, RecordView, RingHeader, ShapeRecord, TaggedRecord};

/// Record discriminant. Geographic records use the same ordinals, with
/// [`ShapeKind::Cell`] standing for a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ShapeKind {
    Cell = 0,
    Linestring = 1,
    Polygon = 2,
}

impl ShapeKind {
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ShapeKind {
    type Error = Error;

    fn try_from(discriminant: u32) -> Result<Self> {
        match discriminant {
            0 => Ok(ShapeKind::Cell),
            1 => Ok(ShapeKind::Linestring),
            2 => Ok(ShapeKind::Polygon),
            _ => Err(ErrorKind::UnsupportedShapeType { discriminant }.into()),
        }
    }
}

/// Encodes a cell shape into its boundary record.
pub fn to_wire(shape: &Shape) -> Result<ShapeRecord> {
    match shape {
        Shape::Cell { cell, location } => {
            if cell.is_empty() {
                return Err(Error::invalid_arg("cell", "cell id is empty"));
            }
            let encoded = cell
                .encode()
                .map_err(|e| Error::encoding_overflow("cell", e))?;
            ShapeRecord::single(&encoded, *location)
        }
        Shape::Linestring(linestring) => {
            let cells = encode_ring(linestring, "linestring")?;
            ShapeRecord::linestring(cells.as_slice())
        }
        Shape::Polygon(polygon) => {
            let outer = encode_ring(polygon.outer_ring(), "polygon outer ring")?;
            let inner = polygon
                .inner_rings()
                .iter()
                .enumerate()
                .map(|(i, ring)| encode_ring(ring, &format!("polygon inner ring[{i}]")))
                .collect::<Result<Vec<_>>>()?;
            let inner_slices = inner.iter().map(CellBuffer::as_slice).collect::<Vec<_>>();
            ShapeRecord::polygon(outer.as_slice(), &inner_slices)
        }
    }
}

/// Decodes a boundary record into a cell shape.
///
/// The discriminant is checked before any payload byte is read. Linestrings
/// and polygons always decode with [`ShapeLocation::NoLocation`] regardless
/// of the record's location tag.
pub fn from_wire(record: &ShapeRecord) -> Result<Shape> {
    match record.view()? {
        RecordView::Single(bytes) => {
            let cell = CellId::decode(bytes)?;
            if cell.is_empty() {
                return Err(Error::invalid_format("cell", "cell id is empty"));
            }
            Ok(Shape::Cell {
                cell,
                location: ShapeLocation::try_from(record.raw_location())?,
            })
        }
        RecordView::Linestring(cells) => Ok(Shape::Linestring(Linestring::new(cells.to_cells()?))),
        RecordView::Polygon { outer, inner } => {
            let inner = inner
                .iter()
                .map(|ring| ring.to_cells().map(Linestring::new))
                .collect::<Result<Vec<_>>>()?;
            Ok(Shape::Polygon(Polygon::new(
                Linestring::new(outer.to_cells()?),
                inner,
            )))
        }
    }
}

/// Encodes a geographic shape into its boundary record.
pub fn geo_to_wire(shape: &GeoShape) -> Result<GeoShapeRecord> {
    match shape {
        GeoShape::Point(point) => GeoShapeRecord::single(
            bytemuck::bytes_of(&GeoPointRecord::from(*point)),
            ShapeLocation::NoLocation,
        ),
        GeoShape::Linestring(linestring) => {
            let points = PointBuffer::from_points(linestring.points());
            GeoShapeRecord::linestring(points.as_slice())
        }
        GeoShape::Polygon(polygon) => {
            let outer = PointBuffer::from_points(polygon.outer_ring().points());
            let inner = polygon
                .inner_rings()
                .iter()
                .map(|ring| PointBuffer::from_points(ring.points()))
                .collect::<Vec<_>>();
            let inner_slices = inner.iter().map(PointBuffer::as_slice).collect::<Vec<_>>();
            GeoShapeRecord::polygon(outer.as_slice(), &inner_slices)
        }
    }
}

/// Decodes a geographic boundary record.
pub fn geo_from_wire(record: &GeoShapeRecord) -> Result<GeoShape> {
    match record.view()? {
        RecordView::Single(bytes) => Ok(GeoShape::Point(
            bytemuck::pod_read_unaligned::<GeoPointRecord>(bytes).into(),
        )),
        RecordView::Linestring(points) => {
            Ok(GeoShape::Linestring(GeoLinestring::new(points.to_points()?)))
        }
        RecordView::Polygon { outer, inner } => {
            let inner = inner
                .iter()
                .map(|ring| ring.to_points().map(GeoLinestring::new))
                .collect::<Result<Vec<_>>>()?;
            Ok(GeoShape::Polygon(GeoPolygon::new(
                GeoLinestring::new(outer.to_points()?),
                inner,
            )))
        }
    }
}

fn encode_ring(ring: &Linestring, element: &str) -> Result<CellBuffer> {
    let mut buffer = CellBuffer::with_capacity(ring.len());
    for (i, cell) in ring.cells().iter().enumerate() {
        let encoded = cell
            .encode()
            .map_err(|e| Error::encoding_overflow(format!("{element}[{i}]"), e))?;
        buffer.push(&encoded);
    }
    Ok(buffer)
}
