//! Flattened fixed-width element arrays.
//!
//! Every variable-length array that crosses the engine boundary is a single
//! contiguous buffer of `count` elements of one fixed width. Elements are
//! addressed through [`FlatSlice`], which checks every index against the
//! count instead of handing out raw offsets.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use eaggr_common::{Result, error::Error, verify_arg, verify_data};

use crate::{
    cell::{CellId, EncodedCell, MAX_CELL_LEN},
    shape::GeoPoint,
};

/// A fixed-width element kind stored in flattened buffers.
pub trait Element: Clone + Copy + std::fmt::Debug + PartialEq + Default {
    /// Width of one element in bytes.
    const WIDTH: usize;
    /// Name used in error messages.
    const NAME: &'static str;
}

/// A cell id in its fixed-width boundary form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellElement;

impl Element for CellElement {
    const WIDTH: usize = MAX_CELL_LEN;
    const NAME: &'static str = "cell";
}

/// A geographic point as a [`GeoPointRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointElement;

impl Element for PointElement {
    const WIDTH: usize = std::mem::size_of::<GeoPointRecord>();
    const NAME: &'static str = "point";
}

/// Boundary layout of a geographic point: three native-endian doubles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct GeoPointRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl From<GeoPoint> for GeoPointRecord {
    fn from(point: GeoPoint) -> Self {
        GeoPointRecord {
            latitude: point.latitude,
            longitude: point.longitude,
            accuracy: point.accuracy,
        }
    }
}

impl From<GeoPointRecord> for GeoPoint {
    fn from(record: GeoPointRecord) -> Self {
        GeoPoint::new(record.latitude, record.longitude, record.accuracy)
    }
}

/// A borrowed `(base, element_width, count)` view over a flattened array.
#[derive(Debug, Clone, Copy)]
pub struct FlatSlice<'a> {
    base: &'a [u8],
    width: usize,
    count: usize,
}

impl<'a> FlatSlice<'a> {
    /// Creates a view over `count` elements of `width` bytes at the start of `base`.
    ///
    /// Fails if `base` is too short to hold them.
    pub fn new(base: &'a [u8], width: usize, count: usize) -> Result<FlatSlice<'a>> {
        verify_arg!(width, width != 0);
        let required = width
            .checked_mul(count)
            .ok_or_else(|| Error::invalid_format("flat array", "element count overflows"))?;
        verify_data!(base, base.len() >= required);
        Ok(FlatSlice {
            base: &base[..required],
            width,
            count,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The whole flattened buffer, `len() * width()` bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.base
    }

    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.count {
            return Err(Error::invalid_arg(
                "index",
                format!("{index} is out of bounds for {} elements", self.count),
            ));
        }
        let start = index * self.width;
        Ok(&self.base[start..start + self.width])
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a [u8]> + 'a {
        self.base.chunks_exact(self.width)
    }

    /// Decodes every element as a cell id.
    pub fn to_cells(&self) -> Result<Vec<CellId>> {
        verify_data!(width, self.width == MAX_CELL_LEN);
        self.iter().map(CellId::decode).collect()
    }

    /// Decodes every element as a geographic point.
    pub fn to_points(&self) -> Result<Vec<GeoPoint>> {
        verify_data!(width, self.width == PointElement::WIDTH);
        Ok(self
            .iter()
            .map(|bytes| GeoPoint::from(bytemuck::pod_read_unaligned::<GeoPointRecord>(bytes)))
            .collect())
    }
}

/// An owned flattened array of `E` elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatBuffer<E: Element> {
    bytes: Vec<u8>,
    _element: PhantomData<E>,
}

/// Owned flattened array of fixed-width cell ids.
pub type CellBuffer = FlatBuffer<CellElement>;

/// Owned flattened array of [`GeoPointRecord`]s.
pub type PointBuffer = FlatBuffer<PointElement>;

impl<E: Element> FlatBuffer<E> {
    pub fn new() -> FlatBuffer<E> {
        FlatBuffer {
            bytes: Vec::new(),
            _element: PhantomData,
        }
    }

    pub fn with_capacity(count: usize) -> FlatBuffer<E> {
        FlatBuffer {
            bytes: Vec::with_capacity(count * E::WIDTH),
            _element: PhantomData,
        }
    }

    /// A buffer of `count` zeroed elements, to be filled in place.
    pub fn zeroed(count: usize) -> FlatBuffer<E> {
        FlatBuffer {
            bytes: vec![0; count * E::WIDTH],
            _element: PhantomData,
        }
    }

    /// Takes ownership of an already flattened buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<FlatBuffer<E>> {
        verify_data!(bytes, bytes.len() % E::WIDTH == 0);
        Ok(FlatBuffer {
            bytes,
            _element: PhantomData,
        })
    }

    /// Copies a borrowed view into a new buffer.
    pub fn copy_from(slice: FlatSlice<'_>) -> Result<FlatBuffer<E>> {
        verify_arg!(slice, slice.width() == E::WIDTH);
        Ok(FlatBuffer {
            bytes: slice.as_bytes().to_vec(),
            _element: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / E::WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Keeps the first `count` elements.
    pub fn truncate(&mut self, count: usize) {
        self.bytes.truncate(count * E::WIDTH);
    }

    pub fn as_slice(&self) -> FlatSlice<'_> {
        FlatSlice {
            base: &self.bytes,
            width: E::WIDTH,
            count: self.len(),
        }
    }

    pub fn get(&self, index: usize) -> Result<&[u8]> {
        self.as_slice().get(index)
    }
}

impl CellBuffer {
    /// Flattens `cells`, failing with `EncodingOverflow` naming the first id
    /// that does not fit.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a CellId>) -> Result<CellBuffer> {
        let mut buffer = CellBuffer::new();
        for (i, cell) in cells.into_iter().enumerate() {
            let encoded = cell
                .encode()
                .map_err(|e| Error::encoding_overflow(format!("cell[{i}]"), e))?;
            buffer.push(&encoded);
        }
        Ok(buffer)
    }

    pub fn push(&mut self, cell: &EncodedCell) {
        self.bytes.extend_from_slice(cell);
    }

    pub fn cell(&self, index: usize) -> Result<CellId> {
        CellId::decode(self.get(index)?)
    }

    pub fn to_cells(&self) -> Result<Vec<CellId>> {
        self.as_slice().to_cells()
    }

    /// Returns the element at `index` in its fixed-width form.
    pub fn encoded(&self, index: usize) -> Result<EncodedCell> {
        let bytes = self.get(index)?;
        let mut cell = [0u8; MAX_CELL_LEN];
        cell.copy_from_slice(bytes);
        Ok(cell)
    }
}

impl FromIterator<EncodedCell> for CellBuffer {
    fn from_iter<I: IntoIterator<Item = EncodedCell>>(iter: I) -> Self {
        let mut buffer = CellBuffer::new();
        for cell in iter {
            buffer.push(&cell);
        }
        buffer
    }
}

impl PointBuffer {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> PointBuffer {
        points.into_iter().map(|&p| GeoPointRecord::from(p)).collect()
    }

    pub fn push(&mut self, point: GeoPointRecord) {
        self.bytes.extend_from_slice(bytemuck::bytes_of(&point));
    }

    /// Copies the points out into properly aligned records.
    pub fn records(&self) -> Vec<GeoPointRecord> {
        self.bytes
            .chunks_exact(PointElement::WIDTH)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    pub fn record(&self, index: usize) -> Result<GeoPointRecord> {
        Ok(bytemuck::pod_read_unaligned(self.get(index)?))
    }

    pub fn to_points(&self) -> Result<Vec<GeoPoint>> {
        self.as_slice().to_points()
    }
}

impl FromIterator<GeoPointRecord> for PointBuffer {
    fn from_iter<I: IntoIterator<Item = GeoPointRecord>>(iter: I) -> Self {
        let mut buffer = PointBuffer::new();
        for point in iter {
            buffer.push(point);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaggr_common::error::ErrorKind;

    #[test]
    fn test_point_record_layout() {
        assert_eq!(PointElement::WIDTH, 24);
        assert_eq!(std::mem::align_of::<GeoPointRecord>(), 8);
    }

    #[test]
    fn test_slice_bounds_checked() {
        let cells: Vec<CellId> = ["0000", "0001", "0002"].into_iter().map(CellId::from).collect();
        let buffer = CellBuffer::from_cells(&cells).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_bytes().len(), 3 * MAX_CELL_LEN);
        assert_eq!(buffer.cell(1).unwrap().as_str(), "0001");
        let err = buffer.get(3).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert_eq!(buffer.to_cells().unwrap(), cells);
    }

    #[test]
    fn test_slice_over_short_base() {
        let base = vec![0u8; MAX_CELL_LEN * 2 - 1];
        let err = FlatSlice::new(&base, MAX_CELL_LEN, 2).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
        assert_eq!(FlatSlice::new(&base, MAX_CELL_LEN, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_from_cells_reports_offending_index() {
        let cells = vec![CellId::new("07"), CellId::new("1".repeat(60))];
        let err = CellBuffer::from_cells(&cells).unwrap_err();
        match err.kind() {
            ErrorKind::EncodingOverflow { element, .. } => assert_eq!(element, "cell[1]"),
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn test_points_round_trip() {
        let mut rng = fastrand::Rng::with_seed(17);
        let points: Vec<GeoPoint> = (0..32)
            .map(|_| {
                GeoPoint::new(
                    rng.f64() * 180.0 - 90.0,
                    rng.f64() * 360.0 - 180.0,
                    rng.f64() * 1e6,
                )
            })
            .collect();
        let buffer = PointBuffer::from_points(&points);
        assert_eq!(buffer.len(), points.len());
        assert_eq!(buffer.to_points().unwrap(), points);
        assert_eq!(GeoPoint::from(buffer.record(5).unwrap()), points[5]);
    }

    #[test]
    fn test_zeroed_and_truncate() {
        let mut buffer = CellBuffer::zeroed(7);
        assert_eq!(buffer.len(), 7);
        buffer.as_mut_bytes()[..4].copy_from_slice(b"0700");
        buffer.truncate(1);
        assert_eq!(buffer.to_cells().unwrap(), vec![CellId::new("0700")]);
    }

    #[test]
    fn test_from_bytes_requires_whole_elements() {
        assert!(CellBuffer::from_bytes(vec![0; MAX_CELL_LEN + 1]).is_err());
        assert_eq!(CellBuffer::from_bytes(vec![0; MAX_CELL_LEN * 2]).unwrap().len(), 2);
    }
}
