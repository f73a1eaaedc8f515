//! Binding of the engine boundary to the `eaggr` C library.
//!
//! Boundary records are translated into the library's structs only for the
//! duration of a call; every pointer handed to the library points into
//! buffers owned by the calling frame. Output allocated by the library stays
//! in [`NativeShapes`] and [`NativeString`] until the session deallocates it.

pub mod ffi;

use std::{ffi::CStr, ptr};

use libc::{c_char, c_int, c_ushort};

use eaggr_common::{Result, StatusCode, error::Error};
use eaggr_format::{
    EncodedCell, MAX_CELL_LEN, Predicate, ShapeLocation, ShapeStringFormat, Topology,
    wire::{
        CellBuffer, FlatSlice, GeoPointRecord, GeoShapeRecord, PointBuffer, RecordView, ShapeKind,
        ShapeRecord,
    },
};

use crate::{
    MAX_CHILD_CELLS, MAX_PARENT_CELLS, MAX_SIBLING_CELLS, VERSION_STRING_LENGTH,
    boundary::{EngineBoundary, RawResult, RawStatus},
};

/// The `eaggr` shared library.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

/// A handle returned by `EAGGR_OpenDggsHandle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeHandle(ffi::DggsHandle);

/// A shape array allocated by the library.
#[derive(Debug)]
pub struct NativeShapes {
    shapes: *mut ffi::Shape,
    count: c_ushort,
}

/// A string allocated by the library.
#[derive(Debug)]
pub struct NativeString {
    text: *mut c_char,
}

/// Records that fail to decode never reach the library; they are refused the
/// way the library refuses a malformed argument.
const INVALID_PARAM: RawStatus = RawStatus(StatusCode::InvalidParam.as_raw());

fn status(code: c_int) -> RawResult<()> {
    if code == ffi::DGGS_SUCCESS {
        Ok(())
    } else {
        Err(RawStatus(code))
    }
}

fn count(len: usize) -> RawResult<c_ushort> {
    c_ushort::try_from(len).map_err(|_| INVALID_PARAM)
}

fn cells_ptr(cells: &CellBuffer) -> *const ffi::DggsCell {
    cells.as_bytes().as_ptr().cast()
}

fn cell_ptr(cell: &EncodedCell) -> *const c_char {
    cell.as_ptr().cast()
}

/// Reads `count` elements the library wrote at `cells`.
///
/// # Safety
///
/// `cells` must point to at least `count` initialised cells, or `count` must be zero.
unsafe fn borrowed_cells<'a>(cells: *const ffi::DggsCell, count: c_ushort) -> Result<FlatSlice<'a>> {
    let bytes: &[u8] = if count == 0 || cells.is_null() {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(cells.cast::<u8>(), count as usize * MAX_CELL_LEN) }
    };
    FlatSlice::new(bytes, MAX_CELL_LEN, count as usize)
}

/// Point storage and C headers for a batch of geographic shape records.
#[derive(Default)]
struct GeoShapeArena {
    rings: Vec<Vec<GeoPointRecord>>,
}

impl GeoShapeArena {
    fn ring(&mut self, slice: FlatSlice<'_>) -> Result<usize> {
        let points = PointBuffer::copy_from(slice)?.records();
        self.rings.push(points);
        Ok(self.rings.len() - 1)
    }

    fn linestring(&self, ring: usize) -> RawResult<ffi::LatLongLinestring> {
        let points = &self.rings[ring];
        Ok(ffi::LatLongLinestring {
            points: points.as_ptr().cast_mut(),
            count: count(points.len())?,
        })
    }
}

enum GeoLayout {
    Point(GeoPointRecord),
    Linestring(usize),
    Polygon { outer: usize, inner: Vec<usize> },
}

fn geo_layout(arena: &mut GeoShapeArena, record: &GeoShapeRecord) -> Result<GeoLayout> {
    Ok(match record.view()? {
        RecordView::Single(bytes) => GeoLayout::Point(bytemuck::pod_read_unaligned(bytes)),
        RecordView::Linestring(points) => GeoLayout::Linestring(arena.ring(points)?),
        RecordView::Polygon { outer, inner } => GeoLayout::Polygon {
            outer: arena.ring(outer)?,
            inner: inner
                .into_iter()
                .map(|ring| arena.ring(ring))
                .collect::<Result<_>>()?,
        },
    })
}

/// C view of one cell shape record; the record must outlive it.
struct CellShapeView {
    shape: ffi::Shape,
    _inner: Vec<ffi::Linestring>,
}

fn cell_linestring(cells: FlatSlice<'_>) -> RawResult<ffi::Linestring> {
    Ok(ffi::Linestring {
        cells: cells.as_bytes().as_ptr().cast_mut().cast(),
        count: count(cells.len())?,
    })
}

fn cell_shape_view(record: &ShapeRecord) -> RawResult<CellShapeView> {
    let view = record.view().map_err(|_| INVALID_PARAM)?;
    let location = record.raw_location() as c_int;
    let (kind, data, inner) = match view {
        RecordView::Single(bytes) => {
            let mut cell: ffi::DggsCell = [0; MAX_CELL_LEN];
            for (dst, &src) in cell.iter_mut().zip(bytes) {
                *dst = src as c_char;
            }
            (ShapeKind::Cell, ffi::ShapeData { cell }, Vec::new())
        }
        RecordView::Linestring(cells) => (
            ShapeKind::Linestring,
            ffi::ShapeData {
                linestring: cell_linestring(cells)?,
            },
            Vec::new(),
        ),
        RecordView::Polygon { outer, inner } => {
            let mut rings = inner
                .into_iter()
                .map(cell_linestring)
                .collect::<RawResult<Vec<_>>>()?;
            let polygon = ffi::Polygon {
                outer: cell_linestring(outer)?,
                inner: rings.as_mut_ptr(),
                inner_count: count(rings.len())?,
            };
            (ShapeKind::Polygon, ffi::ShapeData { polygon }, rings)
        }
    };
    Ok(CellShapeView {
        shape: ffi::Shape {
            kind: kind.as_raw() as c_int,
            data,
            location,
        },
        _inner: inner,
    })
}

/// Copies one library-owned shape into a local record.
///
/// # Safety
///
/// `shape` must be a shape produced by the library whose buffers are still allocated.
unsafe fn copy_shape(shape: &ffi::Shape) -> Result<ShapeRecord> {
    match ShapeKind::try_from(shape.kind as u32)? {
        ShapeKind::Cell => {
            let cell = unsafe { shape.data.cell };
            let bytes: EncodedCell = cell.map(|c| c as u8);
            ShapeRecord::single(&bytes, ShapeLocation::try_from(shape.location as u32)?)
        }
        ShapeKind::Linestring => {
            let linestring = unsafe { shape.data.linestring };
            let cells = unsafe { borrowed_cells(linestring.cells, linestring.count)? };
            ShapeRecord::linestring(cells)
        }
        ShapeKind::Polygon => {
            let polygon = unsafe { shape.data.polygon };
            let outer = unsafe { borrowed_cells(polygon.outer.cells, polygon.outer.count)? };
            let headers: &[ffi::Linestring] = if polygon.inner_count == 0 || polygon.inner.is_null()
            {
                &[]
            } else {
                unsafe { std::slice::from_raw_parts(polygon.inner, polygon.inner_count as usize) }
            };
            let inner = headers
                .iter()
                .map(|ring| unsafe { borrowed_cells(ring.cells, ring.count) })
                .collect::<Result<Vec<_>>>()?;
            ShapeRecord::polygon(outer, &inner)
        }
    }
}

impl NativeEngine {
    fn related_cells(
        &self,
        handle: NativeHandle,
        cell: &EncodedCell,
        max_cells: usize,
        call: unsafe extern "C" fn(
            ffi::DggsHandle,
            *const c_char,
            *mut ffi::DggsCell,
            *mut c_ushort,
        ) -> c_int,
    ) -> RawResult<CellBuffer> {
        let mut cells = CellBuffer::zeroed(max_cells);
        let mut found: c_ushort = 0;
        status(unsafe {
            call(
                handle.0,
                cell_ptr(cell),
                cells.as_mut_bytes().as_mut_ptr().cast(),
                &mut found,
            )
        })?;
        cells.truncate((found as usize).min(max_cells));
        Ok(cells)
    }
}

impl EngineBoundary for NativeEngine {
    type Handle = NativeHandle;
    type ShapeBuffer = NativeShapes;
    type StringBuffer = NativeString;

    fn open_handle(&self, topology: Topology) -> RawResult<NativeHandle> {
        let mut handle: ffi::DggsHandle = ptr::null_mut();
        status(unsafe { ffi::EAGGR_OpenDggsHandle(topology.as_raw() as c_int, &mut handle) })?;
        Ok(NativeHandle(handle))
    }

    fn close_handle(&self, handle: NativeHandle) -> RawResult<()> {
        let mut handle = handle.0;
        status(unsafe { ffi::EAGGR_CloseDggsHandle(&mut handle) })
    }

    fn version(&self) -> RawResult<String> {
        let mut buf: [c_char; VERSION_STRING_LENGTH] = [0; VERSION_STRING_LENGTH];
        status(unsafe { ffi::EAGGR_GetVersion(buf.as_mut_ptr()) })?;
        let bytes = buf
            .iter()
            .map(|&c| c as u8)
            .take_while(|&b| b != 0)
            .collect::<Vec<u8>>();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn last_error_message(&self, handle: NativeHandle) -> RawResult<Option<NativeString>> {
        let mut text: *mut c_char = ptr::null_mut();
        let mut len: c_ushort = 0;
        status(unsafe { ffi::EAGGR_GetLastErrorMessage(handle.0, &mut text, &mut len) })?;
        Ok((!text.is_null()).then_some(NativeString { text }))
    }

    fn points_to_cells(&self, handle: NativeHandle, points: &PointBuffer) -> RawResult<CellBuffer> {
        let records = points.records();
        let mut cells = CellBuffer::zeroed(records.len());
        status(unsafe {
            ffi::EAGGR_ConvertPointsToDggsCells(
                handle.0,
                records.as_ptr(),
                count(records.len())?,
                cells.as_mut_bytes().as_mut_ptr().cast(),
            )
        })?;
        Ok(cells)
    }

    fn shapes_to_cell_shapes(
        &self,
        handle: NativeHandle,
        shapes: &[GeoShapeRecord],
    ) -> RawResult<NativeShapes> {
        let mut arena = GeoShapeArena::default();
        let layouts = shapes
            .iter()
            .map(|record| geo_layout(&mut arena, record))
            .collect::<Result<Vec<_>>>()
            .map_err(|_| INVALID_PARAM)?;

        // Inner ring headers must stay in place while the library reads them.
        let mut inner_headers: Vec<Vec<ffi::LatLongLinestring>> = Vec::new();
        let mut c_shapes = Vec::with_capacity(layouts.len());
        for layout in &layouts {
            let (kind, data) = match layout {
                GeoLayout::Point(point) => (ShapeKind::Cell, ffi::LatLongShapeData { point: *point }),
                GeoLayout::Linestring(ring) => (
                    ShapeKind::Linestring,
                    ffi::LatLongShapeData {
                        linestring: arena.linestring(*ring)?,
                    },
                ),
                GeoLayout::Polygon { outer, inner } => {
                    let mut headers = inner
                        .iter()
                        .map(|&ring| arena.linestring(ring))
                        .collect::<RawResult<Vec<_>>>()?;
                    let polygon = ffi::LatLongPolygon {
                        outer: arena.linestring(*outer)?,
                        inner: headers.as_mut_ptr(),
                        inner_count: count(headers.len())?,
                    };
                    inner_headers.push(headers);
                    (ShapeKind::Polygon, ffi::LatLongShapeData { polygon })
                }
            };
            c_shapes.push(ffi::LatLongShape {
                kind: kind.as_raw() as c_int,
                data,
            });
        }

        let shape_count = count(c_shapes.len())?;
        let mut out: *mut ffi::Shape = ptr::null_mut();
        status(unsafe {
            ffi::EAGGR_ConvertShapesToDggsShapes(handle.0, c_shapes.as_ptr(), shape_count, &mut out)
        })?;
        Ok(NativeShapes {
            shapes: out,
            count: shape_count,
        })
    }

    fn shape_string_to_cell_shapes(
        &self,
        handle: NativeHandle,
        text: &str,
        format: ShapeStringFormat,
        accuracy: f64,
    ) -> RawResult<NativeShapes> {
        let text = std::ffi::CString::new(text).map_err(|_| INVALID_PARAM)?;
        let mut out: *mut ffi::Shape = ptr::null_mut();
        let mut shape_count: c_ushort = 0;
        status(unsafe {
            ffi::EAGGR_ConvertShapeStringToDggsShapes(
                handle.0,
                text.as_ptr(),
                format.as_raw() as c_int,
                accuracy,
                &mut out,
                &mut shape_count,
            )
        })?;
        Ok(NativeShapes {
            shapes: out,
            count: shape_count,
        })
    }

    fn shape_records(&self, buffer: &NativeShapes) -> Result<Vec<ShapeRecord>> {
        if buffer.count == 0 {
            return Ok(Vec::new());
        }
        if buffer.shapes.is_null() {
            return Err(Error::invalid_format("engine shapes", "null shape array"));
        }
        let shapes = unsafe { std::slice::from_raw_parts(buffer.shapes, buffer.count as usize) };
        shapes
            .iter()
            .map(|shape| unsafe { copy_shape(shape) })
            .collect()
    }

    fn deallocate_shapes(&self, handle: NativeHandle, buffer: NativeShapes) -> RawResult<()> {
        let mut shapes = buffer.shapes;
        status(unsafe { ffi::EAGGR_DeallocateDggsShapes(handle.0, &mut shapes, buffer.count) })
    }

    fn string_contents(&self, buffer: &NativeString) -> Result<String> {
        if buffer.text.is_null() {
            return Ok(String::new());
        }
        let text = unsafe { CStr::from_ptr(buffer.text) };
        text.to_str()
            .map(str::to_owned)
            .map_err(|e| Error::invalid_format("engine string", e.to_string()))
    }

    fn deallocate_string(&self, handle: NativeHandle, buffer: NativeString) -> RawResult<()> {
        let mut text = buffer.text;
        status(unsafe { ffi::EAGGR_DeallocateString(handle.0, &mut text) })
    }

    fn cells_to_points(&self, handle: NativeHandle, cells: &CellBuffer) -> RawResult<PointBuffer> {
        let mut points = vec![GeoPointRecord::default(); cells.len()];
        status(unsafe {
            ffi::EAGGR_ConvertDggsCellsToPoints(
                handle.0,
                cells_ptr(cells),
                count(cells.len())?,
                points.as_mut_ptr(),
            )
        })?;
        Ok(points.into_iter().collect())
    }

    fn cells_to_shape_string(
        &self,
        handle: NativeHandle,
        cells: &CellBuffer,
        format: ShapeStringFormat,
    ) -> RawResult<NativeString> {
        let mut text: *mut c_char = ptr::null_mut();
        status(unsafe {
            ffi::EAGGR_ConvertDggsCellsToShapeString(
                handle.0,
                cells_ptr(cells),
                count(cells.len())?,
                format.as_raw() as c_int,
                &mut text,
            )
        })?;
        Ok(NativeString { text })
    }

    fn cell_outline_to_shape_string(
        &self,
        handle: NativeHandle,
        cell: &EncodedCell,
        format: ShapeStringFormat,
    ) -> RawResult<NativeString> {
        let mut text: *mut c_char = ptr::null_mut();
        status(unsafe {
            ffi::EAGGR_ConvertDggsCellOutlineToShapeString(
                handle.0,
                cell_ptr(cell),
                format.as_raw() as c_int,
                &mut text,
            )
        })?;
        Ok(NativeString { text })
    }

    fn cell_parents(&self, handle: NativeHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related_cells(handle, cell, MAX_PARENT_CELLS, ffi::EAGGR_GetDggsCellParents)
    }

    fn cell_children(&self, handle: NativeHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related_cells(handle, cell, MAX_CHILD_CELLS, ffi::EAGGR_GetDggsCellChildren)
    }

    fn cell_siblings(&self, handle: NativeHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related_cells(handle, cell, MAX_SIBLING_CELLS, ffi::EAGGR_GetDggsCellSiblings)
    }

    fn bounding_cell(&self, handle: NativeHandle, cells: &CellBuffer) -> RawResult<EncodedCell> {
        let mut bounding: ffi::DggsCell = [0; MAX_CELL_LEN];
        status(unsafe {
            ffi::EAGGR_GetBoundingDggsCell(
                handle.0,
                cells_ptr(cells),
                count(cells.len())?,
                &mut bounding,
            )
        })?;
        Ok(bounding.map(|c| c as u8))
    }

    fn compare_shapes(
        &self,
        handle: NativeHandle,
        predicate: Predicate,
        base: &ShapeRecord,
        compared: &ShapeRecord,
    ) -> RawResult<bool> {
        let base = cell_shape_view(base)?;
        let compared = cell_shape_view(compared)?;
        let mut result = false;
        status(unsafe {
            ffi::EAGGR_CompareShapes(
                handle.0,
                predicate.as_raw() as c_int,
                &base.shape,
                &compared.shape,
                &mut result,
            )
        })?;
        Ok(result)
    }
}
