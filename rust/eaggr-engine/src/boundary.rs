//! The raw engine boundary.

use eaggr_common::Result;
use eaggr_format::{
    EncodedCell, Predicate, ShapeStringFormat, Topology,
    wire::{CellBuffer, GeoShapeRecord, PointBuffer, ShapeRecord},
};

/// A status code exactly as the engine returned it, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStatus(pub i32);

/// Outcome of a boundary call: the output on success, the raw status otherwise.
pub type RawResult<T> = std::result::Result<T, RawStatus>;

/// One-to-one mirror of the engine's entry points.
///
/// Implementations translate boundary records to whatever the engine consumes
/// for the duration of a call and never interpret failures: any non-success
/// status is returned as-is in [`RawStatus`]. Counts are bounded by the engine
/// to `u16`; callers check them before crossing.
///
/// Shape arrays and strings produced by the engine are returned as opaque
/// buffers that stay engine-owned until passed back to
/// [`deallocate_shapes`](Self::deallocate_shapes) or
/// [`deallocate_string`](Self::deallocate_string).
pub trait EngineBoundary {
    /// Opaque engine handle bound to one topology.
    type Handle: Copy + std::fmt::Debug;
    /// An engine-allocated array of cell shapes.
    type ShapeBuffer;
    /// An engine-allocated string.
    type StringBuffer;

    fn open_handle(&self, topology: Topology) -> RawResult<Self::Handle>;

    fn close_handle(&self, handle: Self::Handle) -> RawResult<()>;

    /// Engine version; does not involve a handle.
    fn version(&self) -> RawResult<String>;

    /// Fetches the last error recorded on `handle`, `None` if there is none.
    fn last_error_message(&self, handle: Self::Handle) -> RawResult<Option<Self::StringBuffer>>;

    fn points_to_cells(&self, handle: Self::Handle, points: &PointBuffer) -> RawResult<CellBuffer>;

    fn shapes_to_cell_shapes(
        &self,
        handle: Self::Handle,
        shapes: &[GeoShapeRecord],
    ) -> RawResult<Self::ShapeBuffer>;

    fn shape_string_to_cell_shapes(
        &self,
        handle: Self::Handle,
        text: &str,
        format: ShapeStringFormat,
        accuracy: f64,
    ) -> RawResult<Self::ShapeBuffer>;

    /// Copies an engine-allocated shape array into local records.
    fn shape_records(&self, buffer: &Self::ShapeBuffer) -> Result<Vec<ShapeRecord>>;

    fn deallocate_shapes(&self, handle: Self::Handle, buffer: Self::ShapeBuffer) -> RawResult<()>;

    /// Copies an engine-allocated string into a local one.
    fn string_contents(&self, buffer: &Self::StringBuffer) -> Result<String>;

    fn deallocate_string(&self, handle: Self::Handle, buffer: Self::StringBuffer)
    -> RawResult<()>;

    fn cells_to_points(&self, handle: Self::Handle, cells: &CellBuffer) -> RawResult<PointBuffer>;

    fn cells_to_shape_string(
        &self,
        handle: Self::Handle,
        cells: &CellBuffer,
        format: ShapeStringFormat,
    ) -> RawResult<Self::StringBuffer>;

    fn cell_outline_to_shape_string(
        &self,
        handle: Self::Handle,
        cell: &EncodedCell,
        format: ShapeStringFormat,
    ) -> RawResult<Self::StringBuffer>;

    fn cell_parents(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer>;

    fn cell_children(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer>;

    fn cell_siblings(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer>;

    fn bounding_cell(&self, handle: Self::Handle, cells: &CellBuffer) -> RawResult<EncodedCell>;

    fn compare_shapes(
        &self,
        handle: Self::Handle,
        predicate: Predicate,
        base: &ShapeRecord,
        compared: &ShapeRecord,
    ) -> RawResult<bool>;
}

impl<B: EngineBoundary + ?Sized> EngineBoundary for &B {
    type Handle = B::Handle;
    type ShapeBuffer = B::ShapeBuffer;
    type StringBuffer = B::StringBuffer;

    fn open_handle(&self, topology: Topology) -> RawResult<Self::Handle> {
        (**self).open_handle(topology)
    }

    fn close_handle(&self, handle: Self::Handle) -> RawResult<()> {
        (**self).close_handle(handle)
    }

    fn version(&self) -> RawResult<String> {
        (**self).version()
    }

    fn last_error_message(&self, handle: Self::Handle) -> RawResult<Option<Self::StringBuffer>> {
        (**self).last_error_message(handle)
    }

    fn points_to_cells(&self, handle: Self::Handle, points: &PointBuffer) -> RawResult<CellBuffer> {
        (**self).points_to_cells(handle, points)
    }

    fn shapes_to_cell_shapes(
        &self,
        handle: Self::Handle,
        shapes: &[GeoShapeRecord],
    ) -> RawResult<Self::ShapeBuffer> {
        (**self).shapes_to_cell_shapes(handle, shapes)
    }

    fn shape_string_to_cell_shapes(
        &self,
        handle: Self::Handle,
        text: &str,
        format: ShapeStringFormat,
        accuracy: f64,
    ) -> RawResult<Self::ShapeBuffer> {
        (**self).shape_string_to_cell_shapes(handle, text, format, accuracy)
    }

    fn shape_records(&self, buffer: &Self::ShapeBuffer) -> Result<Vec<ShapeRecord>> {
        (**self).shape_records(buffer)
    }

    fn deallocate_shapes(&self, handle: Self::Handle, buffer: Self::ShapeBuffer) -> RawResult<()> {
        (**self).deallocate_shapes(handle, buffer)
    }

    fn string_contents(&self, buffer: &Self::StringBuffer) -> Result<String> {
        (**self).string_contents(buffer)
    }

    fn deallocate_string(
        &self,
        handle: Self::Handle,
        buffer: Self::StringBuffer,
    ) -> RawResult<()> {
        (**self).deallocate_string(handle, buffer)
    }

    fn cells_to_points(&self, handle: Self::Handle, cells: &CellBuffer) -> RawResult<PointBuffer> {
        (**self).cells_to_points(handle, cells)
    }

    fn cells_to_shape_string(
        &self,
        handle: Self::Handle,
        cells: &CellBuffer,
        format: ShapeStringFormat,
    ) -> RawResult<Self::StringBuffer> {
        (**self).cells_to_shape_string(handle, cells, format)
    }

    fn cell_outline_to_shape_string(
        &self,
        handle: Self::Handle,
        cell: &EncodedCell,
        format: ShapeStringFormat,
    ) -> RawResult<Self::StringBuffer> {
        (**self).cell_outline_to_shape_string(handle, cell, format)
    }

    fn cell_parents(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        (**self).cell_parents(handle, cell)
    }

    fn cell_children(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        (**self).cell_children(handle, cell)
    }

    fn cell_siblings(&self, handle: Self::Handle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        (**self).cell_siblings(handle, cell)
    }

    fn bounding_cell(&self, handle: Self::Handle, cells: &CellBuffer) -> RawResult<EncodedCell> {
        (**self).bounding_cell(handle, cells)
    }

    fn compare_shapes(
        &self,
        handle: Self::Handle,
        predicate: Predicate,
        base: &ShapeRecord,
        compared: &ShapeRecord,
    ) -> RawResult<bool> {
        (**self).compare_shapes(handle, predicate, base, compared)
    }
}
