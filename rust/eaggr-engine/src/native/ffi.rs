//! C declarations of the `eaggr` engine library.

#![allow(non_snake_case)]

use libc::{c_char, c_int, c_ushort, c_void};

use eaggr_format::{MAX_CELL_LEN, wire::GeoPointRecord};

pub type DggsHandle = *mut c_void;

/// `DGGS_Cell`: a NUL-terminated cell id in a fixed-width field.
pub type DggsCell = [c_char; MAX_CELL_LEN];

pub const DGGS_SUCCESS: c_int = 0;

/// `DGGS_LatLongPoint` has the layout of [`GeoPointRecord`].
pub type LatLongPoint = GeoPointRecord;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct LatLongLinestring {
    pub points: *mut LatLongPoint,
    pub count: c_ushort,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct LatLongPolygon {
    pub outer: LatLongLinestring,
    pub inner: *mut LatLongLinestring,
    pub inner_count: c_ushort,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union LatLongShapeData {
    pub point: LatLongPoint,
    pub linestring: LatLongLinestring,
    pub polygon: LatLongPolygon,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct LatLongShape {
    pub kind: c_int,
    pub data: LatLongShapeData,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Linestring {
    pub cells: *mut DggsCell,
    pub count: c_ushort,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Polygon {
    pub outer: Linestring,
    pub inner: *mut Linestring,
    pub inner_count: c_ushort,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union ShapeData {
    pub cell: DggsCell,
    pub linestring: Linestring,
    pub polygon: Polygon,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Shape {
    pub kind: c_int,
    pub data: ShapeData,
    pub location: c_int,
}

#[link(name = "eaggr")]
unsafe extern "C" {
    pub fn EAGGR_GetVersion(version: *mut c_char) -> c_int;
    pub fn EAGGR_GetLastErrorMessage(
        handle: DggsHandle,
        message: *mut *mut c_char,
        length: *mut c_ushort,
    ) -> c_int;
    pub fn EAGGR_OpenDggsHandle(model: c_int, handle: *mut DggsHandle) -> c_int;
    pub fn EAGGR_CloseDggsHandle(handle: *mut DggsHandle) -> c_int;
    pub fn EAGGR_ConvertPointsToDggsCells(
        handle: DggsHandle,
        points: *const LatLongPoint,
        count: c_ushort,
        cells: *mut DggsCell,
    ) -> c_int;
    pub fn EAGGR_ConvertShapesToDggsShapes(
        handle: DggsHandle,
        shapes: *const LatLongShape,
        count: c_ushort,
        out: *mut *mut Shape,
    ) -> c_int;
    pub fn EAGGR_ConvertShapeStringToDggsShapes(
        handle: DggsHandle,
        text: *const c_char,
        format: c_int,
        accuracy: f64,
        out: *mut *mut Shape,
        count: *mut c_ushort,
    ) -> c_int;
    pub fn EAGGR_DeallocateDggsShapes(
        handle: DggsHandle,
        shapes: *mut *mut Shape,
        count: c_ushort,
    ) -> c_int;
    pub fn EAGGR_DeallocateString(handle: DggsHandle, text: *mut *mut c_char) -> c_int;
    pub fn EAGGR_ConvertDggsCellsToPoints(
        handle: DggsHandle,
        cells: *const DggsCell,
        count: c_ushort,
        points: *mut LatLongPoint,
    ) -> c_int;
    pub fn EAGGR_ConvertDggsCellsToShapeString(
        handle: DggsHandle,
        cells: *const DggsCell,
        count: c_ushort,
        format: c_int,
        out: *mut *mut c_char,
    ) -> c_int;
    pub fn EAGGR_ConvertDggsCellOutlineToShapeString(
        handle: DggsHandle,
        cell: *const c_char,
        format: c_int,
        out: *mut *mut c_char,
    ) -> c_int;
    pub fn EAGGR_GetDggsCellParents(
        handle: DggsHandle,
        cell: *const c_char,
        parents: *mut DggsCell,
        count: *mut c_ushort,
    ) -> c_int;
    pub fn EAGGR_GetDggsCellChildren(
        handle: DggsHandle,
        cell: *const c_char,
        children: *mut DggsCell,
        count: *mut c_ushort,
    ) -> c_int;
    pub fn EAGGR_GetDggsCellSiblings(
        handle: DggsHandle,
        cell: *const c_char,
        siblings: *mut DggsCell,
        count: *mut c_ushort,
    ) -> c_int;
    pub fn EAGGR_GetBoundingDggsCell(
        handle: DggsHandle,
        cells: *const DggsCell,
        count: c_ushort,
        bounding: *mut DggsCell,
    ) -> c_int;
    pub fn EAGGR_CompareShapes(
        handle: DggsHandle,
        analysis: c_int,
        base: *const Shape,
        compared: *const Shape,
        result: *mut bool,
    ) -> c_int;
}
