//! Engine sessions.

use eaggr_common::{
    Result, StatusCode,
    error::{Error, ErrorKind},
    verify_arg, verify_data,
};
use eaggr_format::{
    CellId, GeoPoint, GeoShape, Predicate, Shape, ShapeStringFormat, Topology,
    wire::{self, CellBuffer, PointBuffer},
};

use crate::{
    MAX_CHILD_CELLS, MAX_PARENT_CELLS, MAX_SIBLING_CELLS,
    allocation::BoundaryAllocation,
    boundary::{EngineBoundary, RawResult, RawStatus},
};

/// Message reported when the engine's last error could not be fetched.
pub const LAST_ERROR_UNAVAILABLE: &str = "<engine error message unavailable>";

enum SessionState<H> {
    Open(H),
    Closed,
}

/// An open engine handle bound to one grid topology.
///
/// A session is opened with [`open`](Self::open) and must be ended with
/// [`close`](Self::close), the only place its handle is released. Every
/// operation on a closed session fails with `SessionClosed` without
/// reaching the engine. Dropping a session that is still open closes it and
/// logs a warning.
///
/// Sessions are not shared between threads; independent sessions may be
/// used in parallel.
#[must_use = "an engine session holds an engine handle and must be closed"]
pub struct EngineSession<B: EngineBoundary> {
    boundary: B,
    topology: Topology,
    state: SessionState<B::Handle>,
}

impl<B: EngineBoundary> EngineSession<B> {
    /// Opens a new engine handle for `topology`.
    pub fn open(boundary: B, topology: Topology) -> Result<EngineSession<B>> {
        match boundary.open_handle(topology) {
            Ok(handle) => {
                log::debug!("opened {topology} engine handle {handle:?}");
                Ok(EngineSession {
                    boundary,
                    topology,
                    state: SessionState::Open(handle),
                })
            }
            Err(status) => {
                let code = StatusCode::try_from(status.0)?;
                log::debug!("failed to open {topology} engine handle: {code}");
                Err(ErrorKind::EngineOpenFailed { code }.into())
            }
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    pub fn boundary(&self) -> &B {
        &self.boundary
    }

    /// Releases the engine handle.
    ///
    /// The session is closed afterwards even if the engine reports a failure.
    /// Closing an already closed session fails with `SessionClosed`.
    pub fn close(&mut self) -> Result<()> {
        let handle = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Open(handle) => handle,
            SessionState::Closed => return Err(Error::session_closed("close")),
        };
        match self.boundary.close_handle(handle) {
            Ok(()) => {
                log::debug!("closed {} engine handle {handle:?}", self.topology);
                Ok(())
            }
            Err(status) => {
                let code = StatusCode::try_from(status.0)?;
                log::debug!("closing engine handle {handle:?} failed: {code}");
                Err(ErrorKind::EngineCloseFailed { code }.into())
            }
        }
    }

    /// Returns the engine version string.
    pub fn version(&self) -> Result<String> {
        self.handle("get version")?;
        self.boundary.version().map_err(|status| {
            match StatusCode::try_from(status.0) {
                Ok(code) => Error::engine_operation(
                    "get version",
                    code,
                    "the engine keeps no error message for version queries",
                ),
                Err(e) => e,
            }
        })
    }

    /// Returns the last error message recorded on the handle, empty if none.
    pub fn last_error(&self) -> Result<String> {
        let handle = self.handle("get last error")?;
        self.fetch_last_error(handle)
    }

    /// Projects one point to the cell containing it at the point's accuracy.
    pub fn project_point(&self, point: &GeoPoint) -> Result<CellId> {
        self.project_points(std::slice::from_ref(point))?
            .pop()
            .ok_or_else(|| Error::invalid_format("cells", "engine returned no cell for the point"))
    }

    /// Projects each point to a cell, in order.
    pub fn project_points(&self, points: &[GeoPoint]) -> Result<Vec<CellId>> {
        const OP: &str = "convert points to cells";
        let handle = self.handle(OP)?;
        if points.is_empty() {
            return Ok(Vec::new());
        }
        check_batch("points", points.len())?;
        let records = PointBuffer::from_points(points);
        let cells = self.check(handle, OP, self.boundary.points_to_cells(handle, &records))?;
        verify_data!(cells, cells.len() == points.len());
        cells.to_cells()
    }

    /// Converts geographic shapes to cell shapes, one output per input, in order.
    pub fn project_shapes(&self, shapes: &[GeoShape]) -> Result<Vec<Shape>> {
        const OP: &str = "convert shapes to cell shapes";
        let handle = self.handle(OP)?;
        if shapes.is_empty() {
            return Ok(Vec::new());
        }
        check_batch("shapes", shapes.len())?;
        let records = shapes
            .iter()
            .map(wire::geo_to_wire)
            .collect::<Result<Vec<_>>>()?;
        let buffer = self.check(
            handle,
            OP,
            self.boundary.shapes_to_cell_shapes(handle, &records),
        )?;
        let converted = self.take_shapes(handle, buffer)?;
        verify_data!(converted, converted.len() == shapes.len());
        Ok(converted)
    }

    /// Parses a WKT or GeoJSON string and converts every shape in it to cells.
    pub fn project_shape_string(
        &self,
        text: &str,
        format: ShapeStringFormat,
        accuracy: f64,
    ) -> Result<Vec<Shape>> {
        const OP: &str = "convert shape string to cell shapes";
        let handle = self.handle(OP)?;
        let buffer = self.check(
            handle,
            OP,
            self.boundary
                .shape_string_to_cell_shapes(handle, text, format, accuracy),
        )?;
        self.take_shapes(handle, buffer)
    }

    /// Returns the centre point of each cell, in order. The accuracy of each
    /// point is the cell area.
    pub fn unproject_cells(&self, cells: &[CellId]) -> Result<Vec<GeoPoint>> {
        const OP: &str = "convert cells to points";
        let handle = self.handle(OP)?;
        if cells.is_empty() {
            return Ok(Vec::new());
        }
        check_batch("cells", cells.len())?;
        let buffer = CellBuffer::from_cells(cells)?;
        let points = self.check(handle, OP, self.boundary.cells_to_points(handle, &buffer))?;
        verify_data!(points, points.len() == cells.len());
        points.to_points()
    }

    /// Describes the centre points of `cells` as one shape string.
    pub fn cells_to_shape_string(
        &self,
        cells: &[CellId],
        format: ShapeStringFormat,
    ) -> Result<String> {
        const OP: &str = "convert cells to shape string";
        let handle = self.handle(OP)?;
        verify_arg!(cells, !cells.is_empty());
        check_batch("cells", cells.len())?;
        let buffer = CellBuffer::from_cells(cells)?;
        let text = self.check(
            handle,
            OP,
            self.boundary.cells_to_shape_string(handle, &buffer, format),
        )?;
        self.take_string(handle, text)
    }

    /// Describes the outline of `cell` as a polygon shape string.
    pub fn cell_outline_to_shape_string(
        &self,
        cell: &CellId,
        format: ShapeStringFormat,
    ) -> Result<String> {
        const OP: &str = "convert cell outline to shape string";
        let handle = self.handle(OP)?;
        let encoded = cell.encode()?;
        let text = self.check(
            handle,
            OP,
            self.boundary
                .cell_outline_to_shape_string(handle, &encoded, format),
        )?;
        self.take_string(handle, text)
    }

    pub fn parents(&self, cell: &CellId) -> Result<Vec<CellId>> {
        self.related_cells("get cell parents", cell, MAX_PARENT_CELLS, B::cell_parents)
    }

    pub fn children(&self, cell: &CellId) -> Result<Vec<CellId>> {
        self.related_cells("get cell children", cell, MAX_CHILD_CELLS, B::cell_children)
    }

    pub fn siblings(&self, cell: &CellId) -> Result<Vec<CellId>> {
        self.related_cells("get cell siblings", cell, MAX_SIBLING_CELLS, B::cell_siblings)
    }

    /// Returns the smallest cell containing all of `cells`.
    pub fn bounding_cell(&self, cells: &[CellId]) -> Result<CellId> {
        const OP: &str = "get bounding cell";
        let handle = self.handle(OP)?;
        verify_arg!(cells, !cells.is_empty());
        check_batch("cells", cells.len())?;
        let buffer = CellBuffer::from_cells(cells)?;
        let bounding = self.check(handle, OP, self.boundary.bounding_cell(handle, &buffer))?;
        CellId::decode(&bounding)
    }

    /// Evaluates `predicate` with `base` as the base shape.
    pub fn compare(&self, base: &Shape, compared: &Shape, predicate: Predicate) -> Result<bool> {
        const OP: &str = "compare shapes";
        let handle = self.handle(OP)?;
        let base = wire::to_wire(base)?;
        let compared = wire::to_wire(compared)?;
        self.check(
            handle,
            OP,
            self.boundary
                .compare_shapes(handle, predicate, &base, &compared),
        )
    }

    /// Turns a failed boundary call into an `EngineOperationFailed` error
    /// carrying the engine's last error message.
    pub(crate) fn engine_error(
        &self,
        handle: B::Handle,
        operation: &str,
        status: RawStatus,
    ) -> Error {
        let code = match StatusCode::try_from(status.0) {
            Ok(code) => code,
            Err(e) => {
                log::debug!("engine operation '{operation}' returned an unknown status: {e}");
                return e;
            }
        };
        let message = self.fetch_last_error(handle).unwrap_or_else(|e| {
            log::debug!("failed to fetch the last error after '{operation}': {e}");
            LAST_ERROR_UNAVAILABLE.to_string()
        });
        log::debug!("engine operation '{operation}' failed with {code}: {message}");
        Error::engine_operation(operation, code, message)
    }

    fn handle(&self, operation: &str) -> Result<B::Handle> {
        match self.state {
            SessionState::Open(handle) => Ok(handle),
            SessionState::Closed => Err(Error::session_closed(operation)),
        }
    }

    fn check<T>(&self, handle: B::Handle, operation: &str, result: RawResult<T>) -> Result<T> {
        result.map_err(|status| self.engine_error(handle, operation, status))
    }

    fn fetch_last_error(&self, handle: B::Handle) -> Result<String> {
        let buffer = match self.boundary.last_error_message(handle) {
            Ok(Some(buffer)) => buffer,
            Ok(None) => return Ok(String::new()),
            Err(status) => {
                let code = StatusCode::try_from(status.0)?;
                return Err(Error::engine_operation("get last error", code, ""));
            }
        };
        // Released on drop: a release failure here must not recurse into
        // another last-error fetch.
        let allocation = BoundaryAllocation::new(
            self,
            handle,
            buffer,
            B::deallocate_string,
            "deallocate error message",
        );
        match allocation.get() {
            Some(buffer) => self.boundary.string_contents(buffer),
            None => Ok(String::new()),
        }
    }

    fn take_shapes(&self, handle: B::Handle, buffer: B::ShapeBuffer) -> Result<Vec<Shape>> {
        let allocation = BoundaryAllocation::new(
            self,
            handle,
            buffer,
            B::deallocate_shapes,
            "deallocate shapes",
        );
        let records = match allocation.get() {
            Some(buffer) => self.boundary.shape_records(buffer)?,
            None => Vec::new(),
        };
        allocation.release()?;
        records.iter().map(wire::from_wire).collect()
    }

    fn take_string(&self, handle: B::Handle, buffer: B::StringBuffer) -> Result<String> {
        let allocation = BoundaryAllocation::new(
            self,
            handle,
            buffer,
            B::deallocate_string,
            "deallocate string",
        );
        let text = match allocation.get() {
            Some(buffer) => self.boundary.string_contents(buffer)?,
            None => String::new(),
        };
        allocation.release()?;
        Ok(text)
    }

    fn related_cells(
        &self,
        operation: &'static str,
        cell: &CellId,
        max_cells: usize,
        call: fn(&B, B::Handle, &eaggr_format::EncodedCell) -> RawResult<CellBuffer>,
    ) -> Result<Vec<CellId>> {
        let handle = self.handle(operation)?;
        let encoded = cell.encode()?;
        let cells = self.check(handle, operation, call(&self.boundary, handle, &encoded))?;
        verify_data!(cells, cells.len() <= max_cells);
        cells.to_cells()
    }
}

impl<B: EngineBoundary> Drop for EngineSession<B> {
    fn drop(&mut self) {
        if let SessionState::Open(handle) = std::mem::replace(&mut self.state, SessionState::Closed)
        {
            log::warn!(
                "{} engine session dropped while open; closing handle {handle:?}",
                self.topology
            );
            if let Err(status) = self.boundary.close_handle(handle) {
                log::warn!("closing engine handle {handle:?} failed with raw status {}", status.0);
            }
        }
    }
}

fn check_batch(element: &str, len: usize) -> Result<()> {
    if len > u16::MAX as usize {
        return Err(Error::encoding_overflow(
            element,
            Error::invalid_arg("count", format!("{len} exceeds {}", u16::MAX)),
        ));
    }
    Ok(())
}

impl<B: EngineBoundary> std::fmt::Debug for EngineSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handle = match &self.state {
            SessionState::Open(handle) => Some(handle),
            SessionState::Closed => None,
        };
        f.debug_struct("EngineSession")
            .field("topology", &self.topology)
            .field("handle", &handle)
            .finish()
    }
}
