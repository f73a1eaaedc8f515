//! A deterministic, in-process implementation of the engine boundary.

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use eaggr_common::StatusCode;
use eaggr_engine::{EngineBoundary, RawResult, RawStatus};
use eaggr_format::{
    CellId, EncodedCell, GeoPoint, GeoShape, Predicate, Shape, ShapeLocation, ShapeStringFormat,
    Topology,
    shape::{Linestring, Polygon},
    wire::{self, CellBuffer, GeoShapeRecord, PointBuffer, ShapeRecord},
};

use crate::{
    hierarchy,
    stats::{Call, EngineStats},
};

/// Relative tolerance used when matching scripted coordinates and accuracies.
const TOLERANCE: f64 = 1e-9;

/// The message the engine reports when cells span more than one face.
pub const NO_COMMON_PARENT: &str = "Supplied cells do not have a common parent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptedHandle(u64);

/// Shapes handed out by the scripted engine.
#[derive(Debug)]
pub struct ScriptedShapes {
    records: Vec<ShapeRecord>,
}

/// A string handed out by the scripted engine.
#[derive(Debug)]
pub struct ScriptedString {
    text: String,
}

#[derive(Debug, Clone)]
struct Projection {
    topology: Topology,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    cell: CellId,
}

#[derive(Debug, Clone)]
struct Failure {
    raw: i32,
    message: String,
}

#[derive(Debug, Default)]
struct Script {
    projections: Vec<Projection>,
    parents: AHashMap<CellId, Vec<CellId>>,
    children: AHashMap<CellId, Vec<CellId>>,
    siblings: AHashMap<CellId, Vec<CellId>>,
    bounding: AHashMap<Vec<CellId>, CellId>,
    centres: AHashMap<CellId, GeoPoint>,
    outlines: AHashMap<CellId, String>,
    shape_strings: AHashMap<String, Vec<ShapeRecord>>,
    comparisons: AHashMap<(Predicate, Shape, Shape), bool>,
    failures: AHashMap<Call, Failure>,
    version: String,
}

#[derive(Debug, Default)]
struct EngineState {
    next_handle: u64,
    handles: AHashMap<u64, Topology>,
    last_errors: AHashMap<u64, String>,
}

/// An engine double driven by scripted answers.
///
/// Point projection matches scripted points by location and picks the entry
/// with the largest scripted accuracy not above the requested one, so a
/// request coarser than anything scripted keeps returning the coarsest cell,
/// as the real engine does once it reaches a whole face.
#[derive(Debug)]
pub struct ScriptedEngine {
    script: Script,
    state: Mutex<EngineState>,
    stats: Arc<EngineStats>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        ScriptedEngine::new()
    }
}

fn close_to(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn sorted_key(cells: &[CellId]) -> Vec<CellId> {
    let mut key = cells.to_vec();
    key.sort();
    key.dedup();
    key
}

fn ids(cells: &[&str]) -> Vec<CellId> {
    cells.iter().copied().map(CellId::from).collect()
}

fn invalid_param() -> RawStatus {
    RawStatus(StatusCode::InvalidParam.as_raw())
}

impl ScriptedEngine {
    pub fn new() -> ScriptedEngine {
        ScriptedEngine {
            script: Script {
                version: "v2.0".to_string(),
                ..Default::default()
            },
            state: Mutex::new(EngineState::default()),
            stats: Arc::new(EngineStats::default()),
        }
    }

    /// The counters of this engine, to be kept by the test.
    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.script.version = version.to_string();
        self
    }

    /// Projects `point` at exactly its accuracy (or coarser) to `cell`.
    pub fn with_projection(mut self, topology: Topology, point: GeoPoint, cell: &str) -> Self {
        self.script.projections.push(Projection {
            topology,
            latitude: point.latitude,
            longitude: point.longitude,
            accuracy: point.accuracy,
            cell: cell.into(),
        });
        self
    }

    /// Scripts the cells `point` projects to as its accuracy is multiplied by
    /// the topology's aperture, finest first.
    pub fn with_aperture_chain(mut self, topology: Topology, point: GeoPoint, cells: &[&str]) -> Self {
        let mut accuracy = point.accuracy;
        for cell in cells {
            self = self.with_projection(topology, point.with_accuracy(accuracy), cell);
            accuracy *= topology.aperture() as f64;
        }
        self
    }

    pub fn with_parents(mut self, cell: &str, parents: &[&str]) -> Self {
        self.script.parents.insert(cell.into(), ids(parents));
        self
    }

    pub fn with_children(mut self, cell: &str, children: &[&str]) -> Self {
        self.script.children.insert(cell.into(), ids(children));
        self
    }

    pub fn with_siblings(mut self, cell: &str, siblings: &[&str]) -> Self {
        self.script.siblings.insert(cell.into(), ids(siblings));
        self
    }

    /// Scripts the bounding cell of a set of hexagonal cells.
    pub fn with_bounding(mut self, cells: &[&str], bounding: &str) -> Self {
        self.script
            .bounding
            .insert(sorted_key(&ids(cells)), bounding.into());
        self
    }

    pub fn with_centre(mut self, cell: &str, centre: GeoPoint) -> Self {
        self.script.centres.insert(cell.into(), centre);
        self
    }

    pub fn with_outline(mut self, cell: &str, text: &str) -> Self {
        self.script.outlines.insert(cell.into(), text.to_string());
        self
    }

    pub fn with_shape_string(self, text: &str, shapes: &[Shape]) -> Self {
        let records = shapes
            .iter()
            .map(|shape| wire::to_wire(shape).expect("scripted shapes must encode"))
            .collect();
        self.with_shape_string_records(text, records)
    }

    /// Scripts raw records, which need not be valid, for a shape string.
    pub fn with_shape_string_records(mut self, text: &str, records: Vec<ShapeRecord>) -> Self {
        self.script.shape_strings.insert(text.to_string(), records);
        self
    }

    pub fn with_comparison(
        mut self,
        predicate: Predicate,
        base: Shape,
        compared: Shape,
        result: bool,
    ) -> Self {
        self.script
            .comparisons
            .insert((predicate, base, compared), result);
        self
    }

    /// Makes every call of `call` fail with `code`, recording `message` as the
    /// handle's last error.
    pub fn with_failure(self, call: Call, code: StatusCode, message: &str) -> Self {
        self.with_raw_failure(call, code.as_raw(), message)
    }

    /// Like [`with_failure`](Self::with_failure) with an arbitrary raw status.
    pub fn with_raw_failure(mut self, call: Call, raw: i32, message: &str) -> Self {
        self.script.failures.insert(
            call,
            Failure {
                raw,
                message: message.to_string(),
            },
        );
        self
    }

    /// Records `call`, validates `handle` and applies any scripted failure.
    fn enter(&self, call: Call, handle: ScriptedHandle) -> RawResult<Topology> {
        self.stats.record(call);
        let mut state = self.state.lock().unwrap();
        let topology = match state.handles.get(&handle.0) {
            Some(topology) => *topology,
            None => return Err(RawStatus(StatusCode::InvalidHandle.as_raw())),
        };
        if let Some(failure) = self.script.failures.get(&call) {
            state
                .last_errors
                .insert(handle.0, failure.message.clone());
            return Err(RawStatus(failure.raw));
        }
        Ok(topology)
    }

    fn fail(&self, handle: ScriptedHandle, code: StatusCode, message: impl Into<String>) -> RawStatus {
        self.state
            .lock()
            .unwrap()
            .last_errors
            .insert(handle.0, message.into());
        RawStatus(code.as_raw())
    }

    fn project(&self, topology: Topology, point: &GeoPoint) -> Option<CellId> {
        self.script
            .projections
            .iter()
            .filter(|p| {
                p.topology == topology
                    && close_to(p.latitude, point.latitude)
                    && close_to(p.longitude, point.longitude)
                    && p.accuracy <= point.accuracy * (1.0 + TOLERANCE)
            })
            .max_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
            .map(|p| p.cell.clone())
    }

    fn project_or_fail(
        &self,
        handle: ScriptedHandle,
        topology: Topology,
        point: &GeoPoint,
    ) -> RawResult<CellId> {
        self.project(topology, point).ok_or_else(|| {
            self.fail(
                handle,
                StatusCode::ModelError,
                format!(
                    "No {topology} cell for ({}, {}) with accuracy {}",
                    point.latitude, point.longitude, point.accuracy
                ),
            )
        })
    }

    fn project_ring(
        &self,
        handle: ScriptedHandle,
        topology: Topology,
        points: &[GeoPoint],
    ) -> RawResult<Linestring> {
        points
            .iter()
            .map(|point| self.project_or_fail(handle, topology, point))
            .collect::<RawResult<Vec<_>>>()
            .map(Linestring::new)
    }

    fn project_shape(
        &self,
        handle: ScriptedHandle,
        topology: Topology,
        shape: &GeoShape,
    ) -> RawResult<Shape> {
        Ok(match shape {
            GeoShape::Point(point) => Shape::Cell {
                cell: self.project_or_fail(handle, topology, point)?,
                location: ShapeLocation::OneFace,
            },
            GeoShape::Linestring(linestring) => {
                Shape::Linestring(self.project_ring(handle, topology, linestring.points())?)
            }
            GeoShape::Polygon(polygon) => {
                let outer = self.project_ring(handle, topology, polygon.outer_ring().points())?;
                let inner = polygon
                    .inner_rings()
                    .iter()
                    .map(|ring| self.project_ring(handle, topology, ring.points()))
                    .collect::<RawResult<Vec<_>>>()?;
                Shape::Polygon(Polygon::new(outer, inner))
            }
        })
    }

    fn decode_cell(&self, handle: ScriptedHandle, cell: &EncodedCell) -> RawResult<CellId> {
        match CellId::decode(cell) {
            Ok(cell) if !cell.is_empty() => Ok(cell),
            _ => Err(self.fail(handle, StatusCode::InvalidParam, "Invalid cell.")),
        }
    }

    fn decode_cells(&self, handle: ScriptedHandle, cells: &CellBuffer) -> RawResult<Vec<CellId>> {
        cells
            .to_cells()
            .map_err(|e| self.fail(handle, StatusCode::InvalidParam, e.to_string()))
    }

    fn centres(&self, handle: ScriptedHandle, cells: &[CellId]) -> RawResult<Vec<GeoPoint>> {
        cells
            .iter()
            .map(|cell| {
                self.script.centres.get(cell).copied().ok_or_else(|| {
                    self.fail(
                        handle,
                        StatusCode::ModelError,
                        format!("No centre known for cell {cell}."),
                    )
                })
            })
            .collect()
    }

    fn allocate_string(&self, text: String) -> ScriptedString {
        self.stats.allocate();
        ScriptedString { text }
    }

    fn related(
        &self,
        call: Call,
        handle: ScriptedHandle,
        cell: &EncodedCell,
    ) -> RawResult<CellBuffer> {
        let topology = self.enter(call, handle)?;
        let cell = self.decode_cell(handle, cell)?;
        let related = match topology {
            Topology::Isea4t => match call {
                Call::Parents => hierarchy::parent(&cell).into_iter().collect::<Vec<_>>(),
                Call::Children => hierarchy::children(&cell),
                _ => hierarchy::siblings(&cell),
            },
            Topology::Isea3h => {
                let table = match call {
                    Call::Parents => &self.script.parents,
                    Call::Children => &self.script.children,
                    _ => &self.script.siblings,
                };
                table.get(&cell).cloned().ok_or_else(|| {
                    self.fail(
                        handle,
                        StatusCode::ModelError,
                        format!("Unknown cell {cell}."),
                    )
                })?
            }
        };
        CellBuffer::from_cells(&related)
            .map_err(|e| self.fail(handle, StatusCode::CellLengthTooLong, e.to_string()))
    }

    /// Relations between two triangular cells that follow from the hierarchy.
    fn hierarchical_relation(predicate: Predicate, base: &CellId, compared: &CellId) -> bool {
        let contains = hierarchy::is_ancestor_or_self(base, compared);
        let within = hierarchy::is_ancestor_or_self(compared, base);
        match predicate {
            Predicate::Equals => base == compared,
            Predicate::Contains | Predicate::Covers => contains,
            Predicate::Within | Predicate::CoveredBy => within,
            Predicate::Intersects => contains || within,
            Predicate::Disjoint => !(contains || within),
            Predicate::Touches | Predicate::Crosses | Predicate::Overlaps => false,
        }
    }
}

/// Structural equality that ignores the face location tag of cells.
fn same_geometry(a: &Shape, b: &Shape) -> bool {
    match (a, b) {
        (Shape::Cell { cell: a, .. }, Shape::Cell { cell: b, .. }) => a == b,
        _ => a == b,
    }
}

impl EngineBoundary for ScriptedEngine {
    type Handle = ScriptedHandle;
    type ShapeBuffer = ScriptedShapes;
    type StringBuffer = ScriptedString;

    fn open_handle(&self, topology: Topology) -> RawResult<ScriptedHandle> {
        self.stats.record(Call::Open);
        if let Some(failure) = self.script.failures.get(&Call::Open) {
            return Err(RawStatus(failure.raw));
        }
        let mut state = self.state.lock().unwrap();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.handles.insert(handle, topology);
        self.stats.handle_opened();
        Ok(ScriptedHandle(handle))
    }

    fn close_handle(&self, handle: ScriptedHandle) -> RawResult<()> {
        self.enter(Call::Close, handle)?;
        let mut state = self.state.lock().unwrap();
        state.handles.remove(&handle.0);
        state.last_errors.remove(&handle.0);
        self.stats.handle_closed();
        Ok(())
    }

    fn version(&self) -> RawResult<String> {
        self.stats.record(Call::Version);
        match self.script.failures.get(&Call::Version) {
            Some(failure) => Err(RawStatus(failure.raw)),
            None => Ok(self.script.version.clone()),
        }
    }

    fn last_error_message(&self, handle: ScriptedHandle) -> RawResult<Option<ScriptedString>> {
        self.stats.record(Call::LastError);
        let message = {
            let state = self.state.lock().unwrap();
            if !state.handles.contains_key(&handle.0) {
                return Err(RawStatus(StatusCode::InvalidHandle.as_raw()));
            }
            if let Some(failure) = self.script.failures.get(&Call::LastError) {
                return Err(RawStatus(failure.raw));
            }
            state.last_errors.get(&handle.0).cloned()
        };
        Ok(message
            .filter(|message| !message.is_empty())
            .map(|message| self.allocate_string(message)))
    }

    fn points_to_cells(&self, handle: ScriptedHandle, points: &PointBuffer) -> RawResult<CellBuffer> {
        let topology = self.enter(Call::PointsToCells, handle)?;
        let points = points
            .to_points()
            .map_err(|e| self.fail(handle, StatusCode::InvalidParam, e.to_string()))?;
        let cells = points
            .iter()
            .map(|point| self.project_or_fail(handle, topology, point))
            .collect::<RawResult<Vec<_>>>()?;
        CellBuffer::from_cells(&cells)
            .map_err(|e| self.fail(handle, StatusCode::CellLengthTooLong, e.to_string()))
    }

    fn shapes_to_cell_shapes(
        &self,
        handle: ScriptedHandle,
        shapes: &[GeoShapeRecord],
    ) -> RawResult<ScriptedShapes> {
        let topology = self.enter(Call::ShapesToCellShapes, handle)?;
        let mut records = Vec::with_capacity(shapes.len());
        for record in shapes {
            let shape = wire::geo_from_wire(record)
                .map_err(|e| self.fail(handle, StatusCode::InvalidParam, e.to_string()))?;
            let projected = self.project_shape(handle, topology, &shape)?;
            records.push(
                wire::to_wire(&projected)
                    .map_err(|e| self.fail(handle, StatusCode::CellLengthTooLong, e.to_string()))?,
            );
        }
        self.stats.allocate();
        Ok(ScriptedShapes { records })
    }

    fn shape_string_to_cell_shapes(
        &self,
        handle: ScriptedHandle,
        text: &str,
        _format: ShapeStringFormat,
        _accuracy: f64,
    ) -> RawResult<ScriptedShapes> {
        self.enter(Call::ShapeStringToCellShapes, handle)?;
        let records = self.script.shape_strings.get(text).cloned().ok_or_else(|| {
            self.fail(
                handle,
                StatusCode::InvalidParam,
                format!("Unable to parse shape string '{text}'."),
            )
        })?;
        self.stats.allocate();
        Ok(ScriptedShapes { records })
    }

    fn shape_records(&self, buffer: &ScriptedShapes) -> eaggr_common::Result<Vec<ShapeRecord>> {
        Ok(buffer.records.clone())
    }

    fn deallocate_shapes(&self, handle: ScriptedHandle, _buffer: ScriptedShapes) -> RawResult<()> {
        self.enter(Call::DeallocateShapes, handle)?;
        self.stats.release();
        Ok(())
    }

    fn string_contents(&self, buffer: &ScriptedString) -> eaggr_common::Result<String> {
        Ok(buffer.text.clone())
    }

    fn deallocate_string(&self, handle: ScriptedHandle, _buffer: ScriptedString) -> RawResult<()> {
        self.enter(Call::DeallocateString, handle)?;
        self.stats.release();
        Ok(())
    }

    fn cells_to_points(&self, handle: ScriptedHandle, cells: &CellBuffer) -> RawResult<PointBuffer> {
        self.enter(Call::CellsToPoints, handle)?;
        let cells = self.decode_cells(handle, cells)?;
        let centres = self.centres(handle, &cells)?;
        Ok(PointBuffer::from_points(&centres))
    }

    fn cells_to_shape_string(
        &self,
        handle: ScriptedHandle,
        cells: &CellBuffer,
        format: ShapeStringFormat,
    ) -> RawResult<ScriptedString> {
        self.enter(Call::CellsToShapeString, handle)?;
        let cells = self.decode_cells(handle, cells)?;
        let centres = self.centres(handle, &cells)?;
        let text = match format {
            ShapeStringFormat::Wkt => format!(
                "MULTIPOINT ({})",
                centres
                    .iter()
                    .map(|p| format!("({} {})", p.longitude, p.latitude))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ShapeStringFormat::GeoJson => serde_json::json!({
                "type": "MultiPoint",
                "coordinates": centres
                    .iter()
                    .map(|p| [p.longitude, p.latitude])
                    .collect::<Vec<_>>(),
            })
            .to_string(),
        };
        Ok(self.allocate_string(text))
    }

    fn cell_outline_to_shape_string(
        &self,
        handle: ScriptedHandle,
        cell: &EncodedCell,
        _format: ShapeStringFormat,
    ) -> RawResult<ScriptedString> {
        self.enter(Call::CellOutlineToShapeString, handle)?;
        let cell = self.decode_cell(handle, cell)?;
        let text = self.script.outlines.get(&cell).cloned().ok_or_else(|| {
            self.fail(
                handle,
                StatusCode::ModelError,
                format!("No outline known for cell {cell}."),
            )
        })?;
        Ok(self.allocate_string(text))
    }

    fn cell_parents(&self, handle: ScriptedHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related(Call::Parents, handle, cell)
    }

    fn cell_children(&self, handle: ScriptedHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related(Call::Children, handle, cell)
    }

    fn cell_siblings(&self, handle: ScriptedHandle, cell: &EncodedCell) -> RawResult<CellBuffer> {
        self.related(Call::Siblings, handle, cell)
    }

    fn bounding_cell(&self, handle: ScriptedHandle, cells: &CellBuffer) -> RawResult<EncodedCell> {
        let topology = self.enter(Call::BoundingCell, handle)?;
        let cells = self.decode_cells(handle, cells)?;
        let key = sorted_key(&cells);
        let bounding = match topology {
            Topology::Isea4t => hierarchy::bounding(&key),
            Topology::Isea3h if key.len() == 1 => key.first().cloned(),
            Topology::Isea3h => self.script.bounding.get(&key).cloned(),
        };
        let bounding =
            bounding.ok_or_else(|| self.fail(handle, StatusCode::InvalidParam, NO_COMMON_PARENT))?;
        bounding
            .encode()
            .map_err(|e| self.fail(handle, StatusCode::CellLengthTooLong, e.to_string()))
    }

    fn compare_shapes(
        &self,
        handle: ScriptedHandle,
        predicate: Predicate,
        base: &ShapeRecord,
        compared: &ShapeRecord,
    ) -> RawResult<bool> {
        let topology = self.enter(Call::CompareShapes, handle)?;
        let base = wire::from_wire(base)
            .map_err(|e| self.fail(handle, StatusCode::InvalidParam, e.to_string()))?;
        let compared = wire::from_wire(compared)
            .map_err(|e| self.fail(handle, StatusCode::InvalidParam, e.to_string()))?;
        if let Some(result) = self
            .script
            .comparisons
            .get(&(predicate, base.clone(), compared.clone()))
        {
            return Ok(*result);
        }
        match (&base, &compared) {
            _ if predicate == Predicate::Equals => Ok(same_geometry(&base, &compared)),
            (Shape::Cell { cell: a, .. }, Shape::Cell { cell: b, .. })
                if topology == Topology::Isea4t =>
            {
                Ok(Self::hierarchical_relation(predicate, a, b))
            }
            _ => Err(self.fail(
                handle,
                StatusCode::NotImplemented,
                format!("No {predicate:?} comparison scripted."),
            )),
        }
    }
}
