use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ahash::AHashMap;

/// A boundary entry point, as counted by [`EngineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Open,
    Close,
    Version,
    LastError,
    PointsToCells,
    ShapesToCellShapes,
    ShapeStringToCellShapes,
    DeallocateShapes,
    DeallocateString,
    CellsToPoints,
    CellsToShapeString,
    CellOutlineToShapeString,
    Parents,
    Children,
    Siblings,
    BoundingCell,
    CompareShapes,
}

/// Call counters and allocation tracking shared between a [`ScriptedEngine`]
/// and the test observing it.
///
/// [`ScriptedEngine`]: crate::ScriptedEngine
#[derive(Debug, Default)]
pub struct EngineStats {
    calls: Mutex<AHashMap<Call, usize>>,
    allocated: AtomicUsize,
    released: AtomicUsize,
    open_handles: AtomicUsize,
}

impl EngineStats {
    pub(crate) fn record(&self, call: Call) {
        let mut calls = self.calls.lock().unwrap();
        *calls.entry(call).or_default() += 1;
    }

    pub(crate) fn allocate(&self) {
        self.allocated.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn handle_opened(&self) {
        self.open_handles.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn handle_closed(&self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of times `call` crossed the boundary.
    pub fn calls(&self, call: Call) -> usize {
        self.calls.lock().unwrap().get(&call).copied().unwrap_or(0)
    }

    /// Total number of boundary calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Buffers handed out by the engine and not yet deallocated.
    pub fn outstanding_allocations(&self) -> usize {
        self.allocated.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }

    pub fn total_allocations(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}
