//! Scoped ownership of engine-allocated buffers.

use eaggr_common::Result;

use crate::{boundary::EngineBoundary, boundary::RawResult, session::EngineSession};

type ReleaseFn<B, T> = fn(&B, <B as EngineBoundary>::Handle, T) -> RawResult<()>;

/// A buffer allocated by the engine on behalf of a session.
///
/// The buffer goes back to the engine through its deallocation call exactly
/// once: explicitly through [`release`](Self::release), which reports a
/// failure, or on drop, which can only log one.
pub struct BoundaryAllocation<'s, B: EngineBoundary, T> {
    session: &'s EngineSession<B>,
    handle: B::Handle,
    buffer: Option<T>,
    release: ReleaseFn<B, T>,
    operation: &'static str,
}

impl<'s, B: EngineBoundary, T> BoundaryAllocation<'s, B, T> {
    pub(crate) fn new(
        session: &'s EngineSession<B>,
        handle: B::Handle,
        buffer: T,
        release: ReleaseFn<B, T>,
        operation: &'static str,
    ) -> Self {
        BoundaryAllocation {
            session,
            handle,
            buffer: Some(buffer),
            release,
            operation,
        }
    }

    /// The engine-owned buffer.
    pub fn get(&self) -> Option<&T> {
        self.buffer.as_ref()
    }

    /// Returns the buffer to the engine.
    pub fn release(mut self) -> Result<()> {
        match self.buffer.take() {
            Some(buffer) => (self.release)(self.session.boundary(), self.handle, buffer)
                .map_err(|status| self.session.engine_error(self.handle, self.operation, status)),
            None => Ok(()),
        }
    }
}

impl<B: EngineBoundary, T> Drop for BoundaryAllocation<'_, B, T> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            if let Err(status) = (self.release)(self.session.boundary(), self.handle, buffer) {
                log::warn!(
                    "{} failed on drop with raw status {}; engine memory may leak",
                    self.operation,
                    status.0
                );
            }
        }
    }
}
