//! Two-phase hardware event interface.
//!
//! The runtime services a hardware interrupt in two steps. First the fast
//! path runs in interrupt context and decides whether the deferred handler
//! should run. Then the slow path runs later, outside interrupt context, and
//! does the real work.
//!
//! ```text
//! IRQ ──▶ on_signal(&self)  ──▶ Continuation::RunDeferred
//!                                      │
//!                                      ▼
//!         on_complete(&mut self)  (read, convert, report)
//! ```
//!
//! The fast path takes `&self` so it can be called from an interrupt while
//! the owner holds no exclusive borrow; implementations keep whatever it
//! records in atomics.

/// Peripheral that raised a hardware event.
///
/// The callback surface is shared by every peripheral on the device; only
/// [`DeviceId::Analogue`] is relevant to the monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// Analog subsystem (conversion complete).
    Analogue,
    /// Any other peripheral, identified by the runtime's raw device number.
    Other(u32),
}

impl DeviceId {
    /// Returns true for the analog subsystem.
    #[inline]
    pub const fn is_analogue(&self) -> bool {
        matches!(self, DeviceId::Analogue)
    }
}

/// Decision returned by the fast path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuation {
    /// Let the runtime invoke the deferred handler.
    RunDeferred,
    /// The event was fully handled in interrupt context.
    Suppress,
}

impl Continuation {
    /// Returns true if the deferred handler should run.
    #[inline]
    pub const fn runs_deferred(&self) -> bool {
        matches!(self, Continuation::RunDeferred)
    }
}

/// Hardware event handler split into interrupt and deferred phases.
///
/// # Implementation Notes
///
/// - `on_signal` must not block, allocate, log, or touch hardware
/// - `on_complete` is not reentrant with itself; the runtime serializes it
/// - Both receive the raw item bitmap for the device; the monitor ignores it
pub trait HwEventHandler {
    /// Output of the deferred phase.
    type Output;

    /// Fast path, interrupt context.
    fn on_signal(&self, device: DeviceId, bitmap: u32) -> Continuation;

    /// Slow path, deferred context.
    fn on_complete(&mut self, device: DeviceId, bitmap: u32) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_analogue() {
        assert!(DeviceId::Analogue.is_analogue());
        assert!(!DeviceId::Other(3).is_analogue());
    }

    #[test]
    fn continuation_runs_deferred() {
        assert!(Continuation::RunDeferred.runs_deferred());
        assert!(!Continuation::Suppress.runs_deferred());
    }
}
