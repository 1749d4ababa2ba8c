//! Interrupt/deferred dispatch and the top-level monitor.
//!
//! This module provides [`VoltageMonitor`], which ties the acquisition
//! machine, the unit conversion and the reporter to the runtime's three
//! entry points:
//!
//! | Entry point | Context | Work |
//! |-------------|---------|------|
//! | [`tick`](VoltageMonitor::tick) | periodic timer event | power rail, arm conversion |
//! | [`on_signal`](HwEventHandler::on_signal) | interrupt | latch completion, request deferred run |
//! | [`on_complete`](HwEventHandler::on_complete) | deferred | read, convert, report |
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::{DeviceId, HwEventHandler, VoltageMonitor};
//! use supply_monitor::hal::{MockAnalog, MockSink};
//!
//! let analog = MockAnalog::new().with_samples(&[512]);
//! let mut monitor = VoltageMonitor::new(analog, MockSink::new());
//!
//! monitor.tick().unwrap();
//!
//! // Runtime: interrupt fires, then the deferred handler runs
//! let next = monitor.on_signal(DeviceId::Analogue, 0);
//! assert!(next.runs_deferred());
//! let reading = monitor.on_complete(DeviceId::Analogue, 0).unwrap();
//!
//! assert_eq!(reading.map(|r| r.millivolts), Some(1801));
//! assert_eq!(monitor.sink().output(), "My Voltage = 1801[mV]\n");
//! ```

use log::trace;

use crate::acquisition::{
    AcquisitionError, AcquisitionMachine, AcquisitionState, AcquisitionStats, RailState,
    TickOutcome,
};
use crate::config::MonitorConfig;
use crate::convert::{AdcScale, VoltageReading};
use crate::report::Reporter;
use crate::traits::{AnalogFrontEnd, Continuation, DeviceId, HwEventHandler, ReportSink};

/// Supply-voltage monitor.
///
/// Owns the analog front end (through the acquisition machine) and the report
/// sink. Not thread-safe beyond the fast path: `on_signal` takes `&self` and
/// only touches an atomic, everything else needs `&mut self`.
///
/// # Type Parameters
///
/// - `A`: The analog front end ([`AnalogFrontEnd`] trait)
/// - `S`: The report sink ([`ReportSink`] trait)
pub struct VoltageMonitor<A: AnalogFrontEnd, S: ReportSink> {
    machine: AcquisitionMachine<A>,
    reporter: Reporter<S>,
    scale: AdcScale,
}

impl<A: AnalogFrontEnd, S: ReportSink> VoltageMonitor<A, S> {
    /// Create a monitor with the default configuration
    pub fn new(analog: A, sink: S) -> Self {
        Self::with_config(analog, sink, &MonitorConfig::default())
    }

    /// Create a monitor from a configuration
    pub fn with_config(analog: A, sink: S, config: &MonitorConfig) -> Self {
        Self {
            machine: AcquisitionMachine::with_config(analog, config),
            reporter: Reporter::new(sink),
            scale: config.scale(),
        }
    }

    /// Periodic trigger. Call once per period.
    pub fn tick(&mut self) -> Result<TickOutcome, AcquisitionError<A::Error>> {
        self.machine.on_tick()
    }

    /// Get the current status for diagnostics
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            state: self.machine.state(),
            rail: self.machine.rail_state(),
            stats: self.machine.stats(),
            lines_sent: self.reporter.lines_sent(),
            last_reading: self.reporter.last_reading(),
        }
    }

    /// Scale used to convert raw codes
    pub fn scale(&self) -> AdcScale {
        self.scale
    }

    /// Shared access to the acquisition machine
    pub fn machine(&self) -> &AcquisitionMachine<A> {
        &self.machine
    }

    /// Shared access to the analog front end
    pub fn analog(&self) -> &A {
        self.machine.analog()
    }

    /// Exclusive access to the analog front end
    pub fn analog_mut(&mut self) -> &mut A {
        self.machine.analog_mut()
    }

    /// Shared access to the report sink
    pub fn sink(&self) -> &S {
        self.reporter.sink()
    }

    /// Exclusive access to the report sink
    pub fn sink_mut(&mut self) -> &mut S {
        self.reporter.sink_mut()
    }
}

impl<A: AnalogFrontEnd, S: ReportSink> HwEventHandler for VoltageMonitor<A, S> {
    type Output = Result<Option<VoltageReading>, AcquisitionError<A::Error>>;

    /// Never suppresses the deferred handler. Latches the completion for the
    /// analog device only; no hardware access, no logging.
    fn on_signal(&self, device: DeviceId, _bitmap: u32) -> Continuation {
        if device.is_analogue() {
            self.machine.latch_completion();
        }
        Continuation::RunDeferred
    }

    /// Reads, converts and reports the pending sample for the analog device.
    /// Other devices are ignored. Returns the reading if one was reported.
    fn on_complete(&mut self, device: DeviceId, bitmap: u32) -> Self::Output {
        if !device.is_analogue() {
            trace!("ignoring event from {:?} (bitmap {:#x})", device, bitmap);
            return Ok(None);
        }

        let Some(raw) = self.machine.take_sample()? else {
            return Ok(None);
        };

        let reading = self.scale.reading(raw);
        self.reporter.report(reading);
        Ok(Some(reading))
    }
}

/// Status snapshot for diagnostics.
///
/// # Example
///
/// ```rust
/// use supply_monitor::VoltageMonitor;
/// use supply_monitor::acquisition::{AcquisitionState, RailState};
/// use supply_monitor::hal::{MockAnalog, MockSink};
///
/// let monitor = VoltageMonitor::new(MockAnalog::new(), MockSink::new());
///
/// let status = monitor.status();
/// assert_eq!(status.state, AcquisitionState::Idle);
/// assert_eq!(status.rail, RailState::Disabled);
/// assert!(status.last_reading.is_none());
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorStatus {
    /// Position in the acquisition cycle.
    pub state: AcquisitionState,
    /// Last observed rail state.
    pub rail: RailState,
    /// Acquisition counters.
    pub stats: AcquisitionStats,
    /// Report lines handed to the sink.
    pub lines_sent: u32,
    /// Most recent reported reading.
    pub last_reading: Option<VoltageReading>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockAnalog, MockSink};

    fn monitor(samples: &[u16]) -> VoltageMonitor<MockAnalog, MockSink> {
        VoltageMonitor::new(MockAnalog::new().with_samples(samples), MockSink::new())
    }

    #[test]
    fn fast_path_always_runs_deferred() {
        let monitor = monitor(&[]);
        assert_eq!(
            monitor.on_signal(DeviceId::Analogue, 0),
            Continuation::RunDeferred
        );
        assert_eq!(
            monitor.on_signal(DeviceId::Other(4), 0x10),
            Continuation::RunDeferred
        );
    }

    #[test]
    fn fast_path_does_not_touch_hardware() {
        let mut monitor = monitor(&[512]);
        monitor.tick().unwrap();

        monitor.on_signal(DeviceId::Analogue, 0);

        assert_eq!(monitor.analog().read_calls, 0);
        assert!(monitor.sink().lines.is_empty());
        assert!(monitor.machine().completion_pending());
    }

    #[test]
    fn other_device_on_fast_path_does_not_latch() {
        let mut monitor = monitor(&[512]);
        monitor.tick().unwrap();

        monitor.on_signal(DeviceId::Other(2), 1);

        assert!(!monitor.machine().completion_pending());
    }

    #[test]
    fn slow_path_reports_reading() {
        let mut monitor = monitor(&[512]);
        monitor.tick().unwrap();
        monitor.on_signal(DeviceId::Analogue, 0);

        let reading = monitor.on_complete(DeviceId::Analogue, 0).unwrap();

        assert_eq!(
            reading,
            Some(VoltageReading {
                raw: 512,
                millivolts: 1801
            })
        );
        assert_eq!(monitor.sink().lines, vec!["My Voltage = 1801[mV]\n"]);
        assert_eq!(monitor.status().state, AcquisitionState::Idle);
    }

    #[test]
    fn slow_path_ignores_other_devices() {
        let mut monitor = monitor(&[512]);
        monitor.tick().unwrap();
        monitor.on_signal(DeviceId::Analogue, 0);

        let reading = monitor.on_complete(DeviceId::Other(9), 0).unwrap();

        assert_eq!(reading, None);
        assert!(monitor.sink().lines.is_empty());
        assert_eq!(monitor.analog().read_calls, 0);
        assert_eq!(monitor.status().state, AcquisitionState::Armed);
        assert_eq!(monitor.status().stats.stray_completions, 0);
    }

    #[test]
    fn slow_path_without_fast_path_is_dropped() {
        let mut monitor = monitor(&[512]);
        monitor.tick().unwrap();

        let reading = monitor.on_complete(DeviceId::Analogue, 0).unwrap();

        assert_eq!(reading, None);
        assert_eq!(monitor.analog().read_calls, 0);
        assert_eq!(monitor.status().stats.stray_completions, 1);
    }

    #[test]
    fn status_tracks_last_reading() {
        let mut monitor = monitor(&[1023]);
        monitor.tick().unwrap();
        monitor.on_signal(DeviceId::Analogue, 0);
        monitor.on_complete(DeviceId::Analogue, 0).unwrap();

        let status = monitor.status();
        assert_eq!(status.lines_sent, 1);
        assert_eq!(status.last_reading.map(|r| r.millivolts), Some(3600));
        assert_eq!(status.rail, RailState::Stable);
        assert_eq!(status.stats.samples, 1);
    }

    #[test]
    fn read_error_propagates_and_ends_cycle() {
        let analog = MockAnalog::new().fail_read();
        let mut monitor = VoltageMonitor::new(analog, MockSink::new());
        monitor.tick().unwrap();
        monitor.on_signal(DeviceId::Analogue, 0);

        let err = monitor.on_complete(DeviceId::Analogue, 0).unwrap_err();

        assert_eq!(err, AcquisitionError::Hardware(()));
        assert!(monitor.sink().lines.is_empty());
        assert_eq!(monitor.status().state, AcquisitionState::Idle);
    }
}
