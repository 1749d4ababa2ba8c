//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the analog front end and the report
//! sink, enabling development and testing on desktop without a device.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockAnalog`] | [`AnalogFrontEnd`] | Simulated rail power-up, queued samples, call counters |
//! | [`MockSink`] | [`ReportSink`] | Captures report lines |
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::{DeviceId, HwEventHandler, VoltageMonitor};
//! use supply_monitor::hal::{MockAnalog, MockSink};
//!
//! // Rail reports ready on the fourth poll after the enable request
//! let analog = MockAnalog::new().with_ready_after(3).with_samples(&[1023]);
//! let mut monitor = VoltageMonitor::new(analog, MockSink::new());
//!
//! monitor.tick().unwrap();
//! monitor.on_signal(DeviceId::Analogue, 0);
//! monitor.on_complete(DeviceId::Analogue, 0).unwrap();
//!
//! // Verify via the mocks
//! assert_eq!(monitor.analog().enable_calls, 1);
//! assert_eq!(monitor.sink().lines, vec!["My Voltage = 3600[mV]\n"]);
//! ```
//!
//! [`AnalogFrontEnd`]: crate::traits::AnalogFrontEnd
//! [`ReportSink`]: crate::traits::ReportSink

use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::{AnalogFrontEnd, ConversionRequest, RailParams, ReportSink};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock analog front end for testing.
///
/// Simulates a regulator that becomes ready a configurable number of status
/// polls after the enable request, and a converter that returns queued
/// samples in FIFO order. Every call is counted; use the public fields to
/// inspect behaviour after test operations.
///
/// # Example
///
/// ```rust
/// use supply_monitor::hal::MockAnalog;
/// use supply_monitor::traits::{AnalogFrontEnd, RailParams};
///
/// let mut analog = MockAnalog::new().with_ready_after(2);
/// assert!(!analog.is_rail_enabled().unwrap()); // Not requested yet
///
/// analog.enable_analog_rail(RailParams::default()).unwrap();
/// assert!(!analog.is_rail_enabled().unwrap());
/// assert!(!analog.is_rail_enabled().unwrap());
/// assert!(analog.is_rail_enabled().unwrap()); // Ready on the third poll
///
/// assert_eq!(analog.enable_calls, 1);
/// assert_eq!(analog.status_polls, 4);
/// ```
#[derive(Debug, Default)]
pub struct MockAnalog {
    /// Whether the rail is currently powered and stable.
    pub rail_on: bool,
    /// Status polls after an enable request that still report not ready.
    pub ready_after: u32,
    /// Parameters of the most recent enable request.
    pub enabled_with: Option<RailParams>,
    /// Most recent converter configuration.
    pub last_request: Option<ConversionRequest>,
    /// Whether a started conversion has not been read yet.
    pub converting: bool,
    /// Number of times `enable_analog_rail` was called.
    pub enable_calls: usize,
    /// Number of times `is_rail_enabled` was called.
    pub status_polls: usize,
    /// Number of times `configure_adc` was called.
    pub configure_calls: usize,
    /// Number of times `start_conversion` was called.
    pub start_calls: usize,
    /// Number of times `read_raw_sample` was called.
    pub read_calls: usize,
    /// Conversions started while the rail was off (should stay zero).
    pub starts_while_rail_off: usize,
    enable_pending: bool,
    polls_since_enable: u32,
    samples: Vec<u16>,
    fail_enable: bool,
    fail_start: bool,
    fail_read: bool,
}

impl MockAnalog {
    /// Creates a mock whose rail is off and becomes ready on the first poll
    /// after an enable request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rail reports not ready for `polls` status polls after enable.
    pub fn with_ready_after(mut self, polls: u32) -> Self {
        self.ready_after = polls;
        self
    }

    /// Rail already powered (e.g. warm start).
    pub fn with_rail_on(mut self) -> Self {
        self.rail_on = true;
        self
    }

    /// Queue samples returned by successive reads.
    pub fn with_samples(mut self, samples: &[u16]) -> Self {
        self.samples.extend_from_slice(samples);
        self
    }

    /// Make every `enable_analog_rail` fail.
    pub fn fail_enable(mut self) -> Self {
        self.fail_enable = true;
        self
    }

    /// Make every `start_conversion` fail.
    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make every `read_raw_sample` fail.
    pub fn fail_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Queue one more sample
    pub fn queue_sample(&mut self, raw: u16) {
        self.samples.push(raw);
    }

    /// Simulate the regulator dropping out.
    pub fn drop_rail(&mut self) {
        self.rail_on = false;
        self.enable_pending = false;
        self.polls_since_enable = 0;
    }
}

impl AnalogFrontEnd for MockAnalog {
    type Error = ();

    fn enable_analog_rail(&mut self, params: RailParams) -> Result<(), ()> {
        self.enable_calls += 1;
        if self.fail_enable {
            return Err(());
        }
        self.enabled_with = Some(params);
        self.enable_pending = true;
        self.polls_since_enable = 0;
        Ok(())
    }

    fn is_rail_enabled(&mut self) -> Result<bool, ()> {
        self.status_polls += 1;
        if !self.rail_on && self.enable_pending {
            if self.polls_since_enable >= self.ready_after {
                self.rail_on = true;
                self.enable_pending = false;
            } else {
                self.polls_since_enable += 1;
            }
        }
        Ok(self.rail_on)
    }

    fn configure_adc(&mut self, request: ConversionRequest) -> Result<(), ()> {
        self.configure_calls += 1;
        self.last_request = Some(request);
        Ok(())
    }

    fn start_conversion(&mut self) -> Result<(), ()> {
        self.start_calls += 1;
        if !self.rail_on {
            self.starts_while_rail_off += 1;
        }
        if self.fail_start {
            return Err(());
        }
        self.converting = true;
        Ok(())
    }

    fn read_raw_sample(&mut self) -> Result<u16, ()> {
        self.read_calls += 1;
        self.converting = false;
        if self.fail_read {
            return Err(());
        }
        if self.samples.is_empty() {
            Ok(0)
        } else {
            Ok(self.samples.remove(0))
        }
    }
}

// ============================================================================
// Transport Mocks
// ============================================================================

/// Mock report sink for testing.
///
/// Records every line handed to it.
///
/// # Example
///
/// ```rust
/// use supply_monitor::hal::MockSink;
/// use supply_monitor::traits::ReportSink;
///
/// let mut sink = MockSink::new();
/// sink.write_line("My Voltage = 3300[mV]\n");
///
/// assert_eq!(sink.lines.len(), 1);
/// assert_eq!(sink.last(), Some("My Voltage = 3300[mV]\n"));
/// ```
#[derive(Debug, Default)]
pub struct MockSink {
    /// Lines received, in order.
    pub lines: Vec<String>,
}

impl MockSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent line, if any
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Everything written, concatenated as it would appear on the wire
    pub fn output(&self) -> String {
        self.lines.concat()
    }

    /// Forget all captured lines
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl ReportSink for MockSink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.into());
    }
}
