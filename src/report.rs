//! Report line formatting.
//!
//! Each completed conversion produces exactly one line on the serial
//! transport:
//!
//! ```text
//! My Voltage = 3312[mV]
//! ```
//!
//! Lines are built in a fixed-capacity [`heapless::String`] so the slow path
//! never allocates.
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::report::format_report;
//!
//! assert_eq!(format_report(1801).as_str(), "My Voltage = 1801[mV]\n");
//! ```

use core::fmt::Write;

use heapless::String as HString;

use crate::convert::VoltageReading;
use crate::traits::ReportSink;

/// Text preceding the value.
pub const REPORT_LABEL: &str = "My Voltage = ";

/// Unit suffix following the value.
pub const REPORT_UNIT: &str = "[mV]";

/// Line terminator.
pub const LINE_END: &str = "\n";

/// Capacity of one report line. Label, ten digits, unit and terminator fit.
pub const LINE_CAPACITY: usize = 32;

/// One formatted report line
pub type ReportLine = HString<LINE_CAPACITY>;

/// Format a millivolt value as a report line.
pub fn format_report(millivolts: u32) -> ReportLine {
    let mut line = ReportLine::new();
    // Cannot overflow: the longest u32 yields 28 bytes.
    let _ = write!(line, "{}{}{}{}", REPORT_LABEL, millivolts, REPORT_UNIT, LINE_END);
    line
}

/// Formats readings and hands them to a [`ReportSink`].
#[derive(Debug, Default)]
pub struct Reporter<S: ReportSink> {
    sink: S,
    lines_sent: u32,
    last: Option<VoltageReading>,
}

impl<S: ReportSink> Reporter<S> {
    /// Create a reporter writing to `sink`
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            lines_sent: 0,
            last: None,
        }
    }

    /// Format and send one reading
    pub fn report(&mut self, reading: VoltageReading) {
        let line = format_report(reading.millivolts);
        self.sink.write_line(line.as_str());
        self.lines_sent = self.lines_sent.wrapping_add(1);
        self.last = Some(reading);
    }

    /// Number of lines handed to the sink
    pub fn lines_sent(&self) -> u32 {
        self.lines_sent
    }

    /// Most recent reading reported
    pub fn last_reading(&self) -> Option<VoltageReading> {
        self.last
    }

    /// Shared access to the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Exclusive access to the sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
