//! UART report sink.

use crate::traits::ReportSink;
use esp_idf_hal::uart::UartDriver;
use log::debug;

/// Report sink writing lines to an ESP-IDF UART driver.
///
/// Writes go into the driver's TX ring buffer; a failed write is counted and
/// otherwise dropped.
pub struct UartSink<'d> {
    uart: UartDriver<'d>,
    dropped: u32,
}

impl<'d> UartSink<'d> {
    /// Wraps an initialized UART driver.
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart, dropped: 0 }
    }

    /// Lines the driver refused.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl ReportSink for UartSink<'_> {
    fn write_line(&mut self, line: &str) {
        if let Err(e) = self.uart.write(line.as_bytes()) {
            self.dropped = self.dropped.wrapping_add(1);
            debug!("UART write failed: {}", e);
        }
    }
}
