//! Report sink abstraction for the serial transport.
//!
//! The monitor hands each formatted line to a [`ReportSink`] and never looks
//! back: queueing and transmission belong to the transport.

/// Sink for formatted report lines.
///
/// Implementors push the line into whatever transport they wrap (a UART queue,
/// or a captured vector in tests). The call is fire-and-forget; there
/// is no acknowledgment channel, so implementations swallow their own
/// transport errors.
///
/// # Example
///
/// ```ignore
/// use supply_monitor::traits::ReportSink;
///
/// struct Uart { /* ... */ }
///
/// impl ReportSink for Uart {
///     fn write_line(&mut self, line: &str) {
///         // Queue bytes for transmission...
///     }
/// }
/// ```
pub trait ReportSink {
    /// Queue a complete line (terminator included) for transmission.
    fn write_line(&mut self, line: &str);
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}
