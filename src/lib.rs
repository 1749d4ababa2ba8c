//! # supply-monitor
//!
//! Periodic supply-voltage sampling for small microcontrollers. Once per
//! second the analog rail is brought up (first time only), a single-shot
//! conversion of the supply sensor is armed, and when the converter signals
//! completion the sample is converted to millivolts and reported as a line
//! of text:
//!
//! ```text
//! My Voltage = 3312[mV]
//! ```
//!
//! ## Features
//!
//! - **Explicit acquisition state**: rail and in-flight conversion tracked in
//!   an owned state machine instead of hardware registers
//! - **Two-phase interrupt handling**: a non-blocking fast path that only
//!   latches completion, and a deferred slow path that reads and reports
//! - **Overlap protection**: ticks arriving while a conversion is armed are
//!   dropped, and a conversion whose completion never arrives is re-armed
//!   after a configurable run of dropped ticks
//! - **Bounded rail wait**: the regulator poll gives up with an error instead
//!   of spinning forever
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Analog front end, hardware event and report sink abstractions
//! - `convert` - Raw code to millivolt scaling
//! - `acquisition` - Rail power-up and conversion state machine
//! - `dispatch` - Interrupt/deferred split and the top-level monitor
//! - `report` - Report line formatting
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use supply_monitor::{DeviceId, HwEventHandler, VoltageMonitor};
//! use supply_monitor::hal::{MockAnalog, MockSink};
//!
//! let analog = MockAnalog::new().with_ready_after(10).with_samples(&[512, 920]);
//! let mut monitor = VoltageMonitor::new(analog, MockSink::new());
//!
//! // Once per second
//! for _ in 0..2 {
//!     monitor.tick().unwrap();
//!
//!     // Runtime: completion interrupt, then deferred handler
//!     if monitor.on_signal(DeviceId::Analogue, 0).runs_deferred() {
//!         monitor.on_complete(DeviceId::Analogue, 0).unwrap();
//!     }
//! }
//!
//! assert_eq!(
//!     monitor.sink().output(),
//!     "My Voltage = 1801[mV]\nMy Voltage = 3237[mV]\n"
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Rail power-up and single-shot conversion state machine.
pub mod acquisition;
/// Build-time configuration with firmware defaults.
pub mod config;
/// Raw code to millivolt conversion.
pub mod convert;
/// Interrupt/deferred dispatch and the top-level monitor.
pub mod dispatch;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Report line formatting.
pub mod report;
/// Core traits for hardware abstraction and the event/report seams.
pub mod traits;

// Re-exports for convenience
pub use acquisition::{
    AcquisitionError, AcquisitionMachine, AcquisitionState, AcquisitionStats, RailState,
    TickOutcome,
};
pub use config::{
    AcquisitionConfig, ConversionConfig, MonitorConfig, OverlapPolicy, RailWait, SerialConfig,
};
pub use convert::{AdcScale, Divider, VoltageReading};
pub use dispatch::{MonitorStatus, VoltageMonitor};
pub use report::{format_report, Reporter, ReportLine};
pub use traits::{
    // Hardware
    AdcSource,
    AnalogFrontEnd,
    ClockDivider,
    // Events
    Continuation,
    ConversionMode,
    ConversionRequest,
    DeviceId,
    HwEventHandler,
    InputRange,
    RailParams,
    Reference,
    // Transport
    ReportSink,
    SampleCount,
};
