//! Trait definitions for hardware abstraction and the event/report seams.
//!
//! This module defines the core abstractions that allow supply-monitor to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Be driven by any runtime that delivers ticks and interrupt callbacks
//! - Report over any line-oriented transport
//!
//! # Submodules
//!
//! - `hardware`: Analog rail and converter control
//! - `event`: Two-phase (interrupt/deferred) hardware event handling
//! - `report`: Report sink for the serial transport

pub mod event;
pub mod hardware;
pub mod report;

pub use event::*;
pub use hardware::*;
pub use report::*;
