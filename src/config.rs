//! Monitor configuration.
//!
//! Everything here is fixed at build time; the defaults reproduce the
//! firmware as it has always run: 1 s period, rail enabled with four
//! accumulated samples at 500 kHz on the internal reference, single-shot
//! conversions of the supply sensor on the 0-2.4 V range, and a 115200 baud
//! UART.
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::config::{AcquisitionConfig, MonitorConfig, OverlapPolicy, RailWait};
//!
//! // Use defaults
//! let config = MonitorConfig::default();
//! assert_eq!(config.scale().full_scale_mv, 3600);
//!
//! // Or customize
//! let config = MonitorConfig::default().with_acquisition(
//!     AcquisitionConfig::default()
//!         .with_rail_wait(RailWait::Polls(10_000))
//!         .with_overlap(OverlapPolicy::Rearm),
//! );
//! ```

use crate::convert::{AdcScale, Divider};
use crate::traits::{AdcSource, ConversionRequest, InputRange, RailParams};

// ============================================================================
// Main Config
// ============================================================================

/// Complete monitor configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitorConfig {
    /// Parameters sent with the rail enable request
    pub rail: RailParams,
    /// Converter setup for each conversion
    pub conversion: ConversionConfig,
    /// Tick handling and rail wait policy
    pub acquisition: AcquisitionConfig,
    /// Serial transport settings
    pub serial: SerialConfig,
}

impl MonitorConfig {
    /// Set rail parameters
    pub fn with_rail(mut self, rail: RailParams) -> Self {
        self.rail = rail;
        self
    }

    /// Set conversion configuration
    pub fn with_conversion(mut self, conversion: ConversionConfig) -> Self {
        self.conversion = conversion;
        self
    }

    /// Set acquisition configuration
    pub fn with_acquisition(mut self, acquisition: AcquisitionConfig) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Set serial configuration
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Raw code to millivolt scale implied by the conversion settings.
    pub fn scale(&self) -> AdcScale {
        self.conversion.scale()
    }
}

// ============================================================================
// Conversion Config
// ============================================================================

/// Converter configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversionConfig {
    /// Input range
    pub range: InputRange,
    /// Input source
    pub source: AdcSource,
    /// Divider between the measured node and the converter input
    pub divider: Divider,
    /// Converter resolution ceiling
    pub max_code: u16,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            range: InputRange::Range2,
            source: AdcSource::SupplyVoltage,
            divider: Divider::SUPPLY,
            max_code: AdcScale::MAX_CODE_10BIT,
        }
    }
}

impl ConversionConfig {
    /// Set input range
    pub fn with_range(mut self, range: InputRange) -> Self {
        self.range = range;
        self
    }

    /// Set divider ratio
    pub fn with_divider(mut self, divider: Divider) -> Self {
        self.divider = divider;
        self
    }

    /// Set converter resolution ceiling (e.g. 4095 for 12-bit)
    pub fn with_max_code(mut self, max_code: u16) -> Self {
        self.max_code = max_code;
        self
    }

    /// Request issued to the converter each period
    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::single_shot(self.range, self.source)
    }

    /// Raw code to millivolt scale
    pub fn scale(&self) -> AdcScale {
        AdcScale::from_range(self.range, self.divider, self.max_code)
    }
}

// ============================================================================
// Acquisition Config
// ============================================================================

/// Default rail poll budget before giving up on the regulator.
pub const DEFAULT_RAIL_POLL_LIMIT: u32 = 100_000;

/// How long to wait for the analog rail after an enable request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RailWait {
    /// Spin until the rail reports enabled, however long it takes.
    Unbounded,
    /// Give up after this many status polls.
    Polls(u32),
}

impl Default for RailWait {
    fn default() -> Self {
        RailWait::Polls(DEFAULT_RAIL_POLL_LIMIT)
    }
}

/// Consecutive overlapping ticks before a stalled conversion is re-armed.
pub const DEFAULT_OVERLAP_LIMIT: u32 = 5;

/// What to do with a tick that arrives while a conversion is still armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlapPolicy {
    /// Log and drop the tick; the outstanding conversion stays armed.
    ///
    /// If the completion interrupt is lost the monitor stays armed and
    /// silent until the runtime intervenes.
    Ignore,
    /// Re-arm anyway, discarding any completion already latched.
    Rearm,
    /// Drop overlapping ticks, but re-arm on the n-th consecutive one.
    RearmAfter(u32),
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        OverlapPolicy::RearmAfter(DEFAULT_OVERLAP_LIMIT)
    }
}

/// Acquisition loop configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionConfig {
    /// Tick period in milliseconds (used by the runtime driving `tick()`)
    pub period_ms: u32,
    /// Rail stability wait policy
    pub rail_wait: RailWait,
    /// Overlapping tick policy
    pub overlap: OverlapPolicy,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            rail_wait: RailWait::default(),
            overlap: OverlapPolicy::default(),
        }
    }
}

impl AcquisitionConfig {
    /// Set tick period
    pub fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Set rail wait policy
    pub fn with_rail_wait(mut self, rail_wait: RailWait) -> Self {
        self.rail_wait = rail_wait;
        self
    }

    /// Set overlap policy
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Serial transport configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

impl SerialConfig {
    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}
