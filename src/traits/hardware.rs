//! Hardware abstraction traits for the analog front end.
//!
//! This module defines the interface the acquisition state machine drives.
//! The analog subsystem is modelled the way the silicon exposes it: a power
//! rail that must be requested and then observed as enabled, followed by a
//! converter that is configured and started once per sample.
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`AnalogFrontEnd`] | Rail control, converter setup, conversion start and readout |
//! | [`RailParams`] | Parameters passed with a rail enable request |
//! | [`ConversionRequest`] | One single-shot conversion (range + source) |
//!
//! # Implementation
//!
//! For testing and desktop development, use [`crate::hal::MockAnalog`].
//! For ESP32 hardware, use `hal::esp32::Esp32Analog` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::traits::{AnalogFrontEnd, ConversionRequest, RailParams};
//! use supply_monitor::hal::MockAnalog;
//!
//! let mut analog = MockAnalog::new().with_samples(&[512]);
//! analog.enable_analog_rail(RailParams::default()).unwrap();
//! while !analog.is_rail_enabled().unwrap() {}
//!
//! analog.configure_adc(ConversionRequest::supply_voltage()).unwrap();
//! analog.start_conversion().unwrap();
//! assert_eq!(analog.read_raw_sample().unwrap(), 512);
//! ```

/// Number of samples the converter accumulates per conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleCount {
    /// Two samples.
    Two,
    /// Four samples.
    #[default]
    Four,
    /// Six samples.
    Six,
    /// Eight samples.
    Eight,
}

impl SampleCount {
    /// Returns the number of accumulated samples.
    #[inline]
    pub const fn count(&self) -> u8 {
        match self {
            SampleCount::Two => 2,
            SampleCount::Four => 4,
            SampleCount::Six => 6,
            SampleCount::Eight => 8,
        }
    }
}

/// Converter clock divider, expressed as the resulting clock frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockDivider {
    /// 250 kHz converter clock.
    Khz250,
    /// 500 kHz converter clock.
    #[default]
    Khz500,
    /// 1 MHz converter clock.
    Mhz1,
    /// 2 MHz converter clock.
    Mhz2,
}

impl ClockDivider {
    /// Returns the converter clock in kHz.
    #[inline]
    pub const fn khz(&self) -> u32 {
        match self {
            ClockDivider::Khz250 => 250,
            ClockDivider::Khz500 => 500,
            ClockDivider::Mhz1 => 1_000,
            ClockDivider::Mhz2 => 2_000,
        }
    }
}

/// Voltage reference used by the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reference {
    /// On-chip bandgap reference.
    #[default]
    Internal,
    /// Reference supplied on the external VREF pin.
    External,
}

/// Parameters issued with a rail enable request.
///
/// The defaults are the values the monitor has always used: interrupt
/// notification on, four accumulated samples, 500 kHz clock, internal
/// reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RailParams {
    /// Raise an interrupt when a conversion completes.
    pub interrupt: bool,
    /// Samples accumulated per conversion.
    pub samples: SampleCount,
    /// Converter clock.
    pub clock: ClockDivider,
    /// Voltage reference.
    pub reference: Reference,
}

impl Default for RailParams {
    fn default() -> Self {
        Self {
            interrupt: true,
            samples: SampleCount::Four,
            clock: ClockDivider::Khz500,
            reference: Reference::Internal,
        }
    }
}

/// Converter input range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputRange {
    /// 0 to 1.2 V (1x reference).
    Range1,
    /// 0 to 2.4 V (2x reference).
    #[default]
    Range2,
}

impl InputRange {
    /// Full-scale input voltage of this range in millivolts.
    #[inline]
    pub const fn full_scale_mv(&self) -> u32 {
        match self {
            InputRange::Range1 => 1_200,
            InputRange::Range2 => 2_400,
        }
    }
}

/// Converter input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdcSource {
    /// External analog input 1.
    Adc1,
    /// External analog input 2.
    Adc2,
    /// External analog input 3.
    Adc3,
    /// External analog input 4.
    Adc4,
    /// On-chip temperature sensor.
    Temperature,
    /// Internal supply-voltage sensor (behind an on-chip divider).
    #[default]
    SupplyVoltage,
}

/// Conversion mode. Only single-shot conversions are issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConversionMode {
    /// One sample per start command.
    #[default]
    SingleShot,
}

/// A single conversion request, created and consumed once per period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Conversion mode.
    pub mode: ConversionMode,
    /// Input range.
    pub range: InputRange,
    /// Input source.
    pub source: AdcSource,
}

impl ConversionRequest {
    /// Single-shot request for the given range and source.
    #[inline]
    pub const fn single_shot(range: InputRange, source: AdcSource) -> Self {
        Self {
            mode: ConversionMode::SingleShot,
            range,
            source,
        }
    }

    /// Single-shot request for the supply-voltage sensor on the 0-2.4 V range.
    #[inline]
    pub const fn supply_voltage() -> Self {
        Self::single_shot(InputRange::Range2, AdcSource::SupplyVoltage)
    }
}

/// Analog front end trait - abstracts the analog rail and the converter.
///
/// All calls are synchronous. The rail must be reported enabled before a
/// conversion is started; the acquisition state machine enforces this, so
/// implementations do not need to.
///
/// # Implementation Notes
///
/// - `enable_analog_rail` only requests power-up; readiness is observed via
///   `is_rail_enabled`
/// - `read_raw_sample` is only called after the completion interrupt for a
///   started conversion, and at most once per conversion
/// - Samples are bounded by the converter resolution
///
/// # Example Implementation
///
/// ```rust,ignore
/// use supply_monitor::traits::{AnalogFrontEnd, ConversionRequest, RailParams};
///
/// struct MyAdc { /* register block */ }
///
/// impl AnalogFrontEnd for MyAdc {
///     type Error = ();
///
///     fn enable_analog_rail(&mut self, params: RailParams) -> Result<(), ()> {
///         // Write AP control register...
///         Ok(())
///     }
///
///     fn is_rail_enabled(&mut self) -> Result<bool, ()> {
///         // Read AP status register...
///         Ok(true)
///     }
///
///     fn configure_adc(&mut self, request: ConversionRequest) -> Result<(), ()> {
///         Ok(())
///     }
///
///     fn start_conversion(&mut self) -> Result<(), ()> {
///         Ok(())
///     }
///
///     fn read_raw_sample(&mut self) -> Result<u16, ()> {
///         Ok(0)
///     }
/// }
/// ```
pub trait AnalogFrontEnd {
    /// Error type for analog operations.
    type Error;

    /// Request the analog power rail with the given parameters.
    fn enable_analog_rail(&mut self, params: RailParams) -> Result<(), Self::Error>;

    /// Returns true once the rail is powered and stable.
    fn is_rail_enabled(&mut self) -> Result<bool, Self::Error>;

    /// Configure the converter for the next conversion.
    fn configure_adc(&mut self, request: ConversionRequest) -> Result<(), Self::Error>;

    /// Start the configured conversion. Completion is signalled by interrupt.
    fn start_conversion(&mut self) -> Result<(), Self::Error>;

    /// Read the result of the completed conversion.
    fn read_raw_sample(&mut self) -> Result<u16, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rail_params_default_matches_firmware_constants() {
        let params = RailParams::default();
        assert!(params.interrupt);
        assert_eq!(params.samples.count(), 4);
        assert_eq!(params.clock.khz(), 500);
        assert_eq!(params.reference, Reference::Internal);
    }

    #[test]
    fn sample_counts() {
        assert_eq!(SampleCount::Two.count(), 2);
        assert_eq!(SampleCount::Six.count(), 6);
        assert_eq!(SampleCount::Eight.count(), 8);
    }

    #[test]
    fn clock_dividers() {
        assert_eq!(ClockDivider::Khz250.khz(), 250);
        assert_eq!(ClockDivider::Mhz1.khz(), 1_000);
        assert_eq!(ClockDivider::Mhz2.khz(), 2_000);
    }

    #[test]
    fn input_range_full_scale() {
        assert_eq!(InputRange::Range1.full_scale_mv(), 1_200);
        assert_eq!(InputRange::Range2.full_scale_mv(), 2_400);
        assert_eq!(InputRange::default(), InputRange::Range2);
    }

    #[test]
    fn supply_voltage_request() {
        let req = ConversionRequest::supply_voltage();
        assert_eq!(req.mode, ConversionMode::SingleShot);
        assert_eq!(req.range, InputRange::Range2);
        assert_eq!(req.source, AdcSource::SupplyVoltage);
    }
}
