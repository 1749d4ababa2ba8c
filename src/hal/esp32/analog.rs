//! Supply sense via the ESP32 one-shot ADC.
//!
//! The ESP32-C3 has no separately switched analog regulator and no
//! conversion-complete interrupt in one-shot mode, so this driver maps the
//! [`AnalogFrontEnd`] contract onto what the chip offers:
//!
//! - the "rail" is the ADC1 unit, which is powered once the driver exists;
//!   enabling it only records the request
//! - the channel is created on first configuration (the pin is consumed)
//! - `start_conversion` performs the blocking one-shot read and latches the
//!   result as a pending completion for the firmware loop to dispatch
//!
//! # Wiring
//!
//! - Supply → 2:3 divider → GPIO1 (ADC1 channel 1)
//!
//! The one-shot driver returns 12-bit codes; configure `max_code = 4095`.

use crate::traits::{AdcSource, AnalogFrontEnd, ConversionRequest, InputRange, RailParams};
use esp_idf_hal::adc::attenuation::{DB_11, DB_6};
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::Gpio1;
use esp_idf_hal::sys::EspError;
use log::{debug, info};

/// Error type for ESP32 analog operations.
#[derive(Debug)]
pub enum Esp32AnalogError {
    /// ESP-IDF driver error.
    Esp(EspError),
    /// Conversion started before the channel was configured.
    NotConfigured,
    /// Only the supply sense pin is wired.
    UnsupportedSource(AdcSource),
    /// Attenuation is fixed once the channel exists.
    RangeChanged,
    /// Read with no completed conversion.
    NoPendingSample,
}

impl core::fmt::Display for Esp32AnalogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Esp(e) => write!(f, "ADC driver error: {}", e),
            Self::NotConfigured => write!(f, "ADC channel not configured"),
            Self::UnsupportedSource(src) => write!(f, "ADC source {:?} not wired", src),
            Self::RangeChanged => write!(f, "ADC range cannot change after setup"),
            Self::NoPendingSample => write!(f, "no completed conversion to read"),
        }
    }
}

impl std::error::Error for Esp32AnalogError {}

impl From<EspError> for Esp32AnalogError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

/// One-shot ADC front end for the supply sense pin.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::adc::oneshot::AdcDriver;
/// use supply_monitor::hal::esp32::Esp32Analog;
///
/// let peripherals = Peripherals::take()?;
/// let adc1 = AdcDriver::new(peripherals.adc1)?;
/// let mut analog = Esp32Analog::new(&adc1, peripherals.pins.gpio1);
///
/// // After monitor.tick():
/// if analog.take_completion() {
///     // dispatch on_signal / on_complete
/// }
/// ```
pub struct Esp32Analog<'d> {
    adc: &'d AdcDriver<'d, ADC1>,
    /// Sense pin, moved into the channel on first configuration
    pin: Option<Gpio1>,
    channel: Option<AdcChannelDriver<'d, Gpio1, &'d AdcDriver<'d, ADC1>>>,
    range: Option<InputRange>,
    rail_enabled: bool,
    pending: Option<u16>,
    completion: bool,
}

impl<'d> Esp32Analog<'d> {
    /// Creates the front end.
    ///
    /// # Arguments
    ///
    /// * `adc` - Reference to ADC1 driver (must outlive this struct)
    /// * `sense_pin` - GPIO1, fed from the supply divider
    pub fn new(adc: &'d AdcDriver<'d, ADC1>, sense_pin: Gpio1) -> Self {
        Self {
            adc,
            pin: Some(sense_pin),
            channel: None,
            range: None,
            rail_enabled: false,
            pending: None,
            completion: false,
        }
    }

    /// Returns true once per completed conversion.
    ///
    /// Stands in for the completion interrupt: the firmware loop polls this
    /// after each tick and dispatches the fast and slow paths.
    pub fn take_completion(&mut self) -> bool {
        core::mem::take(&mut self.completion)
    }

    fn attenuation(range: InputRange) -> esp_idf_hal::sys::adc_atten_t {
        match range {
            // ~1.3 V full scale
            InputRange::Range1 => DB_6,
            // ~2.5 V full scale
            InputRange::Range2 => DB_11,
        }
    }
}

impl AnalogFrontEnd for Esp32Analog<'_> {
    type Error = Esp32AnalogError;

    fn enable_analog_rail(&mut self, params: RailParams) -> Result<(), Self::Error> {
        // Sample accumulation and clock are fixed by the one-shot driver.
        debug!(
            "ADC1 enable requested ({} samples, {} kHz, {:?} reference)",
            params.samples.count(),
            params.clock.khz(),
            params.reference
        );
        self.rail_enabled = true;
        Ok(())
    }

    fn is_rail_enabled(&mut self) -> Result<bool, Self::Error> {
        Ok(self.rail_enabled)
    }

    fn configure_adc(&mut self, request: ConversionRequest) -> Result<(), Self::Error> {
        if request.source != AdcSource::SupplyVoltage {
            return Err(Esp32AnalogError::UnsupportedSource(request.source));
        }

        match self.range {
            Some(range) if range == request.range => Ok(()),
            Some(_) => Err(Esp32AnalogError::RangeChanged),
            None => {
                let pin = self.pin.take().ok_or(Esp32AnalogError::NotConfigured)?;
                let config = AdcChannelConfig {
                    attenuation: Self::attenuation(request.range),
                    ..Default::default()
                };
                self.channel = Some(AdcChannelDriver::new(self.adc, pin, &config)?);
                self.range = Some(request.range);
                info!("supply sense channel ready ({:?})", request.range);
                Ok(())
            }
        }
    }

    fn start_conversion(&mut self) -> Result<(), Self::Error> {
        let channel = self
            .channel
            .as_mut()
            .ok_or(Esp32AnalogError::NotConfigured)?;
        self.pending = Some(channel.read()?);
        self.completion = true;
        Ok(())
    }

    fn read_raw_sample(&mut self) -> Result<u16, Self::Error> {
        self.pending.take().ok_or(Esp32AnalogError::NoPendingSample)
    }
}
