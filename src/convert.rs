//! Raw converter code to millivolt conversion.
//!
//! The supply rail reaches the converter through a 2:3 divider, so on the
//! 0-2.4 V range a full-scale code of 1023 corresponds to 3600 mV at the
//! supply pin.
//!
//! # Example
//!
//! ```rust
//! use supply_monitor::convert::AdcScale;
//!
//! let scale = AdcScale::SUPPLY;
//! assert_eq!(scale.to_millivolts(0), 0);
//! assert_eq!(scale.to_millivolts(512), 1801);
//! assert_eq!(scale.to_millivolts(1023), 3600);
//! ```

use crate::traits::InputRange;

/// Resistor divider between the measured node and the converter input.
///
/// `num / den` is the fraction of the measured voltage seen by the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Divider {
    /// Numerator of the attenuation ratio.
    pub num: u32,
    /// Denominator of the attenuation ratio.
    pub den: u32,
}

impl Divider {
    /// No divider.
    pub const NONE: Self = Self { num: 1, den: 1 };

    /// On-chip supply sensor divider (converter sees 2/3 of the supply).
    pub const SUPPLY: Self = Self { num: 2, den: 3 };

    /// Creates a divider, rejecting a zero numerator or denominator.
    pub const fn new(num: u32, den: u32) -> Option<Self> {
        if num == 0 || den == 0 {
            None
        } else {
            Some(Self { num, den })
        }
    }
}

impl Default for Divider {
    fn default() -> Self {
        Self::SUPPLY
    }
}

/// Affine scale from raw code to millivolts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdcScale {
    /// Millivolts at the measured node for a full-scale code.
    pub full_scale_mv: u32,
    /// Highest code the converter produces.
    pub max_code: u16,
}

impl AdcScale {
    /// 10-bit converter resolution ceiling.
    pub const MAX_CODE_10BIT: u16 = 1023;

    /// Supply sensor on the 0-2.4 V range through the 2:3 divider.
    pub const SUPPLY: Self =
        Self::from_range(InputRange::Range2, Divider::SUPPLY, Self::MAX_CODE_10BIT);

    /// Builds a scale for a converter range seen through a divider.
    ///
    /// The full scale saturates at `u32::MAX` mV, which is also the result
    /// for a zero numerator.
    pub const fn from_range(range: InputRange, divider: Divider, max_code: u16) -> Self {
        let scaled = range.full_scale_mv() as u64 * divider.den as u64;
        let full_scale_mv = match scaled.checked_div(divider.num as u64) {
            Some(mv) if mv <= u32::MAX as u64 => mv as u32,
            _ => u32::MAX,
        };
        Self {
            full_scale_mv,
            max_code,
        }
    }

    /// Converts a raw code to millivolts, truncating.
    ///
    /// Codes above `max_code` are clamped; the hardware never produces them.
    #[inline]
    pub fn to_millivolts(&self, raw: u16) -> u32 {
        if self.max_code == 0 {
            return 0;
        }
        let raw = raw.min(self.max_code) as u64;
        (raw * self.full_scale_mv as u64 / self.max_code as u64) as u32
    }

    /// Converts a raw code into a [`VoltageReading`].
    #[inline]
    pub fn reading(&self, raw: u16) -> VoltageReading {
        VoltageReading {
            raw,
            millivolts: self.to_millivolts(raw),
        }
    }
}

/// One converted sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltageReading {
    /// Raw converter code.
    pub raw: u16,
    /// Voltage at the measured node in millivolts.
    pub millivolts: u32,
}

impl Default for AdcScale {
    fn default() -> Self {
        Self::SUPPLY
    }
}
