//! Scale selection and physical-unit conversion
//!
//! Raw wire samples are integers; the instrument switches its shunt between
//! two current ranges and tells us which one was active via a small selector
//! in each frame. The conversion factors themselves are configuration (they
//! differ between instrument builds), so they live in a [`ScaleTable`] that
//! rides in the engine config rather than as constants at call sites.

use crate::protocol::DecodeError;
use serde::{Deserialize, Serialize};

/// Default current scale for the high range (0.05 Ω shunt), mA per unit
pub const DEFAULT_CURRENT_SCALE_HIGH_RANGE: f64 = 0.05;
/// Default current scale for the low range (1 Ω shunt), mA per unit
pub const DEFAULT_CURRENT_SCALE_LOW_RANGE: f64 = 0.002381;
/// Default voltage scale, V per unit
pub const DEFAULT_VOLTAGE_SCALE: f64 = 0.00125;

/// Which current range a frame's samples were measured in
///
/// Wire encoding: `0` selects the high range, `1` the low range. Selectors
/// outside that set are rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScaleSelector {
    /// High current range, coarse resolution
    #[default]
    HighRange,
    /// Low current range, fine resolution
    LowRange,
}

impl ScaleSelector {
    /// Parse a selector from its wire integer
    pub fn from_wire(raw: i16) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(ScaleSelector::HighRange),
            1 => Ok(ScaleSelector::LowRange),
            other => Err(DecodeError::InvalidScaleSelector(other)),
        }
    }

    /// The selector's wire integer
    pub fn to_wire(self) -> i16 {
        match self {
            ScaleSelector::HighRange => 0,
            ScaleSelector::LowRange => 1,
        }
    }
}

impl std::fmt::Display for ScaleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleSelector::HighRange => write!(f, "high range"),
            ScaleSelector::LowRange => write!(f, "low range"),
        }
    }
}

/// Conversion factors resolved for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    /// mA per raw unit
    pub current: f64,
    /// V per raw unit
    pub voltage: f64,
}

impl Scales {
    /// Convert a raw sample pair into physical units
    pub fn apply(&self, raw_current: i16, raw_voltage: i16) -> (f64, f64) {
        (
            f64::from(raw_current) * self.current,
            f64::from(raw_voltage) * self.voltage,
        )
    }
}

/// The per-mode conversion-factor table
///
/// Voltage scale is a single constant per instrument configuration and not
/// selector-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleTable {
    /// mA per unit when the high range is selected
    pub current_high_range: f64,
    /// mA per unit when the low range is selected
    pub current_low_range: f64,
    /// V per unit, independent of the selector
    pub voltage: f64,
}

impl Default for ScaleTable {
    fn default() -> Self {
        Self {
            current_high_range: DEFAULT_CURRENT_SCALE_HIGH_RANGE,
            current_low_range: DEFAULT_CURRENT_SCALE_LOW_RANGE,
            voltage: DEFAULT_VOLTAGE_SCALE,
        }
    }
}

impl ScaleTable {
    /// Resolve the conversion factors for a selector
    pub fn resolve(&self, selector: ScaleSelector) -> Scales {
        let current = match selector {
            ScaleSelector::HighRange => self.current_high_range,
            ScaleSelector::LowRange => self.current_low_range,
        };
        Scales {
            current,
            voltage: self.voltage,
        }
    }
}
