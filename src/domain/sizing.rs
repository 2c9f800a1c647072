//! Position sizing.
//!
//! Either a fixed fraction of the allocation or a volatility-targeted size.
//! Exactly one variant exists at a time; switching the method discards the
//! old variant and starts the new one from its documented defaults, so
//! stale fields cannot leak into the wire payload.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FIXED_FRACTION: f64 = 1.0;
pub const DEFAULT_VOL_TARGET: f64 = 10.0;
pub const DEFAULT_VOL_BUFFER: f64 = 5.0;
pub const DEFAULT_VOL_LOOKBACK: u32 = 30;
pub const DEFAULT_MAX_LEVERAGE: f64 = 3.0;

/// Leverage reported for fixed sizing, where no leverage control applies.
pub const FIXED_MAX_LEVERAGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    Fixed,
    VolatilityTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PositionSizing {
    Fixed {
        fraction: f64,
    },
    VolatilityTarget {
        target: f64,
        buffer: f64,
        lookback_days: u32,
        max_leverage: f64,
    },
}

impl PositionSizing {
    pub fn fixed_default() -> Self {
        PositionSizing::Fixed {
            fraction: DEFAULT_FIXED_FRACTION,
        }
    }

    pub fn volatility_default() -> Self {
        PositionSizing::VolatilityTarget {
            target: DEFAULT_VOL_TARGET,
            buffer: DEFAULT_VOL_BUFFER,
            lookback_days: DEFAULT_VOL_LOOKBACK,
            max_leverage: DEFAULT_MAX_LEVERAGE,
        }
    }

    pub fn method(&self) -> SizingMethod {
        match self {
            PositionSizing::Fixed { .. } => SizingMethod::Fixed,
            PositionSizing::VolatilityTarget { .. } => SizingMethod::VolatilityTarget,
        }
    }

    /// Switch to `method`. A real switch yields that variant's defaults; a
    /// switch to the current method keeps the active values untouched.
    pub fn switch_method(&self, method: SizingMethod) -> Self {
        if self.method() == method {
            return self.clone();
        }
        match method {
            SizingMethod::Fixed => Self::fixed_default(),
            SizingMethod::VolatilityTarget => Self::volatility_default(),
        }
    }

    /// The leverage cap carried on every wire payload: the variant's own
    /// cap under volatility targeting, 1.0 under fixed sizing.
    pub fn effective_max_leverage(&self) -> f64 {
        match self {
            PositionSizing::Fixed { .. } => FIXED_MAX_LEVERAGE,
            PositionSizing::VolatilityTarget { max_leverage, .. } => *max_leverage,
        }
    }
}

impl Default for PositionSizing {
    fn default() -> Self {
        Self::fixed_default()
    }
}
