//! Price rounding according to the configured rounding policy.
//!
//! # Invariants
//! - A value already expressed at the requested precision is returned as is.
//! - Precisions are clamped to `-308..=308`; no precision can panic.
//! - Scaled values are snapped to 15 significant digits before rounding so
//!   binary float noise (`1.1 * 100 = 110.00000000000001`) is ignored.

use serde::{Deserialize, Serialize};

const SIGNIFICANT_DIGITS: usize = 15;
const MAX_PRECISION: i32 = 308;

/// Rounding policy applied by [`PriceRounder::round`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    /// Always towards positive infinity at the precision.
    Up,
    /// Always towards negative infinity at the precision.
    Down,
    /// Nearest, halves away from zero.
    #[default]
    Half,
}

/// Price settings from the application configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub round_mode: RoundMode,
    /// Digits after the decimal point used when a call gives none.
    pub default_precision: i32,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            round_mode: RoundMode::Half,
            default_precision: 2,
        }
    }
}

/// Rounds prices with the configured mode and precision.
#[derive(Debug, Clone, Copy)]
pub struct PriceRounder {
    config: PriceConfig,
}

impl PriceRounder {
    pub fn new(config: PriceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PriceConfig {
        self.config
    }

    /// Rounds `value` with the configured mode.
    pub fn round(&self, value: f64, precision: Option<i32>) -> f64 {
        match self.config.round_mode {
            RoundMode::Up => self.ceilf(value, precision),
            RoundMode::Down => self.floorf(value, precision),
            RoundMode::Half => round_at(value, self.precision(precision), f64::round),
        }
    }

    /// Rounds `value` up at the precision.
    pub fn ceilf(&self, value: f64, precision: Option<i32>) -> f64 {
        round_at(value, self.precision(precision), f64::ceil)
    }

    /// Rounds `value` down at the precision.
    pub fn floorf(&self, value: f64, precision: Option<i32>) -> f64 {
        round_at(value, self.precision(precision), f64::floor)
    }

    /// Requested precision, clamped to the range an `f64` exponent can hold.
    fn precision(&self, precision: Option<i32>) -> i32 {
        precision
            .unwrap_or(self.config.default_precision)
            .clamp(-MAX_PRECISION, MAX_PRECISION)
    }
}

/// Applies `op` at the units digit of `value` scaled by `precision`.
///
/// Values already exact at the precision, or too large to scale, are
/// returned untouched.
fn round_at(value: f64, precision: i32, op: fn(f64) -> f64) -> f64 {
    let scaled = snap(scale(value, precision));
    if !scaled.is_finite() || scaled.fract() == 0.0 {
        return value;
    }
    unscale(op(scaled), precision)
}

/// Moves the rounding position to the units digit.
///
/// Both directions multiply or divide by an exact power of ten so whole
/// results (`13 * 100`) stay exact.
fn scale(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision.abs());
    if precision >= 0 {
        value * factor
    } else {
        value / factor
    }
}

fn unscale(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision.abs());
    if precision >= 0 {
        value / factor
    } else {
        value * factor
    }
}

fn snap(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value)
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::{snap, PriceConfig, PriceRounder, RoundMode};

    fn rounder(round_mode: RoundMode) -> PriceRounder {
        PriceRounder::new(PriceConfig {
            round_mode,
            default_precision: 2,
        })
    }

    #[test]
    fn snap_removes_float_noise() {
        assert_eq!(snap(1.1 * 100.0), 110.0);
        assert_eq!(snap(1.009 * 100.0), 100.9);
    }

    #[test]
    fn ceilf_rounds_up_at_precision() {
        assert_eq!(rounder(RoundMode::Up).ceilf(1.001, Some(2)), 1.01);
        assert_eq!(rounder(RoundMode::Up).ceilf(-1.001, Some(2)), -1.0);
    }

    #[test]
    fn floorf_rounds_down_at_precision() {
        assert_eq!(rounder(RoundMode::Down).floorf(1.009, Some(2)), 1.0);
    }

    #[test]
    fn exact_values_are_returned_untouched() {
        let up = rounder(RoundMode::Up);
        assert_eq!(up.ceilf(1.1, Some(2)), 1.1);
        assert_eq!(up.floorf(12.0, Some(0)), 12.0);
    }

    #[test]
    fn round_dispatches_on_mode() {
        assert_eq!(rounder(RoundMode::Up).round(2.341, None), 2.35);
        assert_eq!(rounder(RoundMode::Down).round(2.349, None), 2.34);
        assert_eq!(rounder(RoundMode::Half).round(2.345, None), 2.35);
        assert_eq!(rounder(RoundMode::Half).round(2.344, None), 2.34);
    }

    #[test]
    fn half_mode_rounds_halves_away_from_zero() {
        let half = rounder(RoundMode::Half);
        assert_eq!(half.round(1.005, Some(2)), 1.01);
        assert_eq!(half.round(-0.5, Some(0)), -1.0);
        assert_eq!(half.round(2.5, Some(0)), 3.0);
    }

    #[test]
    fn negative_precision_rounds_to_tens() {
        assert_eq!(rounder(RoundMode::Half).round(1234.0, Some(-2)), 1200.0);
        assert_eq!(rounder(RoundMode::Up).ceilf(1234.0, Some(-2)), 1300.0);
    }

    #[test]
    fn extreme_precisions_do_not_overflow() {
        let half = rounder(RoundMode::Half);
        assert_eq!(half.round(1.5, Some(i32::MAX)), 1.5);
        assert_eq!(half.round(1.5, Some(i32::MIN)), 0.0);
        assert_eq!(rounder(RoundMode::Up).ceilf(2.25, Some(i32::MAX)), 2.25);
        assert_eq!(rounder(RoundMode::Down).floorf(2.25, Some(i32::MIN)), 0.0);
    }
}
