//! Range mapping for parameter normalization.
//!
//! This module provides traits and implementations for mapping between
//! native parameter values (in natural units like Hz, dB, ms) and normalized
//! values (0.0 to 1.0) used by the parameter store and the host.
//!
//! # Available Mappers
//!
//! - [`LinearMapper`] - Simple linear interpolation
//! - [`PowerMapper`] - Skewed response curve (the `skew` of a float definition)
//! - [`SteppedMapper`] - Snaps another mapper's output to a fixed interval
//!
//! # Example
//!
//! ```ignore
//! use conduit_core::parameter_range::{RangeMapper, LinearMapper, PowerMapper};
//!
//! let linear = LinearMapper::new(0.0..=100.0);
//! assert_eq!(linear.normalize(50.0), 0.5);
//! assert_eq!(linear.denormalize(0.5), 50.0);
//!
//! // Skew 0.3 gives a frequency knob more travel in the low range
//! let freq = PowerMapper::new(20.0..=20000.0, 0.3);
//! assert!(freq.denormalize(0.5) < 10010.0);
//! ```

use std::ops::RangeInclusive;

/// Trait for mapping between native values and normalized values.
///
/// Implementations must be thread-safe (`Send + Sync`) because the store
/// converts values from any thread.
pub trait RangeMapper: Send + Sync {
    /// Convert a native value to normalized (0.0-1.0).
    ///
    /// Values outside the range are clamped.
    fn normalize(&self, native: f64) -> f64;

    /// Convert a normalized value (0.0-1.0) to native.
    ///
    /// Values outside 0.0-1.0 are clamped.
    fn denormalize(&self, normalized: f64) -> f64;

    /// Get the native value range as (min, max).
    fn range(&self) -> (f64, f64);
}

/// Linear range mapping.
///
/// Maps values linearly between the range endpoints.
///
/// ```ignore
/// let mapper = LinearMapper::new(-60.0..=12.0);
/// assert_eq!(mapper.denormalize(0.0), -60.0);
/// assert_eq!(mapper.denormalize(1.0), 12.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearMapper {
    min: f64,
    max: f64,
}

impl LinearMapper {
    /// Create a new linear mapper with the given range.
    pub fn new(range: RangeInclusive<f64>) -> Self {
        Self {
            min: *range.start(),
            max: *range.end(),
        }
    }
}

impl RangeMapper for LinearMapper {
    fn normalize(&self, native: f64) -> f64 {
        if (self.max - self.min).abs() < f64::EPSILON {
            return 0.5;
        }
        ((native - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        self.min + normalized * (self.max - self.min)
    }

    fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Power curve range mapping.
///
/// This is the response curve behind a float definition's `skew`:
///
/// - `normalize`: `((v - min) / (max - min)) ^ skew`
/// - `denormalize`: `min + (max - min) * n ^ (1 / skew)`
///
/// With `skew < 1.0` more knob travel is spent near the minimum, with
/// `skew > 1.0` near the maximum, and `skew = 1.0` is linear.
///
/// # Panics
///
/// Panics if the skew is not positive, or if the range end is not
/// greater than the range start. Definitions are validated before a
/// mapper is built, so this only fires on direct misuse.
///
/// ```ignore
/// // More resolution near 0 dB (max), less at -60 dB (min)
/// let mapper = PowerMapper::new(-60.0..=0.0, 2.0);
/// let mid = mapper.denormalize(0.5);
/// assert!((mid - -17.57).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct PowerMapper {
    min: f64,
    max: f64,
    skew: f64,
}

impl PowerMapper {
    /// Create a new power curve mapper.
    pub fn new(range: RangeInclusive<f64>, skew: f64) -> Self {
        let min = *range.start();
        let max = *range.end();

        assert!(
            max > min,
            "PowerMapper requires max > min, got min={}, max={}",
            min, max
        );
        assert!(skew > 0.0, "PowerMapper requires positive skew, got {}", skew);

        Self { min, max, skew }
    }

    /// The skew exponent.
    pub fn skew(&self) -> f64 {
        self.skew
    }
}

impl RangeMapper for PowerMapper {
    fn normalize(&self, native: f64) -> f64 {
        let linear = ((native - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if self.skew == 1.0 {
            linear
        } else {
            linear.powf(self.skew)
        }
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        let linear = if self.skew == 1.0 || normalized <= 0.0 {
            normalized
        } else {
            normalized.powf(1.0 / self.skew)
        };
        self.min + linear * (self.max - self.min)
    }

    fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Interval snapping on top of another mapper.
///
/// Native values are snapped to `min + k * interval` and clamped to the
/// range. Used for integer, boolean and choice parameters (interval 1) and
/// for float parameters with a display interval.
pub struct SteppedMapper {
    inner: Box<dyn RangeMapper>,
    interval: f64,
}

impl SteppedMapper {
    /// Wrap `inner`, snapping to `interval`. An interval of zero disables
    /// snapping.
    pub fn new(inner: impl RangeMapper + 'static, interval: f64) -> Self {
        Self {
            inner: Box::new(inner),
            interval: interval.max(0.0),
        }
    }

    /// Snap a native value to the nearest legal value.
    pub fn snap(&self, native: f64) -> f64 {
        let (min, max) = self.inner.range();
        let snapped = if self.interval > 0.0 {
            min + self.interval * ((native - min) / self.interval).round()
        } else {
            native
        };
        snapped.clamp(min, max)
    }

    /// The snapping interval.
    pub fn interval(&self) -> f64 {
        self.interval
    }
}

impl RangeMapper for SteppedMapper {
    fn normalize(&self, native: f64) -> f64 {
        self.inner.normalize(self.snap(native))
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        self.snap(self.inner.denormalize(normalized))
    }

    fn range(&self) -> (f64, f64) {
        self.inner.range()
    }
}

impl std::fmt::Debug for SteppedMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteppedMapper")
            .field("range", &self.inner.range())
            .field("interval", &self.interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_round_trip() {
        let mapper = LinearMapper::new(-20.0..=20.0);
        assert_relative_eq!(mapper.denormalize(0.75), 10.0);
        assert_relative_eq!(mapper.normalize(10.0), 0.75);
        assert_eq!(mapper.normalize(100.0), 1.0);
        assert_eq!(mapper.denormalize(-1.0), -20.0);
    }

    #[test]
    fn test_power_skew_one_is_linear() {
        let power = PowerMapper::new(0.0..=100.0, 1.0);
        let linear = LinearMapper::new(0.0..=100.0);
        for n in [0.0, 0.1, 0.5, 0.9, 1.0] {
            assert_relative_eq!(power.denormalize(n), linear.denormalize(n));
        }
    }

    #[test]
    fn test_power_skew_bias() {
        let low = PowerMapper::new(0.0..=1.0, 0.5);
        let high = PowerMapper::new(0.0..=1.0, 2.0);

        // skew < 1 keeps the midpoint close to min, skew > 1 close to max
        assert_relative_eq!(low.denormalize(0.5), 0.25);
        assert_relative_eq!(high.denormalize(0.5), 0.5f64.sqrt());
        assert_relative_eq!(low.normalize(low.denormalize(0.3)), 0.3, epsilon = 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_power_rejects_non_positive_skew() {
        let _ = PowerMapper::new(0.0..=1.0, 0.0);
    }

    #[test]
    fn test_stepped_snaps_and_clamps() {
        let mapper = SteppedMapper::new(LinearMapper::new(1.0..=20.0), 1.0);
        assert_eq!(mapper.denormalize(0.51), 11.0);
        assert_eq!(mapper.snap(3.4), 3.0);
        assert_eq!(mapper.snap(25.0), 20.0);
        assert_relative_eq!(mapper.normalize(3.4), 2.0 / 19.0);
    }

    #[test]
    fn test_stepped_fine_interval() {
        let mapper = SteppedMapper::new(LinearMapper::new(-20.0..=20.0), 0.01);
        assert_relative_eq!(mapper.denormalize(0.75), 10.0, epsilon = 1e-9);
        assert_relative_eq!(mapper.snap(1.234), 1.23, epsilon = 1e-9);
    }
}
