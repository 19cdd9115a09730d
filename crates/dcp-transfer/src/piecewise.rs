//! Two-segment integer lookup.
//!
//! Inverse gamma curves are steep near black, so a single 12-bit table loses
//! precision there. [`PiecewiseLut2`] uses a fine table below `boundary` and
//! a coarse one above it.

use std::sync::Arc;

use crate::TransferFunction;

/// Integer lookup split at `boundary` into two tables of different
/// resolution.
#[derive(Debug, Clone)]
pub struct PiecewiseLut2 {
    boundary: f64,
    low: Arc<[i32]>,
    high: Arc<[i32]>,
    low_scale: f64,
    high_scale: f64,
}

impl PiecewiseLut2 {
    /// Builds (or fetches from the cache) both segments of `function`.
    pub fn new(
        function: TransferFunction,
        boundary: f64,
        low_bits: u32,
        high_bits: u32,
        inverse: bool,
        scale: i32,
    ) -> Self {
        Self {
            boundary,
            low: function.int_lut(0.0, boundary, low_bits, inverse, scale),
            high: function.int_lut(boundary, 1.0, high_bits, inverse, scale),
            low_scale: ((1u32 << low_bits) - 1) as f64,
            high_scale: ((1u32 << high_bits) - 1) as f64,
        }
    }

    /// Looks up `x`, which must lie in `[0, 1]`.
    #[inline]
    pub fn lookup(&self, x: f64) -> i32 {
        if x < self.boundary {
            self.low[((x / self.boundary) * self.low_scale).round_ties_even() as usize]
        } else {
            self.high[(((x - self.boundary) / (1.0 - self.boundary)) * self.high_scale)
                .round_ties_even() as usize]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_lookup() {
        let lut = PiecewiseLut2::new(TransferFunction::Identity, 0.062, 16, 12, true, 4095);
        assert_eq!(lut.lookup(0.0), 0);
        assert_eq!(lut.lookup(1.0), 4095);
        assert!((lut.lookup(0.5) - 2048).abs() <= 1);
        // Just below the boundary comes from the fine table
        let x = 0.0619;
        assert!((lut.lookup(x) - (x * 4095.0).round() as i32).abs() <= 1);
    }

    #[test]
    fn test_gamma_lookup_matches_curve() {
        let f = TransferFunction::Gamma(2.6);
        let lut = PiecewiseLut2::new(f, 0.062, 16, 12, true, 4095);
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            let expected = (f.evaluate(x, true) * 4095.0).round() as i32;
            assert!(
                (lut.lookup(x) - expected).abs() <= 2,
                "x={} got={} expected={}",
                x,
                lut.lookup(x),
                expected
            );
        }
    }
}
