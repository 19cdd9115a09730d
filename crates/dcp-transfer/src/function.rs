//! Transfer-function variants and their table generators.

use std::sync::{Arc, LazyLock};

use tracing::trace;

use crate::{LutCache, LutKey};

static DOUBLE_LUTS: LazyLock<LutCache<f64>> = LazyLock::new(LutCache::new);
static INT_LUTS: LazyLock<LutCache<i32>> = LazyLock::new(LutCache::new);

/// A transfer function between code values and linear light.
///
/// The forward direction (`inverse == false`) decodes: code value in,
/// linear light out.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferFunction {
    /// `y = x`.
    Identity,

    /// Pure power curve `y = x^gamma`.
    Gamma(f64),

    /// Piecewise curve with a linear segment below `threshold`:
    ///
    /// ```text
    /// y = x / b                         if x <= threshold
    /// y = ((x + a) / (1 + a))^power     otherwise
    /// ```
    ///
    /// sRGB is `power = 2.4, threshold = 0.04045, a = 0.055, b = 12.92`.
    ModifiedGamma {
        /// Exponent of the power segment.
        power: f64,
        /// Code value where the linear segment ends.
        threshold: f64,
        /// Offset of the power segment.
        a: f64,
        /// Slope divisor of the linear segment.
        b: f64,
    },

    /// Sony S-Log3 (as used with S-Gamut3 primaries).
    SGamut3,
}

impl TransferFunction {
    /// Evaluates the curve at `p`.
    pub fn evaluate(&self, p: f64, inverse: bool) -> f64 {
        match *self {
            TransferFunction::Identity => p,
            TransferFunction::Gamma(g) => {
                let g = if inverse { 1.0 / g } else { g };
                p.powf(g)
            }
            TransferFunction::ModifiedGamma {
                power,
                threshold,
                a,
                b,
            } => {
                if inverse {
                    if p > threshold / b {
                        (1.0 + a) * p.powf(1.0 / power) - a
                    } else {
                        p * b
                    }
                } else if p > threshold {
                    ((p + a) / (1.0 + a)).powf(power)
                } else {
                    p / b
                }
            }
            TransferFunction::SGamut3 => s_log3(p, inverse),
        }
    }

    /// Samples the curve at `2^bit_depth` evenly spaced points over
    /// `[from, to]`, without caching.
    pub fn make_lut(&self, from: f64, to: f64, bit_depth: u32, inverse: bool) -> Vec<f64> {
        let n = 1usize << bit_depth;
        let last = (n - 1) as f64;
        (0..n)
            .map(|i| self.evaluate(from + (to - from) * (i as f64 / last), inverse))
            .collect()
    }

    /// Returns the shared `f64` table for these parameters, building it on
    /// first use.
    pub fn double_lut(&self, from: f64, to: f64, bit_depth: u32, inverse: bool) -> Arc<[f64]> {
        let key = LutKey::new(*self, from, to, bit_depth, inverse, 1);
        DOUBLE_LUTS.get_or_create(key, || {
            trace!(function = ?self, from, to, bit_depth, inverse, "building double LUT");
            self.make_lut(from, to, bit_depth, inverse)
        })
    }

    /// Returns the shared integer table: each double-table entry multiplied
    /// by `scale` and rounded to nearest (ties to even).
    pub fn int_lut(
        &self,
        from: f64,
        to: f64,
        bit_depth: u32,
        inverse: bool,
        scale: i32,
    ) -> Arc<[i32]> {
        let key = LutKey::new(*self, from, to, bit_depth, inverse, scale);
        INT_LUTS.get_or_create(key, || {
            trace!(function = ?self, from, to, bit_depth, inverse, scale, "building int LUT");
            self.double_lut(from, to, bit_depth, inverse)
                .iter()
                .map(|v| (v * scale as f64).round_ties_even() as i32)
                .collect()
        })
    }

    /// Returns true if `other` is the same kind of function with every
    /// parameter within `epsilon`.
    ///
    /// Parameterless variants compare equal to themselves regardless of
    /// `epsilon`; different variants are never equal.
    pub fn about_equal(&self, other: &TransferFunction, epsilon: f64) -> bool {
        match (self, other) {
            (TransferFunction::Identity, TransferFunction::Identity) => true,
            (TransferFunction::SGamut3, TransferFunction::SGamut3) => true,
            (TransferFunction::Gamma(a), TransferFunction::Gamma(b)) => (a - b).abs() < epsilon,
            (
                TransferFunction::ModifiedGamma {
                    power: p1,
                    threshold: t1,
                    a: a1,
                    b: b1,
                },
                TransferFunction::ModifiedGamma {
                    power: p2,
                    threshold: t2,
                    a: a2,
                    b: b2,
                },
            ) => {
                (p1 - p2).abs() < epsilon
                    && (t1 - t2).abs() < epsilon
                    && (a1 - a2).abs() < epsilon
                    && (b1 - b2).abs() < epsilon
            }
            _ => false,
        }
    }
}

// ============================================================================
// S-Log3
// ============================================================================

/// 10-bit code value of the toe/log knee.
const SLOG3_KNEE_CODE: f64 = 171.2102946929;
/// Linear reflectance at the knee.
const SLOG3_KNEE_LINEAR: f64 = 0.01125;

fn s_log3(p: f64, inverse: bool) -> f64 {
    // The inverse switches to the log segment at KNEE_LINEAR / 1023
    if inverse {
        if p >= SLOG3_KNEE_LINEAR / 1023.0 {
            (420.0 + ((p + 0.01) / (0.18 + 0.01)).log10() * 261.5) / 1023.0
        } else {
            (p * (SLOG3_KNEE_CODE - 95.0) / SLOG3_KNEE_LINEAR + 95.0) / 1023.0
        }
    } else if p >= SLOG3_KNEE_CODE / 1023.0 {
        10f64.powf((p * 1023.0 - 420.0) / 261.5) * (0.18 + 0.01) - 0.01
    } else {
        (p * 1023.0 - 95.0) * SLOG3_KNEE_LINEAR / (SLOG3_KNEE_CODE - 95.0)
    }
}
