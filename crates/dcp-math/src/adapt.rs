//! Chromatic adaptation.
//!
//! A Bradford transform moves XYZ values from one reference white to
//! another by scaling in a sharpened cone-response space:
//!
//! ```text
//! A = M^-1 * diag(M*dst / M*src) * M
//! ```
//!
//! # Usage
//!
//! ```rust
//! use dcp_math::{adapt_matrix, Vec3, BRADFORD, BRADFORD_INV};
//!
//! let d65 = Vec3::new(0.95047, 1.0, 1.08883);
//! let a = Vec3::new(1.09850, 1.0, 0.35585);
//! let m = adapt_matrix(BRADFORD, BRADFORD_INV, d65, a);
//!
//! let white = m * d65;
//! assert!((white.z - a.z).abs() < 1e-3);
//! ```

use crate::{Mat3, Vec3};

// ============================================================================
// Bradford matrices
// ============================================================================

/// Bradford cone-response matrix.
///
/// # Reference
///
/// Lam, K.M. (1985). Metamerism and Colour Constancy.
pub const BRADFORD: Mat3 = Mat3::from_rows([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// Published inverse of [`BRADFORD`].
///
/// These are the tabulated constants, not a computed inverse; adaptation
/// results are reproducible to the last digit only with these values.
pub const BRADFORD_INV: Mat3 = Mat3::from_rows([
    [0.9869929055, -0.1470542564, 0.1599626517],
    [0.4323052697, 0.5183602715, 0.0492912282],
    [-0.0085286646, 0.0400428217, 0.9684866958],
]);

// ============================================================================
// Adaptation
// ============================================================================

/// Computes the matrix adapting XYZ from `src_white` to `dst_white`.
///
/// `method_inv` must be the inverse of `method`; it is taken explicitly so
/// that tabulated inverses are used as published.
pub fn adapt_matrix(method: Mat3, method_inv: Mat3, src_white: Vec3, dst_white: Vec3) -> Mat3 {
    let src_cone = method * src_white;
    let dst_cone = method * dst_white;

    let scale = Mat3::diagonal(
        dst_cone.x / src_cone.x,
        dst_cone.y / src_cone.y,
        dst_cone.z / src_cone.z,
    );

    method_inv * (scale * method)
}

/// XYZ of a white point given by chromaticity `(x, y)`, normalised to Y=1.
#[inline]
pub fn white_xyz(x: f64, y: f64) -> Vec3 {
    Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bradford_inverse_constants() {
        let product = BRADFORD * BRADFORD_INV;
        assert!(product.abs_diff_eq(&Mat3::IDENTITY, 1e-8), "{:?}", product);
    }

    #[test]
    fn test_adapt_identity() {
        let d65 = white_xyz(0.3127, 0.329);
        let same = adapt_matrix(BRADFORD, BRADFORD_INV, d65, d65);
        assert!(same.abs_diff_eq(&Mat3::IDENTITY, 1e-8));
    }

    #[test]
    fn test_adapt_maps_white() {
        let d65 = white_xyz(0.3127, 0.329);
        let illuminant_a = white_xyz(0.447576324, 0.407443172);
        let m = adapt_matrix(BRADFORD, BRADFORD_INV, d65, illuminant_a);
        let result = m * d65;
        assert!((result.x - illuminant_a.x).abs() < 1e-6);
        assert!((result.y - illuminant_a.y).abs() < 1e-6);
        assert!((result.z - illuminant_a.z).abs() < 1e-6);
    }

    #[test]
    fn test_adapt_roundtrip() {
        let d65 = white_xyz(0.3127, 0.329);
        let d50 = white_xyz(0.3457, 0.3585);
        let there = adapt_matrix(BRADFORD, BRADFORD_INV, d65, d50);
        let back = adapt_matrix(BRADFORD, BRADFORD_INV, d50, d65);
        let roundtrip = back * there;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (roundtrip.m[i][j] - expected).abs() < 1e-6,
                    "roundtrip[{}][{}] = {} (expected {})",
                    i,
                    j,
                    roundtrip.m[i][j],
                    expected
                );
            }
        }
    }
}
