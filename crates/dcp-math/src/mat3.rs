//! 3x3 matrix type for colour transformations.
//!
//! [`Mat3`] holds RGB-to-XYZ matrices, their inverses and Bradford
//! adaptation matrices.
//!
//! # Convention
//!
//! Matrices are stored in **row-major** order and use **column vectors**:
//!
//! ```text
//! | m00 m01 m02 |   | x |   | m00*x + m01*y + m02*z |
//! | m10 m11 m12 | * | y | = | m10*x + m11*y + m12*z |
//! | m20 m21 m22 |   | z |   | m20*x + m21*y + m22*z |
//! ```

use crate::Vec3;
use std::ops::{Index, Mul};

/// A 3x3 `f64` matrix.
///
/// # Example
///
/// ```rust
/// use dcp_math::{Mat3, Vec3};
///
/// let identity = Mat3::IDENTITY;
/// let v = Vec3::new(1.0, 2.0, 3.0);
/// assert_eq!(identity * v, v);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// Matrix elements in row-major order: [row0, row1, row2]
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    /// Zero matrix.
    pub const ZERO: Self = Self { m: [[0.0; 3]; 3] };

    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Creates a diagonal matrix.
    #[inline]
    pub const fn diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self::from_rows([[d0, 0.0, 0.0], [0.0, d1, 0.0], [0.0, 0.0, d2]])
    }

    /// Returns element `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    /// Returns a row as Vec3.
    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.m[i])
    }

    /// Returns the transpose of this matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_rows([
            [self.m[0][0], self.m[1][0], self.m[2][0]],
            [self.m[0][1], self.m[1][1], self.m[2][1]],
            [self.m[0][2], self.m[1][2], self.m[2][2]],
        ])
    }

    /// Computes the determinant.
    #[inline]
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Computes the inverse by LU decomposition with partial pivoting.
    ///
    /// Returns `None` if a zero or non-finite pivot is met.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dcp_math::Mat3;
    ///
    /// let m = Mat3::diagonal(2.0, 4.0, 8.0);
    /// let inv = m.inverse().unwrap();
    /// assert_eq!(inv.m[1][1], 0.25);
    /// ```
    pub fn inverse(&self) -> Option<Self> {
        let (lu, perm) = self.lu_factorize()?;

        let mut out = Self::ZERO;
        for col in 0..3 {
            // Solve L U x = P e_col
            let mut b = [0.0; 3];
            for (i, p) in perm.iter().enumerate() {
                b[i] = if *p == col { 1.0 } else { 0.0 };
            }

            // Forward substitution (L has a unit diagonal)
            for i in 0..3 {
                for k in 0..i {
                    b[i] -= lu[i][k] * b[k];
                }
            }

            // Back substitution
            for i in (0..3).rev() {
                for k in (i + 1)..3 {
                    b[i] -= lu[i][k] * b[k];
                }
                b[i] /= lu[i][i];
            }

            for (i, v) in b.iter().enumerate() {
                out.m[i][col] = *v;
            }
        }

        Some(out)
    }

    /// Doolittle LU factorization in place; returns the packed LU matrix and
    /// the row permutation.
    fn lu_factorize(&self) -> Option<([[f64; 3]; 3], [usize; 3])> {
        let mut a = self.m;
        let mut perm = [0usize, 1, 2];

        for k in 0..3 {
            let mut pivot = k;
            for i in (k + 1)..3 {
                if a[i][k].abs() > a[pivot][k].abs() {
                    pivot = i;
                }
            }
            if a[pivot][k] == 0.0 || !a[pivot][k].is_finite() {
                return None;
            }
            if pivot != k {
                a.swap(pivot, k);
                perm.swap(pivot, k);
            }
            for i in (k + 1)..3 {
                a[i][k] /= a[k][k];
                for j in (k + 1)..3 {
                    a[i][j] -= a[i][k] * a[k][j];
                }
            }
        }

        Some((a, perm))
    }

    /// Transforms a Vec3 by this matrix.
    #[inline]
    pub fn transform(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.m[0][0] * v.x + self.m[0][1] * v.y + self.m[0][2] * v.z,
            self.m[1][0] * v.x + self.m[1][1] * v.y + self.m[1][2] * v.z,
            self.m[2][0] * v.x + self.m[2][1] * v.y + self.m[2][2] * v.z,
        )
    }

    /// Multiplies two matrices.
    #[inline]
    pub fn mul_mat(&self, other: &Self) -> Self {
        let mut result = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                result.m[i][j] = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j];
            }
        }
        result
    }

    /// Flattens to nine row-major values.
    #[inline]
    pub fn to_array(&self) -> [f64; 9] {
        let m = &self.m;
        [
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        ]
    }

    /// Returns true if every element of `self` is within `eps` of `other`.
    pub fn abs_diff_eq(&self, other: &Self, eps: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Converts to glam DMat3 (column-major).
    #[inline]
    pub fn to_glam(&self) -> glam::DMat3 {
        glam::DMat3::from_cols_array_2d(&self.transpose().m)
    }

    /// Creates from glam DMat3.
    #[inline]
    pub fn from_glam(m: glam::DMat3) -> Self {
        Self::from_rows(m.to_cols_array_2d()).transpose()
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// Mat3 * Vec3
impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.transform(rhs)
    }
}

// Mat3 * Mat3
impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.mul_mat(&rhs)
    }
}

// Mat3 * f64
impl Mul<f64> for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        let mut out = self;
        for v in out.m.iter_mut().flatten() {
            *v *= rhs;
        }
        out
    }
}

impl Index<usize> for Mat3 {
    type Output = [f64; 3];

    #[inline]
    fn index(&self, i: usize) -> &[f64; 3] {
        &self.m[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mat3_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat3::IDENTITY * v, v);
    }

    #[test]
    fn test_mat3_determinant() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]]);
        assert_abs_diff_eq!(m.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mat3_inverse_needs_pivoting() {
        // Zero in the top-left forces a row swap
        let m = Mat3::from_rows([[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]]);
        let inv = m.inverse().unwrap();
        let result = m * inv;
        assert!(result.abs_diff_eq(&Mat3::IDENTITY, 1e-12), "{:?}", result);
        let result = inv * m;
        assert!(result.abs_diff_eq(&Mat3::IDENTITY, 1e-12), "{:?}", result);
    }

    #[test]
    fn test_mat3_singular() {
        let m = Mat3::from_rows([
            [1.0, 2.0, 3.0],
            [2.0, 4.0, 6.0], // Row 2 = 2 * Row 1
            [1.0, 1.0, 1.0],
        ]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_mat3_glam_round_trip() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let g = m.to_glam();
        // glam stores columns; the first column is (1, 4, 7)
        assert_eq!(g.x_axis.y, 4.0);
        assert_eq!(Mat3::from_glam(g), m);
    }

    #[test]
    fn test_mat3_scalar_and_flatten() {
        let m = Mat3::diagonal(1.0, 2.0, 3.0) * 2.0;
        assert_eq!(m.to_array(), [2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 6.0]);
    }
}
