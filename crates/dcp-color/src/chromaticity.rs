//! CIE xy chromaticity coordinates.

use dcp_math::{Vec3, white_xyz};

/// A point in the CIE 1931 xy chromaticity diagram.
///
/// # Example
///
/// ```rust
/// use dcp_color::Chromaticity;
///
/// let d65 = Chromaticity::D65;
/// assert!((d65.z() - 0.3583).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chromaticity {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
}

impl Chromaticity {
    /// CIE standard illuminant D65.
    pub const D65: Self = Self::new(0.3127, 0.329);

    /// Creates a chromaticity.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `1 - x - y`.
    #[inline]
    pub fn z(&self) -> f64 {
        1.0 - self.x - self.y
    }

    /// Returns true if both coordinates are within `epsilon` of `other`.
    #[inline]
    pub fn about_equal(&self, other: &Chromaticity, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }

    /// XYZ of this chromaticity with Y normalised to 1.
    #[inline]
    pub fn to_xyz(&self) -> Vec3 {
        white_xyz(self.x, self.y)
    }
}
