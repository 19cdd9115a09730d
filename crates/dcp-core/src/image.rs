//! Planar three-component integer images.
//!
//! [`PlanarImage`] is the pixel container on both sides of the JPEG2000
//! codec: a 12-bit XYZ (or RGB) picture stored as three separate planes of
//! `i32` samples. Samples are nominally in `[0, 4095]` but decoders may hand
//! back values outside that range; consumers clamp and report.
//!
//! Cloning is a deep copy.
//!
//! # Example
//!
//! ```rust
//! use dcp_core::{PlanarImage, Size};
//!
//! let mut img = PlanarImage::new(Size::new(2, 2));
//! img.data_mut(1)[3] = 4095;
//! assert_eq!(img.data(1)[3], 4095);
//! ```

use crate::{Error, Result, Size};

/// Precision of DCP picture samples.
pub const DCP_PRECISION: u32 = 12;

/// A 3-component planar image of `i32` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarImage {
    size: Size,
    precision: u32,
    planes: [Vec<i32>; 3],
}

impl PlanarImage {
    /// Creates a zero-filled 12-bit image.
    pub fn new(size: Size) -> Self {
        let n = size.area();
        Self {
            size,
            precision: DCP_PRECISION,
            planes: [vec![0; n], vec![0; n], vec![0; n]],
        }
    }

    /// Creates an image from existing planes.
    ///
    /// Each plane must hold exactly `size.area()` samples.
    pub fn from_planes(size: Size, precision: u32, planes: [Vec<i32>; 3]) -> Result<Self> {
        let n = size.area();
        for (i, p) in planes.iter().enumerate() {
            if p.len() != n {
                return Err(Error::Misc(format!(
                    "plane {} has {} samples but a {} image needs {}",
                    i,
                    p.len(),
                    size,
                    n
                )));
            }
        }
        Ok(Self {
            size,
            precision,
            planes,
        })
    }

    /// Image dimensions.
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bits per sample.
    #[inline]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Samples of component `c` (0, 1 or 2), row-major.
    #[inline]
    pub fn data(&self, c: usize) -> &[i32] {
        &self.planes[c]
    }

    /// Mutable samples of component `c`.
    #[inline]
    pub fn data_mut(&mut self, c: usize) -> &mut [i32] {
        &mut self.planes[c]
    }

    /// All three planes.
    #[inline]
    pub fn planes(&self) -> &[Vec<i32>; 3] {
        &self.planes
    }

    /// All three planes, mutably.
    pub fn planes_mut(&mut self) -> [&mut [i32]; 3] {
        let [x, y, z] = &mut self.planes;
        [x.as_mut_slice(), y.as_mut_slice(), z.as_mut_slice()]
    }

    /// Consumes the image, returning its planes.
    pub fn into_planes(self) -> [Vec<i32>; 3] {
        self.planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img = PlanarImage::new(Size::new(4, 3));
        for c in 0..3 {
            assert_eq!(img.data(c).len(), 12);
            assert!(img.data(c).iter().all(|&v| v == 0));
        }
        assert_eq!(img.precision(), 12);
    }

    #[test]
    fn test_from_planes_rejects_wrong_length() {
        let r = PlanarImage::from_planes(Size::new(2, 2), 12, [vec![0; 4], vec![0; 3], vec![0; 4]]);
        assert!(matches!(r, Err(Error::Misc(_))));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = PlanarImage::new(Size::new(1, 1));
        let b = a.clone();
        a.data_mut(0)[0] = 7;
        assert_eq!(b.data(0)[0], 0);
    }
}
