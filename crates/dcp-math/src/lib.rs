//! # dcp-math
//!
//! Double-precision matrix math for DCP colour conversion.
//!
//! - [`Mat3`] - 3x3 `f64` matrices with an LU-based inverse
//! - [`Vec3`] - 3-component `f64` vectors for RGB/XYZ triplets
//! - [`BRADFORD`], [`BRADFORD_INV`], [`adapt_matrix`] - Bradford chromatic adaptation
//!
//! # Design
//!
//! Colour matrices for DCP mastering are derived from chromaticities and then
//! baked into 12-bit pipelines, so everything here is `f64`.
//! All matrices are **row-major** and act on **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Usage
//!
//! ```rust
//! use dcp_math::{Mat3, Vec3};
//!
//! let rgb_to_xyz = Mat3::from_rows([
//!     [0.4124564, 0.3575761, 0.1804375],
//!     [0.2126729, 0.7151522, 0.0721750],
//!     [0.0193339, 0.1191920, 0.9503041],
//! ]);
//!
//! let xyz = rgb_to_xyz * Vec3::new(1.0, 1.0, 1.0);
//! assert!((xyz.y - 1.0).abs() < 1e-6);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - Interop with `glam::DMat3` / `glam::DVec3`
//!
//! # Used By
//!
//! - `dcp-color` - RGB/XYZ matrix derivation and Bradford adaptation

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod adapt;
mod mat3;
mod vec3;

pub use adapt::*;
pub use mat3::*;
pub use vec3::*;

/// Re-export glam types for direct use
pub mod glam {
    pub use ::glam::{DMat3, DVec3};
}
