//! # dcp-transfer
//!
//! Transfer functions sampled into lookup tables for the RGB/XYZ pixel
//! pipeline.
//!
//! A [`TransferFunction`] maps a normalised code value to linear light (or
//! back, when `inverse` is set). The pixel converters never evaluate the
//! curves directly; they index tables of `2^bit_depth` samples built once per
//! distinct `(function, from, to, bit_depth, inverse, scale)` and shared for
//! the rest of the process.
//!
//! # Supported Functions
//!
//! | Variant | Curve |
//! |---------|-------|
//! | [`TransferFunction::Identity`] | `y = x` |
//! | [`TransferFunction::Gamma`] | `y = x^g` |
//! | [`TransferFunction::ModifiedGamma`] | linear toe + offset power (sRGB style) |
//! | [`TransferFunction::SGamut3`] | Sony S-Log3 |
//!
//! # Usage
//!
//! ```rust
//! use dcp_transfer::TransferFunction;
//! use std::sync::Arc;
//!
//! let gamma = TransferFunction::Gamma(2.6);
//! let a = gamma.double_lut(0.0, 1.0, 12, false);
//! let b = gamma.double_lut(0.0, 1.0, 12, false);
//! assert_eq!(a.len(), 4096);
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! # Dependencies
//!
//! - [`tracing`] - Reports table builds at `trace` level
//!
//! # Used By
//!
//! - `dcp-color` - RGB/XYZ conversion

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod function;
mod piecewise;

pub use cache::{LutCache, LutKey};
pub use function::*;
pub use piecewise::PiecewiseLut2;
