//! # dcp-color
//!
//! Colour conversion between RGB sources and DCI XYZ.
//!
//! - [`Chromaticity`] - CIE xy coordinates of primaries and white points
//! - [`ColorConversion`] - transfer functions + primaries + optional adapted
//!   white, with derived RGB/XYZ and Bradford matrices and named presets
//! - [`rgb_to_xyz`], [`xyz_to_rgb`], [`xyz_to_rgba`] - bulk 12-bit pixel
//!   conversion with clamping reported through notes
//!
//! # Usage
//!
//! ```rust
//! use dcp_color::{rgb_to_xyz, xyz_to_rgb, ColorConversion};
//! use dcp_core::Size;
//!
//! let size = Size::new(2, 1);
//! let rgb = vec![0x80u8; 2 * 6];
//! let conversion = ColorConversion::rec709_to_xyz();
//!
//! let xyz = rgb_to_xyz(&rgb, size, 12, conversion, None)?;
//! let mut back = vec![0u8; 12];
//! xyz_to_rgb(&xyz, conversion, &mut back, 12, None)?;
//! # Ok::<(), dcp_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`dcp-core`] - Images, errors, notes
//! - [`dcp-math`] - Matrices and Bradford adaptation
//! - [`dcp-transfer`] - Transfer-function tables
//! - [`rayon`] - Row-parallel pixel loops (`parallel` feature)
//! - [`tracing`] - Debug events for clamped samples
//!
//! # Feature Flags
//!
//! - `parallel` (default) - convert rows on the rayon pool
//! - `serde` - `Serialize`/`Deserialize` for conversion descriptions

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod chromaticity;
mod conversion;
mod rgb_xyz;

pub use chromaticity::*;
pub use conversion::*;
pub use rgb_xyz::*;

pub use dcp_transfer::TransferFunction;

/// Commonly used types.
pub mod prelude {
    pub use crate::{Chromaticity, ColorConversion, TransferFunction, YuvToRgb};
    pub use crate::{rgb_to_xyz, xyz_to_rgb, xyz_to_rgba};
}
