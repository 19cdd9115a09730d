//! # dcp-j2k
//!
//! The JPEG2000 boundary of the picture pipeline.
//!
//! The codec is treated as an external collaborator behind [`J2kCodec`].
//! This crate owns what happens around it:
//!
//! - [`decompress_j2k`] - container detection, resolution reduction, error
//!   wrapping with the size of the offending data
//! - [`compress_j2k`] - comment precondition and [`CompressParams`] derived
//!   from bandwidth, frame rate, stereo and 4K flags
//! - [`start_compression_error`] - mapping of codec error numbers
//!
//! # Usage
//!
//! ```rust
//! use dcp_j2k::{compress_j2k, CompressParams, J2kCodec, J2kFormat};
//! use dcp_core::{PlanarImage, Result, Size};
//!
//! struct Null;
//!
//! impl J2kCodec for Null {
//!     fn decode(&self, _: &[u8], _: J2kFormat, _: u32) -> Result<PlanarImage> {
//!         Ok(PlanarImage::new(Size::new(1, 1)))
//!     }
//!     fn encode(&self, _: &PlanarImage, p: &CompressParams, _: &str) -> Result<Vec<u8>> {
//!         Ok(vec![0; p.numresolution as usize])
//!     }
//! }
//!
//! let image = PlanarImage::new(Size::new(4, 4));
//! let out = compress_j2k(&Null, &image, 250_000_000, 24, false, false, "made by dcp-rs")?;
//! assert_eq!(out.len(), 6);
//! # Ok::<(), dcp_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`dcp-core`] - Planar images and errors
//! - [`tracing`] - Debug events around codec calls
//! - [`jpeg2k`] - OpenJPEG decoding (`openjpeg` feature)
//!
//! # Feature Flags
//!
//! - `openjpeg` - [`OpenJpegCodec`], a decoder backed by OpenJPEG

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod codec;
#[cfg(feature = "openjpeg")]
mod openjpeg;
mod params;
mod transcode;

pub use codec::*;
#[cfg(feature = "openjpeg")]
pub use openjpeg::OpenJpegCodec;
pub use params::*;
pub use transcode::*;
