//! # dcp-core
//!
//! Core types shared by the DCP text and picture crates.
//!
//! This crate provides the foundational pieces every other crate builds on:
//!
//! - [`Error`], [`Result`] - Unified error type for parse, codec and file failures
//! - [`NoteType`] - Severity of non-fatal notes passed to note callbacks
//! - [`Standard`] - Interop or SMPTE flavour of the DCP XML dialects
//! - [`EqualityOptions`] - Tolerances used when comparing assets
//! - [`Size`], [`PlanarImage`] - 3-component integer images (12-bit XYZ or RGB)
//!
//! ## Crate Structure
//!
//! ```text
//! dcp-core (this crate)
//!    ^
//!    |
//!    +-- dcp-math (matrices)
//!    +-- dcp-transfer (transfer functions, LUT cache)
//!    +-- dcp-color (colour conversion, RGB/XYZ pixels)
//!    +-- dcp-j2k (JPEG2000 transcode boundary)
//!    +-- dcp-text (subtitle model and XML)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serialization for configuration and value types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod note;
pub mod types;

pub use error::*;
pub use image::*;
pub use note::*;
pub use types::*;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use dcp_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::PlanarImage;
    pub use crate::note::NoteType;
    pub use crate::types::{EqualityOptions, Size, Standard};
}
