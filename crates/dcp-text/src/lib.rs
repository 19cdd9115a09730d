//! # dcp-text
//!
//! Subtitle and caption assets for digital cinema packages.
//!
//! - [`Text`] - one timed event: a styled run of text or a PNG image
//! - [`Time`] - timecodes with their own tick rate
//! - [`TextAsset`] - the texts and fonts shared by both dialects
//! - [`InteropTextAsset`] - `DCSubtitle` documents
//! - [`SmpteTextAsset`] - SMPTE ST 428-7 `SubtitleReel` documents
//!
//! Writing groups texts into `<Subtitle>` and `<Text>` elements and hoists
//! shared font attributes into the fewest `<Font>` wrappers (see [`order`]).
//!
//! # Usage
//!
//! ```rust
//! use dcp_text::prelude::*;
//!
//! let mut doc = InteropTextAsset::new();
//! doc.set_movie_title("Example");
//! doc.asset_mut().add(TextString::new(
//!     TextCommon::new(Time::new(0, 0, 1, 0, 250), Time::new(0, 0, 3, 0, 250)),
//!     "Hello",
//! ));
//!
//! let xml = doc.xml_as_string();
//! let back = InteropTextAsset::from_xml(&xml)?;
//! assert_eq!(back.asset().texts().len(), 1);
//! # Ok::<(), dcp_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`dcp-core`] - Errors, notes, standards
//! - [`quick-xml`] - XML reading and writing
//! - [`uuid`] - Ids for images, documents and fonts
//! - [`tracing`] - Debug events and warnings for missing images
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for the value types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod asset;
mod interop;
mod load_variable_z;
pub mod order;
pub mod parse;
mod smpte;
mod text;
mod time;
mod types;
pub mod xml;

pub use asset::*;
pub use interop::*;
pub use load_variable_z::*;
pub use smpte::*;
pub use text::*;
pub use time::*;
pub use types::*;
pub use xml::format_xml;

/// Commonly used types.
pub mod prelude {
    pub use crate::{InteropTextAsset, SmpteTextAsset, TextAsset, TextDocument};
    pub use crate::{Text, TextCommon, TextImage, TextString, Time};
    pub use crate::{Color, Direction, Effect, Fraction, HAlign, VAlign};
}
