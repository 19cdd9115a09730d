//! Small value types shared across crates.

use std::fmt;

/// Which DCP XML dialect a document follows.
///
/// The two standards differ in attribute casing (`HAlign` vs `Halign`,
/// `Id` vs `ID`), time formats and a handful of SMPTE-only features such as
/// `Zposition` and `Direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Standard {
    /// Interop (`DCSubtitle`).
    Interop,
    /// SMPTE 428-7 (`SubtitleReel`).
    Smpte,
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Standard::Interop => f.write_str("Interop"),
            Standard::Smpte => f.write_str("SMPTE"),
        }
    }
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Creates a size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width divided by height.
    pub fn ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Tolerances used when comparing two assets.
///
/// The default allows nothing to differ.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EqualityOptions {
    /// Maximum mean difference in pixel value between two images.
    pub max_mean_pixel_error: f64,
    /// Maximum standard deviation of pixel differences between two images.
    pub max_std_dev_pixel_error: f64,
    /// Maximum absolute difference between text vertical positions.
    pub max_text_vertical_position_error: f32,
    /// `<LoadFont>` nodes may differ.
    pub load_font_nodes_can_differ: bool,
    /// `IssueDate` values may differ (reported as a note instead).
    pub issue_dates_can_differ: bool,
    /// Write the last pair of differing text images to the working directory.
    pub export_differing_texts: bool,
}
