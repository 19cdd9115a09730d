//! Text events: glyph runs and bitmap overlays.
//!
//! Every event carries a [`TextCommon`] record of timing and placement.
//! [`Text`] is the tagged union stored by assets.

use std::fs;
use std::path::{Path, PathBuf};

use dcp_core::{EqualityOptions, Error, NoteHandler, NoteType, Result};
use tracing::debug;

use crate::{Color, Direction, Effect, HAlign, Ruby, Time, VAlign, VariableZPosition};

// ============================================================================
// Common
// ============================================================================

/// Timing and placement shared by every text event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextCommon {
    /// Start time, relative to the start of the reel.
    pub time_in: Time,
    /// End time, relative to the start of the reel.
    pub time_out: Time,
    /// Horizontal position as a proportion of screen width from `h_align`.
    pub h_position: f32,
    /// Horizontal anchor.
    pub h_align: HAlign,
    /// Vertical position as a proportion of screen height from `v_align`.
    pub v_position: f32,
    /// Vertical anchor.
    pub v_align: VAlign,
    /// Depth as a proportion of screen height.
    pub z_position: f32,
    /// Depth over time; empty for a fixed depth.
    pub variable_z_positions: Vec<VariableZPosition>,
    /// Fade-in duration.
    pub fade_up_time: Time,
    /// Fade-out duration.
    pub fade_down_time: Time,
}

impl TextCommon {
    /// Creates a centred event between two times with no fades.
    pub fn new(time_in: Time, time_out: Time) -> Self {
        Self {
            time_in,
            time_out,
            h_position: 0.0,
            h_align: HAlign::Center,
            v_position: 0.0,
            v_align: VAlign::Center,
            z_position: 0.0,
            variable_z_positions: Vec::new(),
            fade_up_time: Time::default(),
            fade_down_time: Time::default(),
        }
    }

    /// Compares timing and placement, reporting each difference.
    pub fn equals(&self, other: &TextCommon, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        let mut same = true;
        let mut differ = |what: String| {
            note(NoteType::Error, what);
            same = false;
        };

        if self.time_in != other.time_in {
            differ("text in times differ".into());
        }
        if self.time_out != other.time_out {
            differ("text out times differ".into());
        }
        if self.h_position != other.h_position {
            differ("text horizontal positions differ".into());
        }
        if self.h_align != other.h_align {
            differ("text horizontal alignments differ".into());
        }

        let vpos = (self.v_position - other.v_position).abs();
        if vpos > options.max_text_vertical_position_error {
            differ(format!(
                "text vertical positions differ by {} (more than the allowed difference of {})",
                vpos, options.max_text_vertical_position_error
            ));
        }

        if self.v_align != other.v_align {
            differ("text vertical alignments differ".into());
        }
        if self.z_position != other.z_position {
            differ("text Z positions differ".into());
        }
        if self.variable_z_positions != other.variable_z_positions {
            differ("text variable Z positions differ".into());
        }
        if self.fade_up_time != other.fade_up_time {
            differ("text fade-up times differ".into());
        }
        if self.fade_down_time != other.fade_down_time {
            differ("text fade-down times differ".into());
        }

        same
    }
}

// ============================================================================
// TextString
// ============================================================================

/// A styled run of glyphs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextString {
    /// Timing and placement.
    pub common: TextCommon,
    /// Load id of the font, if one was given.
    pub font: Option<String>,
    /// Italic.
    pub italic: bool,
    /// Bold.
    pub bold: bool,
    /// Underlined.
    pub underline: bool,
    /// Glyph colour.
    pub colour: Color,
    /// Size in points, assuming an 11 inch high screen.
    pub size: i32,
    aspect_adjust: f32,
    /// Writing direction.
    pub direction: Direction,
    /// The text.
    pub text: String,
    /// Decoration.
    pub effect: Effect,
    /// Decoration colour.
    pub effect_colour: Color,
    /// Space before the run, in ems.
    pub space_before: f32,
    /// Annotations.
    pub rubies: Vec<Ruby>,
}

impl TextString {
    /// Smallest allowed aspect adjustment.
    pub const MIN_ASPECT_ADJUST: f32 = 0.25;
    /// Largest allowed aspect adjustment.
    pub const MAX_ASPECT_ADJUST: f32 = 4.0;

    /// Creates a run in white 42 point upright glyphs.
    ///
    /// ```rust
    /// use dcp_text::{TextCommon, TextString, Time};
    ///
    /// let mut s = TextString::new(
    ///     TextCommon::new(Time::new(0, 0, 1, 0, 24), Time::new(0, 0, 2, 0, 24)),
    ///     "Hello",
    /// );
    /// s.set_aspect_adjust(9.0);
    /// assert_eq!(s.aspect_adjust(), 4.0);
    /// assert_eq!(s.size_in_pixels(1080), 57);
    /// ```
    pub fn new(common: TextCommon, text: impl Into<String>) -> Self {
        Self {
            common,
            font: None,
            italic: false,
            bold: false,
            underline: false,
            colour: Color::WHITE,
            size: 42,
            aspect_adjust: 1.0,
            direction: Direction::Ltr,
            text: text.into(),
            effect: Effect::None,
            effect_colour: Color::BLACK,
            space_before: 0.0,
            rubies: Vec::new(),
        }
    }

    /// Horizontal glyph scaling.
    pub fn aspect_adjust(&self) -> f32 {
        self.aspect_adjust
    }

    /// Sets the glyph scaling, clamped to
    /// [`MIN_ASPECT_ADJUST`](Self::MIN_ASPECT_ADJUST)..=[`MAX_ASPECT_ADJUST`](Self::MAX_ASPECT_ADJUST).
    pub fn set_aspect_adjust(&mut self, aspect_adjust: f32) {
        self.aspect_adjust = aspect_adjust.clamp(Self::MIN_ASPECT_ADJUST, Self::MAX_ASPECT_ADJUST);
    }

    /// Font size in pixels on a screen `screen_height` pixels high.
    pub fn size_in_pixels(&self, screen_height: i32) -> i32 {
        // Points are 1/72 inch; the screen is taken to be 11 inches high.
        self.size * screen_height / (11 * 72)
    }

    fn equals_string(&self, other: &TextString, note: NoteHandler<'_>) -> bool {
        let mut same = true;
        let mut differ = |what: String| {
            note(NoteType::Error, what);
            same = false;
        };
        let flag = |b: bool| if b { "true" } else { "false" };

        if self.font != other.font {
            differ(format!(
                "subtitle font differs: {} vs {}",
                self.font.as_deref().unwrap_or("[none]"),
                other.font.as_deref().unwrap_or("[none]")
            ));
        }
        if self.italic != other.italic {
            differ(format!("subtitle italic flag differs: {} vs {}", flag(self.italic), flag(other.italic)));
        }
        if self.bold != other.bold {
            differ(format!("subtitle bold flag differs: {} vs {}", flag(self.bold), flag(other.bold)));
        }
        if self.underline != other.underline {
            differ(format!(
                "subtitle underline flag differs: {} vs {}",
                flag(self.underline),
                flag(other.underline)
            ));
        }
        if self.colour != other.colour {
            differ(format!(
                "subtitle colour differs: {} vs {}",
                self.colour.to_rgb_string(),
                other.colour.to_rgb_string()
            ));
        }
        if self.size != other.size {
            differ(format!("subtitle size differs: {} vs {}", self.size, other.size));
        }
        if self.aspect_adjust != other.aspect_adjust {
            differ(format!(
                "subtitle aspect_adjust differs: {} vs {}",
                self.aspect_adjust, other.aspect_adjust
            ));
        }
        if self.direction != other.direction {
            differ(format!("subtitle direction differs: {} vs {}", self.direction, other.direction));
        }
        if self.text != other.text {
            differ(format!("subtitle text differs: {} vs {}", self.text, other.text));
        }
        if self.effect != other.effect {
            differ(format!("subtitle effect differs: {} vs {}", self.effect, other.effect));
        }
        if self.effect_colour != other.effect_colour {
            differ(format!(
                "subtitle effect colour differs: {} vs {}",
                self.effect_colour.to_rgb_string(),
                other.effect_colour.to_rgb_string()
            ));
        }
        if self.space_before != other.space_before {
            differ(format!(
                "subtitle space before differs: {} vs {}",
                self.space_before, other.space_before
            ));
        }
        if self.rubies != other.rubies {
            differ("rubies differ".into());
        }

        same
    }
}

// ============================================================================
// TextImage
// ============================================================================

/// A PNG bitmap shown as a subtitle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextImage {
    /// Timing and placement.
    pub common: TextCommon,
    png_image: Vec<u8>,
    id: String,
    file: Option<PathBuf>,
}

impl TextImage {
    /// Creates an image with a fresh random id.
    pub fn new(png_image: Vec<u8>, common: TextCommon) -> Self {
        Self::with_id(png_image, uuid::Uuid::new_v4().to_string(), common)
    }

    /// Creates an image with a known id.
    pub fn with_id(png_image: Vec<u8>, id: impl Into<String>, common: TextCommon) -> Self {
        Self {
            common,
            png_image,
            id: id.into(),
            file: None,
        }
    }

    /// Reads the PNG from a file, remembering where it came from.
    pub fn from_file(path: impl AsRef<Path>, id: impl Into<String>, common: TextCommon) -> Result<Self> {
        let mut image = Self::with_id(Vec::new(), id, common);
        image.read_png_file(path)?;
        Ok(image)
    }

    /// PNG bytes; empty if not yet loaded.
    pub fn png_image(&self) -> &[u8] {
        &self.png_image
    }

    /// Replaces the PNG bytes.
    pub fn set_png_image(&mut self, png: Vec<u8>) {
        self.png_image = png;
    }

    /// Resource id, a UUID string.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// File the PNG was last read from or written to.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Loads the PNG bytes from `path`.
    pub fn read_png_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.png_image = fs::read(path).map_err(|e| Error::file(path, e))?;
        self.file = Some(path.to_path_buf());
        debug!("Read {} byte text image {} from {}", self.png_image.len(), self.id, path.display());
        Ok(())
    }

    /// Writes the PNG bytes to `path`.
    pub fn write_png_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.png_image).map_err(|e| Error::file(path, e))?;
        self.file = Some(path.to_path_buf());
        Ok(())
    }

    fn equals_image(&self, other: &TextImage, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        if self.png_image == other.png_image {
            return true;
        }

        note(NoteType::Error, "text image PNG data differs".into());
        if options.export_differing_texts {
            for (suffix, png) in [("A", &self.png_image), ("B", &other.png_image)] {
                let name = format!("dcpdiff_text_{}.png", suffix);
                if Path::new(&name).exists() {
                    note(NoteType::Error, format!("could not export text as {} already exists", name));
                } else if let Err(e) = fs::write(&name, png) {
                    note(NoteType::Error, format!("could not export text as {}: {}", name, e));
                }
            }
        }
        false
    }
}

// ============================================================================
// Text
// ============================================================================

/// A text event held by an asset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Text {
    /// A run of glyphs.
    String(TextString),
    /// A bitmap.
    Image(TextImage),
}

impl Text {
    /// Timing and placement.
    pub fn common(&self) -> &TextCommon {
        match self {
            Text::String(s) => &s.common,
            Text::Image(i) => &i.common,
        }
    }

    /// Mutable timing and placement.
    pub fn common_mut(&mut self) -> &mut TextCommon {
        match self {
            Text::String(s) => &mut s.common,
            Text::Image(i) => &mut i.common,
        }
    }

    /// Start time.
    pub fn time_in(&self) -> Time {
        self.common().time_in
    }

    /// End time.
    pub fn time_out(&self) -> Time {
        self.common().time_out
    }

    /// The glyph run, if this is one.
    pub fn as_string(&self) -> Option<&TextString> {
        match self {
            Text::String(s) => Some(s),
            Text::Image(_) => None,
        }
    }

    /// The bitmap, if this is one.
    pub fn as_image(&self) -> Option<&TextImage> {
        match self {
            Text::Image(i) => Some(i),
            Text::String(_) => None,
        }
    }

    /// Compares two events, reporting differences through `note`.
    ///
    /// Placement is compared first; if it differs the content is not
    /// examined.
    pub fn equals(&self, other: &Text, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        if !self.common().equals(other.common(), options, note) {
            return false;
        }

        match (self, other) {
            (Text::String(a), Text::String(b)) => a.equals_string(b, note),
            (Text::Image(a), Text::Image(b)) => a.equals_image(b, options, note),
            (Text::String(_), Text::Image(_)) => {
                note(NoteType::Error, "Subtitle types differ: string vs image".into());
                false
            }
            (Text::Image(_), Text::String(_)) => {
                note(NoteType::Error, "Text types differ: string vs image".into());
                false
            }
        }
    }
}

impl From<TextString> for Text {
    fn from(s: TextString) -> Self {
        Text::String(s)
    }
}

impl From<TextImage> for Text {
    fn from(i: TextImage) -> Self {
        Text::Image(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common() -> TextCommon {
        TextCommon::new(Time::new(0, 0, 1, 0, 24), Time::new(0, 0, 3, 0, 24))
    }

    fn collect(a: &Text, b: &Text, options: &EqualityOptions) -> (bool, Vec<String>) {
        let mut notes = Vec::new();
        let mut handler = |_: NoteType, msg: String| notes.push(msg);
        let same = a.equals(b, options, &mut handler);
        (same, notes)
    }

    #[test]
    fn test_aspect_adjust_clamped() {
        let mut s = TextString::new(common(), "x");
        s.set_aspect_adjust(0.1);
        assert_eq!(s.aspect_adjust(), 0.25);
        s.set_aspect_adjust(1.5);
        assert_eq!(s.aspect_adjust(), 1.5);
    }

    #[test]
    fn test_size_in_pixels() {
        let mut s = TextString::new(common(), "x");
        s.size = 72;
        assert_eq!(s.size_in_pixels(1584), 144);
    }

    #[test]
    fn test_equal_strings() {
        let a = Text::from(TextString::new(common(), "Hello"));
        let (same, notes) = collect(&a, &a.clone(), &EqualityOptions::default());
        assert!(same);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_string_differences_all_reported() {
        let a = TextString::new(common(), "Hello");
        let mut b = a.clone();
        b.italic = true;
        b.colour = Color::new(255, 0, 0);
        b.font = Some("f".into());

        let (same, notes) = collect(&a.into(), &b.into(), &EqualityOptions::default());
        assert!(!same);
        assert_eq!(
            notes,
            vec![
                "subtitle font differs: [none] vs f".to_string(),
                "subtitle italic flag differs: false vs true".to_string(),
                "subtitle colour differs: FFFFFF vs FF0000".to_string(),
            ]
        );
    }

    #[test]
    fn test_vertical_tolerance() {
        let a = TextString::new(common(), "Hello");
        let mut b = a.clone();
        b.common.v_position = 0.05;

        let strict = EqualityOptions::default();
        let (same, notes) = collect(&a.clone().into(), &b.clone().into(), &strict);
        assert!(!same);
        assert!(notes[0].starts_with("text vertical positions differ by"), "{}", notes[0]);

        let loose = EqualityOptions {
            max_text_vertical_position_error: 0.1,
            ..Default::default()
        };
        let (same, _) = collect(&a.into(), &b.into(), &loose);
        assert!(same);
    }

    #[test]
    fn test_placement_checked_before_content() {
        let a = TextString::new(common(), "Hello");
        let mut b = TextString::new(common(), "Goodbye");
        b.common.time_out = Time::new(0, 0, 4, 0, 24);

        let (same, notes) = collect(&a.into(), &b.into(), &EqualityOptions::default());
        assert!(!same);
        assert_eq!(notes, vec!["text out times differ".to_string()]);
    }

    #[test]
    fn test_string_vs_image() {
        let a = Text::from(TextString::new(common(), "Hello"));
        let b = Text::from(TextImage::new(vec![1, 2, 3], common()));
        let (same, notes) = collect(&a, &b, &EqualityOptions::default());
        assert!(!same);
        assert_eq!(notes, vec!["Subtitle types differ: string vs image".to_string()]);
    }

    #[test]
    fn test_image_png_differs() {
        let a = TextImage::with_id(vec![1, 2, 3], "id", common());
        let b = TextImage::with_id(vec![1, 2, 4], "id", common());
        let (same, notes) = collect(&a.into(), &b.into(), &EqualityOptions::default());
        assert!(!same);
        assert_eq!(notes, vec!["text image PNG data differs".to_string()]);
    }

    #[test]
    fn test_image_ids_are_unique() {
        let a = TextImage::new(Vec::new(), common());
        let b = TextImage::new(Vec::new(), common());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 36);
    }

    #[test]
    fn test_png_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");

        let mut a = TextImage::new(vec![0x89, b'P', b'N', b'G'], common());
        a.write_png_file(&path).unwrap();
        assert_eq!(a.file(), Some(path.as_path()));

        let b = TextImage::from_file(&path, a.id(), common()).unwrap();
        assert_eq!(b.png_image(), a.png_image());

        let missing = TextImage::from_file(dir.path().join("nope.png"), "x", common());
        assert!(matches!(missing, Err(Error::File { .. })));
    }
}
