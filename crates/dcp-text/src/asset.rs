//! Behaviour shared by Interop and SMPTE text assets.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dcp_core::{EqualityOptions, NoteHandler, NoteType, Result, Standard};
use tracing::debug;

use crate::order;
use crate::xml::{Element, format_xml};
use crate::{Text, Time, VAlign};

/// Font bytes referenced by a `<LoadFont>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Id used by `<Font>` elements to refer to this font.
    pub load_id: String,
    /// TrueType data.
    pub data: Vec<u8>,
    /// Where the data was last written.
    pub file: Option<PathBuf>,
}

impl Font {
    /// Creates a font that has not been written anywhere.
    pub fn new(load_id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            load_id: load_id.into(),
            data,
            file: None,
        }
    }
}

/// Order in which texts are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// By start time; among texts starting together, bottom-aligned ones
    /// by descending position and others by ascending position, so lines
    /// come out top to bottom.
    ///
    /// Each text's key follows its own alignment. Ordering by the first
    /// text's alignment alone would not be a total order when bottom- and
    /// top-aligned texts start together; there the two can differ.
    #[default]
    Stacked,
    /// By start time, then ascending vertical position whatever the
    /// alignment.
    VerticalPosition,
}

impl SortOrder {
    /// Compares two texts.
    pub fn compare(&self, a: &Text, b: &Text) -> Ordering {
        let key = |t: &Text| {
            let c = t.common();
            match self {
                SortOrder::Stacked if c.v_align == VAlign::Bottom => -c.v_position,
                _ => c.v_position,
            }
        };
        a.time_in()
            .cmp(&b.time_in())
            .then_with(|| key(a).total_cmp(&key(b)))
    }
}

/// The text events and fonts of an asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAsset {
    texts: Vec<Text>,
    fonts: Vec<Font>,
    file: Option<PathBuf>,
    sort_order: SortOrder,
}

impl TextAsset {
    /// Creates an empty asset.
    pub fn new() -> Self {
        Self::default()
    }

    /// All texts, in the order they were read or added.
    pub fn texts(&self) -> &[Text] {
        &self.texts
    }

    /// Mutable access to the texts.
    pub fn texts_mut(&mut self) -> &mut Vec<Text> {
        &mut self.texts
    }

    /// Adds a text.
    pub fn add(&mut self, text: impl Into<Text>) {
        self.texts.push(text.into());
    }

    /// Texts between `from` and `to`.
    ///
    /// With `starting`, texts that start in `[from, to)`; otherwise texts
    /// that are on screen at any point in `[from, to]`.
    pub fn texts_during(&self, from: Time, to: Time, starting: bool) -> Vec<&Text> {
        self.texts
            .iter()
            .filter(|t| {
                let (time_in, time_out) = (t.time_in(), t.time_out());
                if starting {
                    from <= time_in && time_in < to
                } else {
                    time_out >= from && time_in <= to
                }
            })
            .collect()
    }

    /// Latest end time of any text, or zero.
    pub fn latest_text_out(&self) -> Time {
        self.texts
            .iter()
            .map(Text::time_out)
            .fold(Time::default(), |latest, t| if t > latest { t } else { latest })
    }

    /// Fonts held by the asset.
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    pub(crate) fn push_font(&mut self, font: Font) {
        self.fonts.push(font);
    }

    pub(crate) fn fonts_mut(&mut self) -> &mut [Font] {
        &mut self.fonts
    }

    /// Font data by load id.
    pub fn font_data(&self) -> BTreeMap<String, Vec<u8>> {
        self.fonts
            .iter()
            .map(|f| (f.load_id.clone(), f.data.clone()))
            .collect()
    }

    /// Font files by load id, for fonts that have been written.
    pub fn font_filenames(&self) -> BTreeMap<String, PathBuf> {
        self.fonts
            .iter()
            .filter_map(|f| f.file.clone().map(|file| (f.load_id.clone(), file)))
            .collect()
    }

    /// File the asset was read from or last written to.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Sets the asset's file.
    pub fn set_file(&mut self, file: impl Into<PathBuf>) {
        self.file = Some(file.into());
    }

    /// Order used when writing.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Sets the order used when writing.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    /// Compares texts pairwise, stopping at the first difference.
    pub fn equals(&self, other: &TextAsset, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        if self.texts.len() != other.texts.len() {
            note(
                NoteType::Error,
                format!(
                    "different number of texts: {} vs {}",
                    self.texts.len(),
                    other.texts.len()
                ),
            );
            return false;
        }

        for (a, b) in self.texts.iter().zip(&other.texts) {
            if std::mem::discriminant(a) != std::mem::discriminant(b) {
                note(NoteType::Error, "texts differ: string vs. image".into());
                return false;
            }
            if !a.equals(b, options, note) {
                return false;
            }
        }

        true
    }

    /// Points texts using font `from` at `to` instead.
    pub(crate) fn rename_text_fonts(&mut self, from: &str, to: &str) {
        for text in &mut self.texts {
            match text {
                Text::String(s) if s.font.as_deref() == Some(from) => s.font = Some(to.to_string()),
                _ => {}
            }
        }
    }

    /// Writes the texts as `<Font>`/`<Subtitle>` children of `root`.
    ///
    /// Times are rebased to `time_code_rate`; `prefix` is put on every
    /// element name.
    pub fn texts_as_xml(&self, root: &mut Element, time_code_rate: i32, standard: Standard, prefix: &str) {
        let mut sorted: Vec<&Text> = self.texts.iter().collect();
        sorted.sort_by(|a, b| self.sort_order.compare(a, b));

        let mut tree = order::build(&sorted, standard);
        order::pull_fonts(&mut tree, true);

        let mut context = order::Context::new(time_code_rate, standard, prefix);
        tree.write_xml(root, &mut context);

        debug!(
            "Wrote {} texts in {} subtitles",
            self.texts.len(),
            context.spot_number - 1
        );
    }
}

/// The first of `base0`, `base1`, ... not in `existing`.
///
/// ```rust
/// use dcp_text::unique_string;
///
/// let existing = vec!["font0".to_string(), "font2".to_string()];
/// assert_eq!(unique_string(&existing, "font"), "font1");
/// ```
pub fn unique_string(existing: &[String], base: &str) -> String {
    let mut i = 0;
    loop {
        let trial = format!("{}{}", base, i);
        if !existing.contains(&trial) {
            return trial;
        }
        i += 1;
    }
}

/// A complete text document in one of the two dialects.
pub trait TextDocument {
    /// Dialect.
    fn standard(&self) -> Standard;

    /// Texts and fonts.
    fn asset(&self) -> &TextAsset;

    /// Mutable texts and fonts.
    fn asset_mut(&mut self) -> &mut TextAsset;

    /// Ids of the `<LoadFont>` declarations, in order.
    fn load_font_ids(&self) -> Vec<String>;

    /// Renames `<LoadFont>` declarations with id `from`.
    fn rename_load_fonts(&mut self, from: &str, to: &str);

    /// Adds font data and declares it with a `<LoadFont>`.
    fn add_font(&mut self, load_id: &str, data: Vec<u8>);

    /// Document root and the namespaces declared on it.
    fn xml_root(&self) -> (Element, Vec<(&'static str, &'static str)>);

    /// Writes the document, and any files it refers to, beside `path`.
    fn write(&mut self, path: &Path) -> Result<()>;

    /// The document as indented XML.
    fn xml_as_string(&self) -> String {
        let (root, namespaces) = self.xml_root();
        format_xml(&root, &namespaces)
    }

    /// The document as compact XML.
    fn xml_as_compact_string(&self) -> Result<String> {
        let (root, namespaces) = self.xml_root();
        root.to_xml_string(&namespaces)
    }

    /// Adds a font unless one with `load_id` is already held.
    fn ensure_font(&mut self, load_id: &str, data: Vec<u8>) {
        if !self.asset().fonts().iter().any(|f| f.load_id == load_id) {
            self.add_font(load_id, data);
        }
    }

    /// Gives empty `<LoadFont>` ids, and the texts that use them, a
    /// generated id such as `font0`.
    fn fix_empty_font_ids(&mut self) {
        let ids = self.load_font_ids();
        if !ids.iter().any(String::is_empty) {
            return;
        }

        let named: Vec<String> = ids.into_iter().filter(|id| !id.is_empty()).collect();
        let replacement = unique_string(&named, "font");
        debug!("Replacing empty font ids with {}", replacement);

        self.rename_load_fonts("", &replacement);
        self.asset_mut().rename_text_fonts("", &replacement);
    }
}
