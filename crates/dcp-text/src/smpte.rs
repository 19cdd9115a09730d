//! SMPTE ST 428-7 `SubtitleReel` documents.
//!
//! Only the XML document is handled here; wrapping it in MXF is left to the
//! container layer. When a document is read from a file, bitmap subtitles
//! are loaded from `<id>.png` beside it.

use std::fs;
use std::path::Path;

use dcp_core::{EqualityOptions, Error, NoteHandler, NoteType, Result, Standard};
use tracing::debug;

use crate::asset::{Font, TextAsset, TextDocument};
use crate::parse::parse_texts;
use crate::xml::Element;
use crate::{Fraction, Text, Time};

const XML_SCHEMA_NS: &str = "http://www.w3.org/2001/XMLSchema";
const PREFIX: &str = "dcst:";
const URN_UUID: &str = "urn:uuid:";

/// Schema version of a `SubtitleReel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubtitleStandard {
    /// SMPTE ST 428-7:2010.
    Smpte2010,
    /// SMPTE ST 428-7:2014.
    #[default]
    Smpte2014,
}

impl SubtitleStandard {
    /// Namespace URI.
    pub const fn namespace(&self) -> &'static str {
        match self {
            SubtitleStandard::Smpte2010 => "http://www.smpte-ra.org/schemas/428-7/2010/DCST",
            SubtitleStandard::Smpte2014 => "http://www.smpte-ra.org/schemas/428-7/2014/DCST",
        }
    }

    fn from_root(root: &Element) -> Self {
        let is_2014 = root
            .attributes()
            .iter()
            .any(|(k, v)| k.starts_with("xmlns") && v == SubtitleStandard::Smpte2014.namespace());
        if is_2014 {
            SubtitleStandard::Smpte2014
        } else {
            SubtitleStandard::Smpte2010
        }
    }
}

/// A `<LoadFont ID>urn:uuid:...</LoadFont>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmpteLoadFont {
    /// Load id.
    pub id: String,
    /// Resource UUID of the font, without `urn:uuid:`.
    pub urn: String,
}

/// A SMPTE subtitle document.
#[derive(Debug, Clone, PartialEq)]
pub struct SmpteTextAsset {
    asset: TextAsset,
    xml_id: String,
    content_title_text: String,
    annotation_text: Option<String>,
    issue_date: String,
    reel_number: Option<i32>,
    language: Option<String>,
    edit_rate: Fraction,
    time_code_rate: i32,
    start_time: Option<Time>,
    load_font_nodes: Vec<SmpteLoadFont>,
    subtitle_standard: SubtitleStandard,
}

impl Default for SmpteTextAsset {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_urn(s: &str) -> String {
    s.trim().strip_prefix(URN_UUID).unwrap_or(s.trim()).to_string()
}

impl SmpteTextAsset {
    /// Creates an empty 24 fps document with a fresh id.
    pub fn new() -> Self {
        Self {
            asset: TextAsset::new(),
            xml_id: uuid::Uuid::new_v4().to_string(),
            content_title_text: String::new(),
            annotation_text: None,
            issue_date: String::new(),
            reel_number: None,
            language: None,
            edit_rate: Fraction::new(24, 1),
            time_code_rate: 24,
            start_time: None,
            load_font_nodes: Vec::new(),
            subtitle_standard: SubtitleStandard::default(),
        }
    }

    /// Reads a document from XML text. Image data is left empty.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        if root.local_name() != "SubtitleReel" {
            return Err(Error::Xml(format!(
                "unexpected root node {} (expected SubtitleReel)",
                root.name()
            )));
        }

        let time_code_rate: i32 = root
            .string_child("TimeCodeRate")?
            .trim()
            .parse()
            .map_err(|_| Error::Xml("malformed TimeCodeRate".into()))?;
        if time_code_rate <= 0 {
            return Err(Error::Xml(format!("bad TimeCodeRate {}", time_code_rate)));
        }

        let reel_number = root
            .optional_string_child("ReelNumber")
            .map(|r| {
                r.trim()
                    .parse::<i32>()
                    .map_err(|_| Error::Xml(format!("malformed ReelNumber {}", r)))
            })
            .transpose()?;

        let start_time = root
            .optional_string_child("StartTime")
            .map(|t| Time::parse(&t, Some(time_code_rate)))
            .transpose()?;

        let load_font_nodes = root
            .children_named("LoadFont")
            .map(|e| -> Result<SmpteLoadFont> {
                Ok(SmpteLoadFont {
                    id: e.string_attribute("ID")?,
                    urn: strip_urn(&e.text_content()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut asset = TextAsset::new();
        parse_texts(
            &root,
            &["SubtitleList"],
            Standard::Smpte,
            Some(time_code_rate),
            asset.texts_mut(),
        )?;

        debug!("Read {} SMPTE texts", asset.texts().len());

        Ok(Self {
            asset,
            xml_id: strip_urn(&root.string_child("Id")?),
            content_title_text: root.string_child("ContentTitleText")?,
            annotation_text: root.optional_string_child("AnnotationText"),
            issue_date: root.string_child("IssueDate")?,
            reel_number,
            language: root.optional_string_child("Language"),
            edit_rate: root.string_child("EditRate")?.trim().parse()?,
            time_code_rate,
            start_time,
            load_font_nodes,
            subtitle_standard: SubtitleStandard::from_root(&root),
        })
    }

    /// Reads a document and the PNGs beside it.
    ///
    /// Fails with [`Error::MissingTextImage`] if an image has no PNG.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
        let mut doc = Self::from_xml(&xml)?;
        doc.asset.set_file(path);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for text in doc.asset.texts_mut() {
            if let Text::Image(image) = text {
                let png = dir.join(format!("{}.png", image.id()));
                if !png.exists() {
                    return Err(Error::MissingTextImage(image.id().to_string()));
                }
                image.read_png_file(&png)?;
            }
        }

        Ok(doc)
    }

    /// Id written as `urn:uuid:<id>`.
    pub fn xml_id(&self) -> &str {
        &self.xml_id
    }

    /// Sets the id.
    pub fn set_xml_id(&mut self, id: impl Into<String>) {
        self.xml_id = id.into();
    }

    /// `ContentTitleText`.
    pub fn content_title_text(&self) -> &str {
        &self.content_title_text
    }

    /// Sets `ContentTitleText`.
    pub fn set_content_title_text(&mut self, text: impl Into<String>) {
        self.content_title_text = text.into();
    }

    /// `AnnotationText`.
    pub fn annotation_text(&self) -> Option<&str> {
        self.annotation_text.as_deref()
    }

    /// Sets `AnnotationText`.
    pub fn set_annotation_text(&mut self, text: Option<String>) {
        self.annotation_text = text;
    }

    /// `IssueDate`, as written.
    pub fn issue_date(&self) -> &str {
        &self.issue_date
    }

    /// Sets `IssueDate`, e.g. `2024-05-01T12:00:00+00:00`.
    pub fn set_issue_date(&mut self, date: impl Into<String>) {
        self.issue_date = date.into();
    }

    /// `ReelNumber`.
    pub fn reel_number(&self) -> Option<i32> {
        self.reel_number
    }

    /// Sets `ReelNumber`.
    pub fn set_reel_number(&mut self, reel_number: Option<i32>) {
        self.reel_number = reel_number;
    }

    /// `Language`.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Sets `Language`.
    pub fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    /// `EditRate`.
    pub fn edit_rate(&self) -> Fraction {
        self.edit_rate
    }

    /// Sets `EditRate`.
    pub fn set_edit_rate(&mut self, edit_rate: Fraction) {
        self.edit_rate = edit_rate;
    }

    /// `TimeCodeRate`.
    pub fn time_code_rate(&self) -> i32 {
        self.time_code_rate
    }

    /// Sets `TimeCodeRate`; times are rebased to it when written.
    pub fn set_time_code_rate(&mut self, time_code_rate: i32) {
        self.time_code_rate = time_code_rate;
    }

    /// `StartTime`.
    pub fn start_time(&self) -> Option<Time> {
        self.start_time
    }

    /// Sets `StartTime`.
    pub fn set_start_time(&mut self, start_time: Option<Time>) {
        self.start_time = start_time;
    }

    /// Schema version.
    pub fn subtitle_standard(&self) -> SubtitleStandard {
        self.subtitle_standard
    }

    /// Sets the schema version.
    pub fn set_subtitle_standard(&mut self, standard: SubtitleStandard) {
        self.subtitle_standard = standard;
    }

    /// `<LoadFont>` declarations.
    pub fn load_font_nodes(&self) -> &[SmpteLoadFont] {
        &self.load_font_nodes
    }

    /// Length in edit units: the latest text end time at the edit rate.
    pub fn intrinsic_duration(&self) -> i64 {
        let frames_per_second = self.edit_rate.numerator / self.edit_rate.denominator.max(1);
        self.asset
            .latest_text_out()
            .as_editable_units_floor(frames_per_second)
    }

    /// Compares two documents, reporting differences through `note`.
    pub fn equals(&self, other: &SmpteTextAsset, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        if !self.asset.equals(&other.asset, options, note) {
            return false;
        }

        if !options.load_font_nodes_can_differ {
            let ours: Vec<&str> = self.load_font_nodes.iter().map(|n| n.id.as_str()).collect();
            let theirs: Vec<&str> = other.load_font_nodes.iter().map(|n| n.id.as_str()).collect();
            if ours != theirs {
                note(NoteType::Error, "<LoadFont> nodes differ".into());
                return false;
            }
        }

        if self.content_title_text != other.content_title_text {
            note(NoteType::Error, "Subtitle content title texts differ".into());
            return false;
        }

        if self.language != other.language {
            note(
                NoteType::Error,
                format!(
                    "Subtitle languages differ (`{}' vs `{}')",
                    self.language.as_deref().unwrap_or("[none]"),
                    other.language.as_deref().unwrap_or("[none]")
                ),
            );
            return false;
        }

        if self.annotation_text != other.annotation_text {
            note(NoteType::Error, "Subtitle annotation texts differ".into());
            return false;
        }

        if self.issue_date != other.issue_date {
            if options.issue_dates_can_differ {
                note(NoteType::Note, "Subtitle issue dates differ".into());
            } else {
                note(NoteType::Error, "Subtitle issue dates differ".into());
                return false;
            }
        }

        if self.reel_number != other.reel_number {
            note(NoteType::Error, "Subtitle reel numbers differ".into());
            return false;
        }

        if self.edit_rate != other.edit_rate {
            note(NoteType::Error, "Subtitle edit rates differ".into());
            return false;
        }

        if self.time_code_rate != other.time_code_rate {
            note(NoteType::Error, "Subtitle time code rates differ".into());
            return false;
        }

        if self.start_time != other.start_time {
            note(NoteType::Error, "Subtitle start times differ".into());
            return false;
        }

        true
    }
}

impl TextDocument for SmpteTextAsset {
    fn standard(&self) -> Standard {
        Standard::Smpte
    }

    fn asset(&self) -> &TextAsset {
        &self.asset
    }

    fn asset_mut(&mut self) -> &mut TextAsset {
        &mut self.asset
    }

    fn load_font_ids(&self) -> Vec<String> {
        self.load_font_nodes.iter().map(|n| n.id.clone()).collect()
    }

    fn rename_load_fonts(&mut self, from: &str, to: &str) {
        for node in &mut self.load_font_nodes {
            if node.id == from {
                node.id = to.to_string();
            }
        }
    }

    fn add_font(&mut self, load_id: &str, data: Vec<u8>) {
        self.asset.push_font(Font::new(load_id, data));
        self.load_font_nodes.push(SmpteLoadFont {
            id: load_id.to_string(),
            urn: uuid::Uuid::new_v4().to_string(),
        });
    }

    fn xml_root(&self) -> (Element, Vec<(&'static str, &'static str)>) {
        let name = |local: &str| format!("{}{}", PREFIX, local);
        let mut root = Element::new(name("SubtitleReel"));

        root.add_child(name("Id")).add_text(format!("{}{}", URN_UUID, self.xml_id));
        root.add_child(name("ContentTitleText")).add_text(&self.content_title_text);
        if let Some(annotation) = &self.annotation_text {
            root.add_child(name("AnnotationText")).add_text(annotation);
        }
        root.add_child(name("IssueDate")).add_text(&self.issue_date);
        if let Some(reel) = self.reel_number {
            root.add_child(name("ReelNumber")).add_text(reel.to_string());
        }
        if let Some(language) = &self.language {
            root.add_child(name("Language")).add_text(language);
        }
        root.add_child(name("EditRate")).add_text(self.edit_rate.as_string());
        root.add_child(name("TimeCodeRate")).add_text(self.time_code_rate.to_string());
        if let Some(start) = self.start_time {
            root.add_child(name("StartTime")).add_text(start.as_string(Standard::Smpte));
        }

        for node in &self.load_font_nodes {
            let load_font = root.add_child(name("LoadFont"));
            load_font.add_text(format!("{}{}", URN_UUID, node.urn));
            load_font.set_attribute("ID", node.id.as_str());
        }

        let list = root.add_child(name("SubtitleList"));
        self.asset
            .texts_as_xml(list, self.time_code_rate, Standard::Smpte, PREFIX);

        let namespaces = vec![
            ("dcst", self.subtitle_standard.namespace()),
            ("xs", XML_SCHEMA_NS),
        ];
        (root, namespaces)
    }

    /// Writes the XML, each image as `<id>.png` and each font as
    /// `<urn>.ttf`, all in the same directory.
    fn write(&mut self, path: &Path) -> Result<()> {
        fs::write(path, self.xml_as_string()).map_err(|e| Error::file(path, e))?;
        self.asset.set_file(path);

        let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

        for text in self.asset.texts_mut() {
            if let Text::Image(image) = text {
                image.write_png_file(dir.join(format!("{}.png", image.id())))?;
            }
        }

        for node in &self.load_font_nodes {
            let file = dir.join(format!("{}.ttf", node.urn));
            if let Some(font) = self.asset.fonts_mut().iter_mut().find(|f| f.load_id == node.id) {
                fs::write(&file, &font.data).map_err(|e| Error::file(&file, e))?;
                font.file = Some(file);
            }
        }

        debug!("Wrote SMPTE subtitles to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TextCommon, TextString, VariableZPosition};

    fn line(text: &str) -> TextString {
        let mut s = TextString::new(
            TextCommon::new(Time::new(0, 0, 1, 0, 24), Time::new(0, 0, 2, 12, 24)),
            text,
        );
        s.font = Some("font".into());
        s
    }

    #[test]
    fn test_write_namespaced() {
        let mut doc = SmpteTextAsset::new();
        doc.set_xml_id("8b2f0c4e-0000-4000-8000-000000000001");
        doc.set_content_title_text("Title");
        doc.set_issue_date("2024-05-01T12:00:00+00:00");
        doc.add_font("font", vec![0; 4]);
        doc.asset_mut().add(line("Hello"));

        let xml = doc.xml_as_string();
        assert!(xml.contains(r#"<dcst:SubtitleReel xmlns:dcst="http://www.smpte-ra.org/schemas/428-7/2014/DCST" xmlns:xs="http://www.w3.org/2001/XMLSchema">"#), "{}", xml);
        assert!(xml.contains("<dcst:Id>urn:uuid:8b2f0c4e-0000-4000-8000-000000000001</dcst:Id>"), "{}", xml);
        assert!(xml.contains("<dcst:EditRate>24 1</dcst:EditRate>"), "{}", xml);
        assert!(xml.contains(r#"<dcst:Subtitle SpotNumber="1" TimeIn="00:00:01:00" TimeOut="00:00:02:12" FadeUpTime="00:00:00:00" FadeDownTime="00:00:00:00">"#), "{}", xml);
        assert!(xml.contains(r#"<dcst:Text Valign="center" Vposition="0">Hello</dcst:Text>"#), "{}", xml);
        assert!(xml.contains(r#"ID="font""#), "{}", xml);
    }

    #[test]
    fn test_round_trip_through_xml() {
        let mut doc = SmpteTextAsset::new();
        doc.set_content_title_text("Title");
        doc.set_language(Some("de".into()));
        doc.set_reel_number(Some(2));
        doc.set_start_time(Some(Time::new(10, 0, 0, 0, 24)));
        doc.set_subtitle_standard(SubtitleStandard::Smpte2010);
        doc.add_font("font", vec![]);

        let mut s = line("Tief");
        s.common.z_position = 0.05;
        s.common.variable_z_positions = vec![VariableZPosition::new(1.0, 12), VariableZPosition::new(2.5, 12)];
        doc.asset_mut().add(s);

        let back = SmpteTextAsset::from_xml(&doc.xml_as_compact_string().unwrap()).unwrap();
        assert_eq!(back.subtitle_standard(), SubtitleStandard::Smpte2010);
        assert_eq!(back.language(), Some("de"));
        assert_eq!(back.reel_number(), Some(2));
        assert_eq!(back.start_time(), Some(Time::new(10, 0, 0, 0, 24)));
        assert_eq!(back.load_font_nodes(), doc.load_font_nodes());

        let mut notes = Vec::new();
        let mut handler = |_: NoteType, m: String| notes.push(m);
        let same = doc.equals(&back, &EqualityOptions::default(), &mut handler);
        assert!(same, "{:?}", notes);
    }

    #[test]
    fn test_intrinsic_duration() {
        let mut doc = SmpteTextAsset::new();
        doc.set_edit_rate(Fraction::new(25, 1));
        doc.asset_mut().add(TextString::new(
            TextCommon::new(Time::new(0, 0, 0, 0, 24), Time::new(0, 0, 4, 12, 24)),
            "x",
        ));
        assert_eq!(doc.intrinsic_duration(), 112);
    }

    #[test]
    fn test_issue_dates_can_differ() {
        let mut a = SmpteTextAsset::new();
        a.set_issue_date("2024-01-01T00:00:00+00:00");
        let mut b = a.clone();
        b.set_issue_date("2025-01-01T00:00:00+00:00");

        let mut notes = Vec::new();
        let mut handler = |kind: NoteType, m: String| notes.push((kind, m));
        assert!(!a.equals(&b, &EqualityOptions::default(), &mut handler));
        let lenient = EqualityOptions {
            issue_dates_can_differ: true,
            ..Default::default()
        };
        assert!(a.equals(&b, &lenient, &mut handler));
        assert_eq!(notes[0].0, NoteType::Error);
        assert_eq!(notes[1], (NoteType::Note, "Subtitle issue dates differ".to_string()));
    }

    #[test]
    fn test_language_note() {
        let a = SmpteTextAsset::new();
        let mut b = a.clone();
        b.set_language(Some("fr".into()));

        let mut notes = Vec::new();
        let mut handler = |_: NoteType, m: String| notes.push(m);
        assert!(!a.equals(&b, &EqualityOptions::default(), &mut handler));
        assert_eq!(notes, vec!["Subtitle languages differ (`[none]' vs `fr')".to_string()]);
    }

    #[test]
    fn test_missing_image_on_file_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.xml");
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<SubtitleReel xmlns="http://www.smpte-ra.org/schemas/428-7/2010/DCST">
  <Id>urn:uuid:2e9b5a1c-1111-4222-8333-444455556666</Id>
  <ContentTitleText>T</ContentTitleText>
  <IssueDate>2024-01-01T00:00:00+00:00</IssueDate>
  <EditRate>24 1</EditRate>
  <TimeCodeRate>24</TimeCodeRate>
  <SubtitleList>
    <Subtitle SpotNumber="1" TimeIn="00:00:01:00" TimeOut="00:00:02:00">
      <Image Valign="bottom" Vposition="10">urn:uuid:0b3a0b6e-7777-4888-9999-aaaabbbbcccc</Image>
    </Subtitle>
  </SubtitleList>
</SubtitleReel>"#;
        fs::write(&path, xml).unwrap();

        match SmpteTextAsset::from_file(&path) {
            Err(Error::MissingTextImage(id)) => assert_eq!(id, "0b3a0b6e-7777-4888-9999-aaaabbbbcccc"),
            other => panic!("unexpected {:?}", other),
        }

        fs::write(dir.path().join("0b3a0b6e-7777-4888-9999-aaaabbbbcccc.png"), [0x89, b'P']).unwrap();
        let doc = SmpteTextAsset::from_file(&path).unwrap();
        assert_eq!(doc.subtitle_standard(), SubtitleStandard::Smpte2010);
        assert_eq!(doc.asset().texts()[0].as_image().unwrap().png_image(), &[0x89, b'P']);
    }
}
