//! Interop `DCSubtitle` documents.
//!
//! An Interop subtitle asset is a plain XML file; bitmap subtitles live
//! beside it as `<id>.png` and fonts as the files named by `<LoadFont URI>`.

use std::fs;
use std::path::Path;

use dcp_core::{EqualityOptions, Error, NoteHandler, NoteType, Result, Standard};
use tracing::{debug, warn};

use crate::asset::{Font, TextAsset, TextDocument};
use crate::parse::parse_texts;
use crate::xml::Element;
use crate::Text;

/// Time code rate Interop documents are written at.
pub const INTEROP_TIME_CODE_RATE: i32 = 250;

/// A `<LoadFont Id URI>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropLoadFont {
    /// Load id.
    pub id: String,
    /// Font file name, relative to the document.
    pub uri: String,
}

/// An Interop subtitle document.
#[derive(Debug, Clone, PartialEq)]
pub struct InteropTextAsset {
    asset: TextAsset,
    id: String,
    movie_title: String,
    reel_number: String,
    language: String,
    load_font_nodes: Vec<InteropLoadFont>,
}

impl Default for InteropTextAsset {
    fn default() -> Self {
        Self::new()
    }
}

impl InteropTextAsset {
    /// Creates an empty document with a fresh id.
    pub fn new() -> Self {
        Self {
            asset: TextAsset::new(),
            id: uuid::Uuid::new_v4().to_string(),
            movie_title: String::new(),
            reel_number: "1".into(),
            language: String::new(),
            load_font_nodes: Vec::new(),
        }
    }

    /// Reads a document from XML text. Image data is left empty.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = Element::parse(xml)?;
        if root.local_name() != "DCSubtitle" {
            return Err(Error::Xml(format!(
                "unexpected root node {} (expected DCSubtitle)",
                root.name()
            )));
        }

        let load_font_nodes = root
            .children_named("LoadFont")
            .map(|e| -> Result<InteropLoadFont> {
                Ok(InteropLoadFont {
                    id: e.string_attribute("Id")?,
                    uri: e.string_attribute("URI")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut asset = TextAsset::new();
        parse_texts(&root, &["Font", "Subtitle"], Standard::Interop, None, asset.texts_mut())?;

        debug!("Read {} Interop texts", asset.texts().len());

        Ok(Self {
            asset,
            id: root.string_child("SubtitleID")?,
            movie_title: root.string_child("MovieTitle")?,
            reel_number: root.string_child("ReelNumber")?,
            language: root.string_child("Language")?,
            load_font_nodes,
        })
    }

    /// Reads a document and the PNGs beside it.
    ///
    /// Missing PNGs are logged and leave the image empty.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
        let mut doc = Self::from_xml(&xml)?;
        doc.asset.set_file(path);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        for text in doc.asset.texts_mut() {
            if let Text::Image(image) = text {
                let png = dir.join(format!("{}.png", image.id()));
                if png.exists() {
                    image.read_png_file(&png)?;
                } else {
                    warn!("Interop text image {} not found", png.display());
                }
            }
        }

        Ok(doc)
    }

    /// `SubtitleID`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sets `SubtitleID`.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// `MovieTitle`.
    pub fn movie_title(&self) -> &str {
        &self.movie_title
    }

    /// Sets `MovieTitle`.
    pub fn set_movie_title(&mut self, title: impl Into<String>) {
        self.movie_title = title.into();
    }

    /// `ReelNumber`.
    pub fn reel_number(&self) -> &str {
        &self.reel_number
    }

    /// Sets `ReelNumber`.
    pub fn set_reel_number(&mut self, reel_number: impl Into<String>) {
        self.reel_number = reel_number.into();
    }

    /// `Language`.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sets `Language`.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// `<LoadFont>` declarations.
    pub fn load_font_nodes(&self) -> &[InteropLoadFont] {
        &self.load_font_nodes
    }

    /// Points font `load_id` at an existing file.
    pub fn set_font_file(&mut self, load_id: &str, file: &Path) {
        for font in self.asset.fonts_mut() {
            if font.load_id == load_id {
                font.file = Some(file.to_path_buf());
            }
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        for node in &mut self.load_font_nodes {
            if node.id == load_id {
                node.uri = name.clone();
            }
        }
    }

    /// Compares two documents, reporting differences through `note`.
    pub fn equals(&self, other: &InteropTextAsset, options: &EqualityOptions, note: NoteHandler<'_>) -> bool {
        if !self.asset.equals(&other.asset, options, note) {
            return false;
        }

        if !options.load_font_nodes_can_differ && self.load_font_nodes != other.load_font_nodes {
            note(NoteType::Error, "<LoadFont> nodes differ".into());
            return false;
        }

        if self.movie_title != other.movie_title {
            note(NoteType::Error, "Subtitle movie titles differ".into());
            return false;
        }

        true
    }
}

impl TextDocument for InteropTextAsset {
    fn standard(&self) -> Standard {
        Standard::Interop
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
        let uri = format!("font_{}.ttf", self.load_font_nodes.len());
        self.asset.push_font(Font::new(load_id, data));
        self.load_font_nodes.push(InteropLoadFont {
            id: load_id.to_string(),
            uri,
        });
    }

    fn xml_root(&self) -> (Element, Vec<(&'static str, &'static str)>) {
        let mut root = Element::new("DCSubtitle");
        root.set_attribute("Version", "1.0");

        root.add_child("SubtitleID").add_text(&self.id);
        root.add_child("MovieTitle").add_text(&self.movie_title);
        root.add_child("ReelNumber").add_text(&self.reel_number);
        root.add_child("Language").add_text(&self.language);

        for node in &self.load_font_nodes {
            let load_font = root.add_child("LoadFont");
            load_font.set_attribute("Id", node.id.as_str());
            load_font.set_attribute("URI", node.uri.as_str());
        }

        self.asset
            .texts_as_xml(&mut root, INTEROP_TIME_CODE_RATE, Standard::Interop, "");

        (root, Vec::new())
    }

    /// Writes the XML, then each image as `<id>.png` and each declared font
    /// to its URI, all in the same directory.
    fn write(&mut self, path: &Path) -> Result<()> {
        fs::write(path, self.xml_as_string()).map_err(|e| Error::file(path, e))?;
        self.asset.set_file(path);

        let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

        for text in self.asset.texts_mut() {
            if let Text::Image(image) = text {
                let png = dir.join(format!("{}.png", image.id()));
                image.write_png_file(png)?;
            }
        }

        for node in &self.load_font_nodes {
            let file = dir.join(&node.uri);
            if let Some(font) = self.asset.fonts_mut().iter_mut().find(|f| f.load_id == node.id) {
                fs::write(&file, &font.data).map_err(|e| Error::file(&file, e))?;
                font.file = Some(file);
            }
        }

        debug!("Wrote Interop subtitles to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Effect, TextCommon, TextString, Time, VAlign};

    fn hello() -> TextString {
        let mut s = TextString::new(
            TextCommon::new(Time::new(0, 4, 9, 229, 250), Time::new(0, 4, 11, 229, 250)),
            "Hello world",
        );
        s.font = Some("Frutiger".into());
        s.size = 48;
        s.common.v_align = VAlign::Top;
        s.common.v_position = 0.8;
        s.common.fade_up_time = Time::new(0, 0, 0, 0, 24);
        s.common.fade_down_time = Time::new(0, 0, 0, 0, 24);
        s
    }

    #[test]
    fn test_write_expected_xml() {
        let mut doc = InteropTextAsset::new();
        doc.set_id("a6c58cff-3e1e-4b38-acec-a42224475ef6");
        doc.set_movie_title("Test");
        doc.set_language("EN");
        doc.asset_mut().add(hello());

        let mut second = TextString::new(
            TextCommon::new(Time::new(5, 41, 0, 219, 250), Time::new(6, 12, 15, 219, 250)),
            "What's going on",
        );
        second.italic = true;
        second.bold = true;
        second.underline = true;
        second.colour = Color::new(128, 0, 64);
        second.size = 91;
        second.effect = Effect::Border;
        second.effect_colour = Color::new(1, 2, 3);
        second.common.v_align = VAlign::Bottom;
        second.common.v_position = 0.4;
        second.common.fade_up_time = Time::new(1, 2, 3, 4, 24);
        second.common.fade_down_time = Time::new(5, 6, 7, 8, 24);
        doc.asset_mut().add(second);

        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<DCSubtitle Version="1.0">
  <SubtitleID>a6c58cff-3e1e-4b38-acec-a42224475ef6</SubtitleID>
  <MovieTitle>Test</MovieTitle>
  <ReelNumber>1</ReelNumber>
  <Language>EN</Language>
  <Font AspectAdjust="1.0" Color="FFFFFFFF" Effect="none" EffectColor="FF000000" Id="Frutiger" Italic="no" Script="normal" Size="48" Underlined="no" Weight="normal">
    <Subtitle SpotNumber="1" TimeIn="00:04:09:229" TimeOut="00:04:11:229" FadeUpTime="0" FadeDownTime="0">
      <Text VAlign="top" VPosition="80">Hello world</Text>
    </Subtitle>
  </Font>
  <Font AspectAdjust="1.0" Color="FF800040" Effect="border" EffectColor="FF010203" Italic="yes" Script="normal" Size="91" Underlined="yes" Weight="bold">
    <Subtitle SpotNumber="2" TimeIn="05:41:00:219" TimeOut="06:12:15:219" FadeUpTime="930792" FadeDownTime="4591834">
      <Text VAlign="bottom" VPosition="40">What's going on</Text>
    </Subtitle>
  </Font>
</DCSubtitle>
"#;
        assert_eq!(doc.xml_as_string(), expected);
    }

    #[test]
    fn test_negative_h_position() {
        let mut doc = InteropTextAsset::new();
        let mut s = hello();
        s.common.h_position = -0.2;
        doc.asset_mut().add(s);
        let xml = doc.xml_as_string();
        assert!(xml.contains(r#"<Text HPosition="-20" VAlign="top" VPosition="80">"#), "{}", xml);
    }

    #[test]
    fn test_add_font_uris() {
        let mut doc = InteropTextAsset::new();
        doc.add_font("a", vec![1]);
        doc.add_font("b", vec![2]);
        doc.ensure_font("a", vec![9]);
        assert_eq!(doc.load_font_nodes()[0].uri, "font_0.ttf");
        assert_eq!(doc.load_font_nodes()[1].uri, "font_1.ttf");
        assert_eq!(doc.asset().fonts().len(), 2);
        assert_eq!(doc.asset().font_data()["a"], vec![1]);
    }

    #[test]
    fn test_fix_empty_font_ids() {
        let mut doc = InteropTextAsset::new();
        doc.add_font("font0", vec![1]);
        doc.add_font("", vec![2]);
        let mut s = hello();
        s.font = Some(String::new());
        doc.asset_mut().add(s);
        doc.asset_mut().add(hello());

        doc.fix_empty_font_ids();

        assert_eq!(doc.load_font_ids(), vec!["font0".to_string(), "font1".to_string()]);
        let fonts: Vec<_> = doc
            .asset()
            .texts()
            .iter()
            .map(|t| t.as_string().unwrap().font.clone())
            .collect();
        assert_eq!(fonts, vec![Some("font1".to_string()), Some("Frutiger".to_string())]);
    }

    #[test]
    fn test_equals_movie_title_and_fonts() {
        let mut a = InteropTextAsset::new();
        a.asset_mut().add(hello());
        let mut b = a.clone();
        b.set_movie_title("Other");
        b.add_font("x", vec![]);
        a.add_font("y", vec![]);

        let mut notes = Vec::new();
        let mut handler = |_: NoteType, m: String| notes.push(m);
        assert!(!a.equals(&b, &EqualityOptions::default(), &mut handler));

        let lenient = EqualityOptions {
            load_font_nodes_can_differ: true,
            ..Default::default()
        };
        assert!(!a.equals(&b, &lenient, &mut handler));
        b.set_movie_title("");
        assert!(a.equals(&b, &lenient, &mut handler));

        assert_eq!(
            notes,
            vec!["<LoadFont> nodes differ".to_string(), "Subtitle movie titles differ".to_string()]
        );
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            InteropTextAsset::from_xml("<SubtitleReel/>"),
            Err(Error::Xml(_))
        ));
    }
}
