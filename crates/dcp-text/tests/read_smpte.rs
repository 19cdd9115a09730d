//! Reading and rewriting SMPTE subtitle documents.

use std::path::PathBuf;

use approx::assert_relative_eq;
use dcp_core::{EqualityOptions, NoteType};
use dcp_text::prelude::*;
use dcp_text::SubtitleStandard;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn read_metadata() {
    let doc = SmpteTextAsset::from_file(data("smpte1.xml")).unwrap();

    assert_eq!(doc.xml_id(), "8b48f6ae-c74b-4b80-b994-a8236bbbad74");
    assert_eq!(doc.content_title_text(), "Test");
    assert_eq!(doc.annotation_text(), Some("Test annotation"));
    assert_eq!(doc.issue_date(), "2016-04-01T03:52:00.000+00:00");
    assert_eq!(doc.reel_number(), Some(1));
    assert_eq!(doc.language(), Some("de-de"));
    assert_eq!(doc.edit_rate(), Fraction::new(25, 1));
    assert_eq!(doc.time_code_rate(), 25);
    assert_eq!(doc.start_time(), Some(Time::new(0, 0, 0, 0, 25)));
    assert_eq!(doc.subtitle_standard(), SubtitleStandard::Smpte2010);

    let fonts = doc.load_font_nodes();
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].id, "theFontId");
    assert_eq!(fonts[0].urn, "3dec6dc0-39d0-498d-97d0-928d2eb78391");

    assert_eq!(doc.intrinsic_duration(), 150);
}

#[test]
fn read_texts() {
    let doc = SmpteTextAsset::from_file(data("smpte1.xml")).unwrap();
    let texts = doc.asset().texts();
    assert_eq!(texts.len(), 3);

    let hello = texts[0].as_string().unwrap();
    assert_eq!(hello.text, "Hello world");
    assert_eq!(hello.font.as_deref(), Some("theFontId"));
    assert_eq!(hello.size, 39);
    assert_eq!(hello.common.time_in, Time::new(0, 0, 3, 0, 25));
    assert_eq!(hello.common.time_out, Time::new(0, 0, 4, 10, 25));
    assert_eq!(hello.common.v_align, VAlign::Bottom);
    assert_relative_eq!(hello.common.v_position, 0.13, epsilon = 1e-6);
    assert_eq!(hello.direction, Direction::Ltr);

    let auf = texts[1].as_string().unwrap();
    assert_eq!(auf.text, "Auf");
    assert!(auf.italic);
    assert_eq!(auf.common.fade_up_time, Time::new(0, 0, 0, 2, 25));

    let wiedersehen = texts[2].as_string().unwrap();
    assert_eq!(wiedersehen.text, "Wiedersehen");
    assert!(!wiedersehen.italic);
    assert_relative_eq!(wiedersehen.space_before, 0.5);
    assert_eq!(wiedersehen.common.v_align, VAlign::Top);
}

#[test]
fn write_and_read_back() {
    let mut doc = SmpteTextAsset::from_file(data("smpte1.xml")).unwrap();
    doc.add_font("extra", vec![0, 1, 0, 0]);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reel.xml");
    doc.write(&out).unwrap();

    let xml = std::fs::read_to_string(&out).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dcst:SubtitleReel"), "{}", xml);
    assert!(xml.contains("<dcst:Space Size=\"0.5\"/>"), "{}", xml);
    assert!(xml.contains(r#"TimeOut="00:00:04:10""#), "{}", xml);

    let extra = &doc.load_font_nodes()[1];
    let font_file = dir.path().join(format!("{}.ttf", extra.urn));
    assert_eq!(std::fs::read(font_file).unwrap(), vec![0, 1, 0, 0]);

    let back = SmpteTextAsset::from_file(&out).unwrap();
    let mut notes = Vec::new();
    let mut handler = |kind: NoteType, message: String| notes.push((kind, message));
    assert!(doc.equals(&back, &EqualityOptions::default(), &mut handler), "{:?}", notes);
}

#[test]
fn standards_do_not_mix() {
    let interop = std::fs::read_to_string(data("subs1.xml")).unwrap();
    assert!(SmpteTextAsset::from_xml(&interop).is_err());

    let smpte = std::fs::read_to_string(data("smpte1.xml")).unwrap();
    assert!(InteropTextAsset::from_xml(&smpte).is_err());
}
