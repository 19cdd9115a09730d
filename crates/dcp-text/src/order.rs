//! Serialization tree.
//!
//! Text events are grouped into `Subtitle` → `Text` → string leaves (images
//! sit directly under their `Subtitle`). Every leaf starts with the complete
//! set of font attributes it needs; [`pull_fonts`] then hoists attributes
//! shared by all children of a node into the node itself and wraps runs of
//! siblings with identical fonts in one `<Font>`, so the document does not
//! repeat the same attributes on every line.
//!
//! The tree is built for one write and dropped afterwards.

use std::collections::BTreeMap;

use dcp_core::Standard;

use crate::xml::{Element, format_general};
use crate::{
    Direction, HAlign, LoadVariableZ, Ruby, SPACE_BEFORE_EPSILON, TextString, Time,
    VAlign, VariableZPosition, ALIGN_EPSILON,
};

/// Settings for one write.
#[derive(Debug, Clone)]
pub struct Context {
    /// Rate times are rebased to.
    pub time_code_rate: i32,
    /// Dialect being written.
    pub standard: Standard,
    /// Next `SpotNumber`.
    pub spot_number: i32,
    /// Prefix put on element names, e.g. `"dcst:"`.
    pub prefix: String,
}

impl Context {
    /// Starts a write at spot number 1.
    pub fn new(time_code_rate: i32, standard: Standard, prefix: impl Into<String>) -> Self {
        Self {
            time_code_rate,
            standard,
            spot_number: 1,
            prefix: prefix.into(),
        }
    }

    fn name(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }
}

// ============================================================================
// Font
// ============================================================================

/// A set of `<Font>` attributes, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Font {
    values: BTreeMap<String, String>,
}

impl Font {
    /// Every font attribute needed to draw `s`.
    pub fn new(s: &TextString, standard: Standard) -> Self {
        let yes_no = |b: bool| (if b { "yes" } else { "no" }).to_string();
        let (id, underline) = match standard {
            Standard::Smpte => ("ID", "Underline"),
            Standard::Interop => ("Id", "Underlined"),
        };

        let mut values = BTreeMap::new();
        if let Some(font) = &s.font {
            values.insert(id.to_string(), font.clone());
        }
        values.insert("Italic".into(), yes_no(s.italic));
        values.insert("Color".into(), s.colour.to_argb_string());
        values.insert("Size".into(), s.size.to_string());
        values.insert("AspectAdjust".into(), format!("{:.1}", s.aspect_adjust()));
        values.insert("Effect".into(), s.effect.as_str().to_string());
        values.insert("EffectColor".into(), s.effect_colour.to_argb_string());
        values.insert("Script".into(), "normal".into());
        values.insert(underline.to_string(), yes_no(s.underline));
        values.insert("Weight".into(), (if s.bold { "bold" } else { "normal" }).into());

        Self { values }
    }

    /// True if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Keeps only attributes with the same value in `other`.
    pub fn take_intersection(&mut self, other: &Font) {
        self.values.retain(|k, v| other.values.get(k) == Some(v));
    }

    /// Drops attributes whose names appear in `other`.
    pub fn take_difference(&mut self, other: &Font) {
        self.values.retain(|k, _| !other.values.contains_key(k));
    }

    /// Attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn as_xml<'p>(&self, parent: &'p mut Element, context: &Context) -> &'p mut Element {
        let e = parent.add_child(context.name("Font"));
        for (k, v) in &self.values {
            e.set_attribute(k, v.as_str());
        }
        e
    }
}

// ============================================================================
// Parts
// ============================================================================

/// A text line's placement, shared by its strings.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPart {
    h_align: HAlign,
    h_position: f32,
    v_align: VAlign,
    v_position: f32,
    z_position: f32,
    variable_z: Option<String>,
    direction: Direction,
    rubies: Vec<Ruby>,
}

/// A `<Subtitle>`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitlePart {
    time_in: Time,
    time_out: Time,
    fade_up: Time,
    fade_down: Time,
    load_variable_z: Vec<LoadVariableZ>,
}

impl SubtitlePart {
    /// Returns the id of a table holding `positions`, declaring a new
    /// `Zvector<n>` table if none matches. `index` numbers new tables
    /// across the whole document.
    pub fn find_or_add_variable_z_positions(
        &mut self,
        positions: &[VariableZPosition],
        index: &mut i32,
    ) -> Option<String> {
        if positions.is_empty() {
            return None;
        }

        let existing = self
            .load_variable_z
            .iter()
            .find(|z| z.positions().is_ok_and(|p| p == positions));
        if let Some(z) = existing {
            return Some(z.id().to_string());
        }

        let id = format!("Zvector{}", index);
        *index += 1;
        self.load_variable_z.push(LoadVariableZ::new(id.clone(), positions.to_vec()));
        Some(id)
    }
}

/// What a [`Part`] writes.
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    /// Writes nothing itself; used for the root and for font groups.
    Group,
    /// A `<Subtitle>`.
    Subtitle(SubtitlePart),
    /// A `<Text>`.
    Text(TextPart),
    /// A run of text, with optional leading `<Space>`.
    String {
        /// The text.
        text: String,
        /// Leading space in ems.
        space_before: f32,
    },
    /// An `<Image>` reference.
    Image {
        /// Image id.
        id: String,
        /// Placement.
        placement: TextPart,
    },
}

/// A node of the serialization tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Font attributes introduced at this node.
    pub font: Font,
    /// What this node writes.
    pub kind: PartKind,
    /// Children in output order.
    pub children: Vec<Part>,
}

impl Part {
    fn new(kind: PartKind) -> Self {
        Self {
            font: Font::default(),
            kind,
            children: Vec::new(),
        }
    }

    /// Writes this node (inside a `<Font>` if it has one) and its children.
    pub fn write_xml(&self, parent: &mut Element, context: &mut Context) {
        let parent = if self.font.is_empty() {
            parent
        } else {
            self.font.as_xml(parent, context)
        };

        let parent = self.as_xml(parent, context);

        for child in &self.children {
            child.write_xml(parent, context);
        }
    }

    fn as_xml<'p>(&self, parent: &'p mut Element, context: &mut Context) -> &'p mut Element {
        match &self.kind {
            PartKind::Group => parent,
            PartKind::Subtitle(s) => {
                let tcr = context.time_code_rate;
                let standard = context.standard;
                let e = parent.add_child(context.name("Subtitle"));
                e.set_attribute("SpotNumber", context.spot_number.to_string());
                context.spot_number += 1;
                e.set_attribute("TimeIn", s.time_in.rebase(tcr).as_string(standard));
                e.set_attribute("TimeOut", s.time_out.rebase(tcr).as_string(standard));
                match standard {
                    Standard::Smpte => {
                        e.set_attribute("FadeUpTime", s.fade_up.rebase(tcr).as_string(standard));
                        e.set_attribute("FadeDownTime", s.fade_down.rebase(tcr).as_string(standard));
                    }
                    Standard::Interop => {
                        e.set_attribute("FadeUpTime", s.fade_up.as_editable_units_ceil(tcr).to_string());
                        e.set_attribute("FadeDownTime", s.fade_down.as_editable_units_ceil(tcr).to_string());
                    }
                }
                for z in &s.load_variable_z {
                    z.write(e.add_child(context.name("LoadVariableZ")));
                }
                e
            }
            PartKind::Text(t) => {
                let e = parent.add_child(context.name("Text"));
                position_align(e, context, t);
                if t.direction != Direction::Ltr && context.standard == Standard::Smpte {
                    e.set_attribute("Direction", t.direction.as_str());
                }
                for ruby in &t.rubies {
                    let r = e.add_child(context.name("Ruby"));
                    r.add_child(context.name("Rb")).add_text(&ruby.base);
                    let rt = r.add_child(context.name("Rt"));
                    rt.add_text(&ruby.annotation);
                    rt.set_attribute("Size", format_general(ruby.size as f64, 6));
                    rt.set_attribute("Position", ruby.position.as_str());
                    rt.set_attribute("Offset", format_general(ruby.offset as f64, 6));
                    rt.set_attribute("Spacing", format_general(ruby.spacing as f64, 6));
                    rt.set_attribute("AspectAdjust", format_general(ruby.aspect_adjust as f64, 6));
                }
                e
            }
            PartKind::String { text, space_before } => {
                if space_before.abs() > SPACE_BEFORE_EPSILON {
                    let mut size = format_general(*space_before as f64, 2);
                    if context.standard == Standard::Interop {
                        size.push_str("em");
                    }
                    parent.add_child(context.name("Space")).set_attribute("Size", size);
                }
                parent.add_text(text);
                parent
            }
            PartKind::Image { id, placement } => {
                let e = parent.add_child(context.name("Image"));
                position_align(e, context, placement);
                match context.standard {
                    Standard::Smpte => e.add_text(format!("urn:uuid:{}", id)),
                    Standard::Interop => e.add_text(format!("{}.png", id)),
                }
                e
            }
        }
    }
}

fn position_align(e: &mut Element, context: &Context, t: &TextPart) {
    let smpte = context.standard == Standard::Smpte;
    let pick = |smpte_name: &'static str, interop_name: &'static str| {
        if smpte { smpte_name } else { interop_name }
    };

    if t.h_align != HAlign::Center {
        e.set_attribute(pick("Halign", "HAlign"), t.h_align.as_str());
    }

    if t.h_position.abs() > ALIGN_EPSILON {
        e.set_attribute(
            pick("Hposition", "HPosition"),
            format_general((t.h_position * 100.0) as f64, 6),
        );
    }

    e.set_attribute(pick("Valign", "VAlign"), t.v_align.as_str());

    if t.v_position.abs() > ALIGN_EPSILON {
        e.set_attribute(
            pick("Vposition", "VPosition"),
            format_general((t.v_position * 100.0) as f64, 6),
        );
    } else {
        e.set_attribute(pick("Vposition", "VPosition"), "0");
    }

    if t.z_position.abs() > ALIGN_EPSILON && smpte {
        e.set_attribute("Zposition", format_general((t.z_position * 100.0) as f64, 6));
    }

    if let Some(z) = &t.variable_z {
        e.set_attribute("VariableZ", z.as_str());
    }
}

// ============================================================================
// Building
// ============================================================================

/// Groups sorted texts into a tree under a [`PartKind::Group`] root.
///
/// A new `<Subtitle>` starts whenever timing or fades change, and a new
/// `<Text>` whenever placement or direction changes.
pub fn build(texts: &[&crate::Text], standard: Standard) -> Part {
    let mut root = Part::new(PartKind::Group);
    let mut load_variable_z_index = 1;

    let mut last_subtitle: Option<(Time, Time, Time, Time)> = None;
    let mut last_text: Option<(HAlign, f32, VAlign, f32, f32, Direction)> = None;

    for text in texts {
        let common = text.common();
        let timing = (common.time_in, common.time_out, common.fade_up_time, common.fade_down_time);

        if last_subtitle != Some(timing) {
            root.children.push(Part::new(PartKind::Subtitle(SubtitlePart {
                time_in: common.time_in,
                time_out: common.time_out,
                fade_up: common.fade_up_time,
                fade_down: common.fade_down_time,
                load_variable_z: Vec::new(),
            })));
            last_subtitle = Some(timing);
            last_text = None;
        }

        let Some(subtitle) = root.children.last_mut() else {
            continue;
        };
        let PartKind::Subtitle(subtitle_part) = &mut subtitle.kind else {
            continue;
        };

        match text {
            crate::Text::String(s) => {
                let placement = (
                    common.h_align,
                    common.h_position,
                    common.v_align,
                    common.v_position,
                    common.z_position,
                    s.direction,
                );
                let new_line = match last_text {
                    None => true,
                    Some((h_align, h, v_align, v, z, direction)) => {
                        h_align != common.h_align
                            || (h - common.h_position).abs() > ALIGN_EPSILON
                            || v_align != common.v_align
                            || (v - common.v_position).abs() > ALIGN_EPSILON
                            || (z - common.z_position).abs() > ALIGN_EPSILON
                            || direction != s.direction
                    }
                };

                if new_line {
                    let variable_z = subtitle_part.find_or_add_variable_z_positions(
                        &common.variable_z_positions,
                        &mut load_variable_z_index,
                    );
                    subtitle.children.push(Part::new(PartKind::Text(TextPart {
                        h_align: common.h_align,
                        h_position: common.h_position,
                        v_align: common.v_align,
                        v_position: common.v_position,
                        z_position: common.z_position,
                        variable_z,
                        direction: s.direction,
                        rubies: s.rubies.clone(),
                    })));
                    last_text = Some(placement);
                }

                if let Some(line) = subtitle.children.last_mut() {
                    let mut leaf = Part::new(PartKind::String {
                        text: s.text.clone(),
                        space_before: s.space_before,
                    });
                    leaf.font = Font::new(s, standard);
                    line.children.push(leaf);
                }
            }
            crate::Text::Image(i) => {
                last_text = None;
                let variable_z = subtitle_part.find_or_add_variable_z_positions(
                    &common.variable_z_positions,
                    &mut load_variable_z_index,
                );
                subtitle.children.push(Part::new(PartKind::Image {
                    id: i.id().to_string(),
                    placement: TextPart {
                        h_align: common.h_align,
                        h_position: common.h_position,
                        v_align: common.v_align,
                        v_position: common.v_position,
                        z_position: common.z_position,
                        variable_z,
                        direction: Direction::Ltr,
                        rubies: Vec::new(),
                    },
                }));
            }
        }
    }

    root
}

/// Moves font attributes as far up the tree as they will go.
///
/// Post-order: a non-root node takes the attributes its children all
/// share, and they are removed from the children. Then runs of adjacent
/// children with the same non-empty font are gathered under a new group
/// node carrying that font.
pub fn pull_fonts(part: &mut Part, is_root: bool) {
    if part.children.is_empty() {
        return;
    }

    for child in &mut part.children {
        pull_fonts(child, false);
    }

    if !is_root {
        let mut common = part.children[0].font.clone();
        for child in &part.children[1..] {
            common.take_intersection(&child.font);
        }
        for child in &mut part.children {
            child.font.take_difference(&common);
        }
        part.font = common;
    }

    let children = std::mem::take(&mut part.children);
    let mut merged: Vec<Part> = Vec::with_capacity(children.len());
    let mut run: Vec<Part> = Vec::new();

    let flush = |run: &mut Vec<Part>, merged: &mut Vec<Part>| {
        if run.len() > 1 {
            let mut group = Part::new(PartKind::Group);
            group.font = run[0].font.clone();
            for mut member in run.drain(..) {
                member.font.clear();
                group.children.push(member);
            }
            merged.push(group);
        } else {
            merged.append(run);
        }
    };

    for child in children {
        if child.font.is_empty() {
            flush(&mut run, &mut merged);
            merged.push(child);
        } else if run.first().is_some_and(|first| first.font == child.font) {
            run.push(child);
        } else {
            flush(&mut run, &mut merged);
            run.push(child);
        }
    }
    flush(&mut run, &mut merged);

    part.children = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Text, TextCommon};

    fn string(text: &str, in_s: i32) -> Text {
        let mut s = TextString::new(
            TextCommon::new(Time::new(0, 0, in_s, 0, 24), Time::new(0, 0, in_s + 1, 0, 24)),
            text,
        );
        s.font = Some("f".into());
        Text::String(s)
    }

    fn font_elements(e: &Element) -> usize {
        e.elements()
            .map(|c| usize::from(c.local_name() == "Font") + font_elements(c))
            .sum()
    }

    #[test]
    fn test_font_set_operations() {
        let mut a = Font::default();
        a.values.insert("Size".into(), "42".into());
        a.values.insert("Italic".into(), "no".into());
        let mut b = Font::default();
        b.values.insert("Size".into(), "42".into());
        b.values.insert("Italic".into(), "yes".into());

        let mut i = a.clone();
        i.take_intersection(&b);
        assert_eq!(i.get("Size"), Some("42"));
        assert_eq!(i.get("Italic"), None);

        let mut d = b.clone();
        d.take_difference(&i);
        assert_eq!(d.get("Size"), None);
        assert_eq!(d.get("Italic"), Some("yes"));
    }

    #[test]
    fn test_font_attributes_by_standard() {
        let Text::String(s) = string("x", 1) else { unreachable!() };
        let interop = Font::new(&s, Standard::Interop);
        assert_eq!(interop.get("Id"), Some("f"));
        assert_eq!(interop.get("Underlined"), Some("no"));
        assert_eq!(interop.get("AspectAdjust"), Some("1.0"));
        let smpte = Font::new(&s, Standard::Smpte);
        assert_eq!(smpte.get("ID"), Some("f"));
        assert_eq!(smpte.get("Underline"), Some("no"));
    }

    #[test]
    fn test_identical_fonts_share_one_wrapper() {
        let texts = [string("Hello", 1), string("World", 2)];
        let refs: Vec<&Text> = texts.iter().collect();
        let mut root = build(&refs, Standard::Interop);
        pull_fonts(&mut root, true);

        assert_eq!(root.children.len(), 1);
        let group = &root.children[0];
        assert_eq!(group.kind, PartKind::Group);
        assert_eq!(group.font.get("Id"), Some("f"));
        assert_eq!(group.children.len(), 2);

        let mut out = Element::new("DCSubtitle");
        root.write_xml(&mut out, &mut Context::new(250, Standard::Interop, ""));
        assert_eq!(font_elements(&out), 1);
        let font = out.child("Font").unwrap();
        assert_eq!(font.children_named("Subtitle").count(), 2);
    }

    #[test]
    fn test_differing_fonts_keep_common_parent() {
        let a = string("Hello", 1);
        let mut b = string("World", 1);
        if let Text::String(s) = &mut b {
            s.italic = true;
        }
        let texts = [a, b];
        let refs: Vec<&Text> = texts.iter().collect();
        let mut root = build(&refs, Standard::Smpte);
        pull_fonts(&mut root, true);

        // One subtitle, one line; the line carries everything but Italic.
        let subtitle = &root.children[0];
        let line = &subtitle.children[0];
        assert_eq!(line.children.len(), 2);
        assert_eq!(line.font.get("Italic"), None);
        assert_eq!(line.children[0].font.get("Italic"), Some("no"));
        assert_eq!(line.children[1].font.get("Italic"), Some("yes"));
        assert_eq!(subtitle.font.get("ID"), Some("f"));
    }

    #[test]
    fn test_variable_z_tables_shared_per_subtitle() {
        let mut index = 1;
        let mut subtitle = SubtitlePart {
            time_in: Time::default(),
            time_out: Time::default(),
            fade_up: Time::default(),
            fade_down: Time::default(),
            load_variable_z: Vec::new(),
        };
        let curve = [VariableZPosition::new(1.0, 2)];
        let other = [VariableZPosition::new(3.0, 1)];

        assert_eq!(subtitle.find_or_add_variable_z_positions(&[], &mut index), None);
        assert_eq!(
            subtitle.find_or_add_variable_z_positions(&curve, &mut index).as_deref(),
            Some("Zvector1")
        );
        assert_eq!(
            subtitle.find_or_add_variable_z_positions(&other, &mut index).as_deref(),
            Some("Zvector2")
        );
        assert_eq!(
            subtitle.find_or_add_variable_z_positions(&curve, &mut index).as_deref(),
            Some("Zvector1")
        );
        assert_eq!(subtitle.load_variable_z.len(), 2);
        assert_eq!(index, 3);
    }

    #[test]
    fn test_string_space_before() {
        let mut out = Element::new("Text");
        let part = Part::new(PartKind::String {
            text: "x".into(),
            space_before: 0.5,
        });
        part.write_xml(&mut out, &mut Context::new(250, Standard::Interop, ""));
        assert_eq!(out.child("Space").unwrap().attribute("Size"), Some("0.5em"));
        assert_eq!(out.text_content(), "x");
    }
}
