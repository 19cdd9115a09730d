//! Subtitle XML parse engine.
//!
//! One walk serves both standards. Each `<Font>`, `<Subtitle>`, `<Text>`,
//! `<Image>` and `<SubtitleList>` element pushes a [`ParseState`] layer
//! holding whatever its attributes set; content under a `<Text>` or `<Image>`
//! resolves the stack outer to inner (inner layers win) into one event.
//!
//! Attribute spellings differ between Interop and SMPTE (`Id`/`ID`,
//! `HAlign`/`Halign`, `Underlined`/`Underline`, ...). Positions are read
//! from either spelling; font attributes follow the [`Standard`].

use dcp_core::{Error, Result, Standard};
use tracing::trace;

use crate::xml::{Element, Node};
use crate::{
    Color, Direction, Effect, HAlign, LoadVariableZ, Ruby, RubyPosition, Text, TextCommon,
    TextImage, TextString, Time, VAlign,
};

/// Longest fade accepted; longer fades are clamped.
const MAX_FADE: Time = Time::new(0, 0, 8, 0, 250);

/// Fade used when a `<Subtitle>` gives none.
const DEFAULT_FADE: Time = Time::new(0, 0, 0, 20, 250);

/// What an element's content becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// A [`TextString`].
    Text,
    /// A [`TextImage`].
    Image,
}

/// Optional overrides set by one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseState {
    /// Font load id.
    pub font_id: Option<String>,
    /// Size in points.
    pub size: Option<i64>,
    /// Glyph scaling.
    pub aspect_adjust: Option<f32>,
    /// Italic.
    pub italic: Option<bool>,
    /// Bold.
    pub bold: Option<bool>,
    /// Underline.
    pub underline: Option<bool>,
    /// Glyph colour.
    pub colour: Option<Color>,
    /// Decoration.
    pub effect: Option<Effect>,
    /// Decoration colour.
    pub effect_colour: Option<Color>,
    /// Horizontal position, as a proportion.
    pub h_position: Option<f32>,
    /// Horizontal anchor.
    pub h_align: Option<HAlign>,
    /// Vertical position, as a proportion.
    pub v_position: Option<f32>,
    /// Vertical anchor.
    pub v_align: Option<VAlign>,
    /// Depth, as a proportion.
    pub z_position: Option<f32>,
    /// Id of a variable Z table.
    pub variable_z: Option<String>,
    /// Writing direction.
    pub direction: Option<Direction>,
    /// Start time.
    pub time_in: Option<Time>,
    /// End time.
    pub time_out: Option<Time>,
    /// Fade-in.
    pub fade_up_time: Option<Time>,
    /// Fade-out.
    pub fade_down_time: Option<Time>,
    /// Content kind, set by `<Text>` and `<Image>`.
    pub kind: Option<ContentKind>,
    /// Variable Z tables declared by a `<Subtitle>`.
    pub load_variable_z: Vec<LoadVariableZ>,
}

macro_rules! overlay {
    ($into:ident, $layer:ident, $($field:ident),+) => {
        $(
            if $layer.$field.is_some() {
                $into.$field = $layer.$field.clone();
            }
        )+
    };
}

impl ParseState {
    /// Folds layers outer to inner: a field set by a later layer replaces
    /// an earlier one. Variable Z tables accumulate, first id wins.
    pub fn resolve(layers: &[ParseState]) -> ParseState {
        let mut ps = ParseState::default();
        for layer in layers {
            overlay!(
                ps, layer, font_id, size, aspect_adjust, italic, bold, underline, colour, effect,
                effect_colour, h_position, h_align, v_position, v_align, z_position, variable_z,
                direction, time_in, time_out, fade_up_time, fade_down_time, kind
            );
            for z in &layer.load_variable_z {
                if !ps.load_variable_z.iter().any(|existing| existing.id() == z.id()) {
                    ps.load_variable_z.push(z.clone());
                }
            }
        }
        ps
    }
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn optional_bool(element: &Element, name: &str) -> Option<bool> {
    element.attribute(name).map(|s| s == "1" || s == "yes")
}

fn optional_number<T: std::str::FromStr>(element: &Element, name: &str) -> Result<Option<T>> {
    let Some(s) = element.attribute(name) else {
        return Ok(None);
    };
    let t: String = s.chars().filter(|c| *c != ' ').collect();
    t.parse::<T>()
        .map(Some)
        .map_err(|_| Error::Xml(format!("could not parse {} value {} in {}", name, s, element.name())))
}

fn either<'a>(element: &'a Element, a: &str, b: &str) -> Option<&'a str> {
    element.attribute(a).or_else(|| element.attribute(b))
}

fn either_number(element: &Element, a: &str, b: &str) -> Result<Option<f32>> {
    match optional_number::<f32>(element, a)? {
        Some(v) => Ok(Some(v)),
        None => optional_number::<f32>(element, b),
    }
}

// ============================================================================
// Element states
// ============================================================================

fn font_node_state(element: &Element, standard: Standard) -> Result<ParseState> {
    let (id, underline) = match standard {
        Standard::Interop => ("Id", "Underlined"),
        Standard::Smpte => ("ID", "Underline"),
    };

    Ok(ParseState {
        font_id: element.attribute(id).map(str::to_string),
        size: optional_number(element, "Size")?,
        aspect_adjust: optional_number(element, "AspectAdjust")?,
        italic: optional_bool(element, "Italic"),
        bold: Some(element.attribute("Weight").unwrap_or("normal") == "bold"),
        underline: optional_bool(element, underline),
        colour: element.attribute("Color").map(Color::from_argb_hex).transpose()?,
        effect: element.attribute("Effect").map(str::parse).transpose()?,
        effect_colour: element.attribute("EffectColor").map(Color::from_argb_hex).transpose()?,
        ..Default::default()
    })
}

fn position_align(ps: &mut ParseState, element: &Element) -> Result<()> {
    if let Some(h) = either_number(element, "HPosition", "Hposition")? {
        ps.h_position = Some(h / 100.0);
    }
    if let Some(h) = either(element, "HAlign", "Halign") {
        ps.h_align = Some(h.parse()?);
    }
    if let Some(v) = either_number(element, "VPosition", "Vposition")? {
        ps.v_position = Some(v / 100.0);
    }
    if let Some(v) = either(element, "VAlign", "Valign") {
        ps.v_align = Some(v.parse()?);
    }
    if let Some(z) = optional_number::<f32>(element, "Zposition")? {
        ps.z_position = Some(z / 100.0);
    }
    if let Some(z) = element.attribute("VariableZ") {
        ps.variable_z = Some(z.to_string());
    }
    Ok(())
}

fn text_node_state(element: &Element) -> Result<ParseState> {
    let mut ps = ParseState::default();
    position_align(&mut ps, element)?;
    ps.direction = element.attribute("Direction").map(str::parse).transpose()?;
    ps.kind = Some(ContentKind::Text);
    Ok(ps)
}

fn image_node_state(element: &Element) -> Result<ParseState> {
    let mut ps = ParseState::default();
    position_align(&mut ps, element)?;
    ps.kind = Some(ContentKind::Image);
    Ok(ps)
}

fn subtitle_node_state(element: &Element, tcr: Option<i32>) -> Result<ParseState> {
    let load_variable_z = element
        .children_named("LoadVariableZ")
        .map(LoadVariableZ::from_element)
        .collect::<Result<Vec<_>>>()?;

    Ok(ParseState {
        time_in: Some(Time::parse(&element.string_attribute("TimeIn")?, tcr)?),
        time_out: Some(Time::parse(&element.string_attribute("TimeOut")?, tcr)?),
        fade_up_time: Some(fade_time(element, "FadeUpTime", tcr)?),
        fade_down_time: Some(fade_time(element, "FadeDownTime", tcr)?),
        load_variable_z,
        ..Default::default()
    })
}

/// Reads a fade: a timecode, a bare count of units, or nothing for the
/// default of 20/250 s. Clamped to 8 s.
fn fade_time(element: &Element, name: &str, tcr: Option<i32>) -> Result<Time> {
    let u = element.attribute(name).unwrap_or("");

    let t = if u.is_empty() {
        DEFAULT_FADE
    } else if u.contains(':') {
        Time::parse(u, tcr)?
    } else {
        let e: i32 = u
            .trim()
            .parse()
            .map_err(|_| Error::Xml(format!("could not parse {} value {}", name, u)))?;
        Time::new(0, 0, 0, e, tcr.unwrap_or(250))
    };

    Ok(if t > MAX_FADE { MAX_FADE } else { t })
}

fn rubies(element: &Element) -> Result<Vec<Ruby>> {
    let mut rubies = Vec::new();

    for ruby_element in element.children_named("Ruby") {
        let mut base = None;
        let mut annotation = None;
        let mut ruby_attrs = None;

        for child in ruby_element.elements() {
            match child.local_name() {
                "Rb" => base = Some(child.text_content()),
                "Rt" => {
                    annotation = Some(child.text_content());
                    ruby_attrs = Some(child);
                }
                _ => {}
            }
        }

        let (Some(base), Some(annotation)) = (base, annotation) else {
            return Err(Error::Xml("<Ruby> needs both <Rb> and <Rt>".into()));
        };

        let mut ruby = Ruby::new(base, annotation);
        if let Some(rt) = ruby_attrs {
            if let Some(size) = optional_number(rt, "Size")? {
                ruby.size = size;
            }
            if let Some(position) = rt.attribute("Position") {
                ruby.position = position.parse::<RubyPosition>()?;
            }
            if let Some(offset) = optional_number(rt, "Offset")? {
                ruby.offset = offset;
            }
            if let Some(spacing) = optional_number(rt, "Spacing")? {
                ruby.spacing = spacing;
            }
            if let Some(aspect_adjust) = optional_number(rt, "AspectAdjust")? {
                ruby.aspect_adjust = aspect_adjust;
            }
        }
        rubies.push(ruby);
    }

    Ok(rubies)
}

// ============================================================================
// Walk
// ============================================================================

/// Collects text events from a subtree.
pub struct TextParser<'a> {
    standard: Standard,
    tcr: Option<i32>,
    state: Vec<ParseState>,
    texts: &'a mut Vec<Text>,
}

impl<'a> TextParser<'a> {
    /// Creates a parser appending to `texts`. `tcr` is the SMPTE time code
    /// rate; Interop passes `None`.
    pub fn new(standard: Standard, tcr: Option<i32>, texts: &'a mut Vec<Text>) -> Self {
        Self {
            standard,
            tcr,
            state: Vec::new(),
            texts,
        }
    }

    /// Parses one `<Font>`, `<Subtitle>`, `<SubtitleList>` (or nested)
    /// element.
    pub fn parse(&mut self, element: &Element) -> Result<()> {
        let name = element.local_name();
        let ps = match name {
            "Font" => font_node_state(element, self.standard)?,
            "Subtitle" => subtitle_node_state(element, self.tcr)?,
            "Text" => text_node_state(element)?,
            "SubtitleList" => ParseState::default(),
            "Image" => image_node_state(element)?,
            "LoadVariableZ" => return Ok(()),
            _ => return Err(Error::Xml(format!("unexpected node {}", name))),
        };
        self.state.push(ps);

        let rubies = rubies(element)?;
        let mut space_before = 0.0_f32;

        for child in element.children() {
            match child {
                Node::Text(content) => {
                    if content.trim().is_empty() {
                        continue;
                    }
                    self.maybe_add_text(content, space_before, &rubies)?;
                    space_before = 0.0;
                }
                Node::Element(e) if e.local_name() == "Space" => {
                    // A `<Font>` wrapping part of a line may carry the space.
                    let in_text = name == "Text"
                        || (name == "Font" && self.state.iter().any(|ps| ps.kind == Some(ContentKind::Text)));
                    if !in_text {
                        return Err(Error::Xml("Space node found outside Text".into()));
                    }
                    let mut size = e.attribute("Size").unwrap_or("0.5").to_string();
                    if self.standard == Standard::Interop {
                        size = size.replace("em", "");
                    }
                    space_before += size
                        .trim()
                        .parse::<f32>()
                        .map_err(|_| Error::Xml(format!("could not parse Space size {}", size)))?;
                }
                Node::Element(e) if e.local_name() == "Ruby" => {}
                Node::Element(e) => self.parse(e)?,
            }
        }

        self.state.pop();
        Ok(())
    }

    fn maybe_add_text(&mut self, content: &str, space_before: f32, rubies: &[Ruby]) -> Result<()> {
        if !self.state.iter().any(|ps| ps.kind.is_some()) {
            return Ok(());
        }

        let ps = ParseState::resolve(&self.state);

        let (Some(time_in), Some(time_out)) = (ps.time_in, ps.time_out) else {
            trace!("Ignoring text outside <Subtitle>: {:?}", content);
            return Ok(());
        };

        let variable_z = match &ps.variable_z {
            Some(id) => match ps.load_variable_z.iter().find(|z| z.id() == id) {
                Some(z) => z.positions()?.to_vec(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let common = TextCommon {
            time_in,
            time_out,
            h_position: ps.h_position.unwrap_or(0.0),
            h_align: ps.h_align.unwrap_or_default(),
            v_position: ps.v_position.unwrap_or(0.0),
            v_align: ps.v_align.unwrap_or_default(),
            z_position: ps.z_position.unwrap_or(0.0),
            variable_z_positions: variable_z,
            fade_up_time: ps.fade_up_time.unwrap_or_default(),
            fade_down_time: ps.fade_down_time.unwrap_or_default(),
        };

        match ps.kind {
            Some(ContentKind::Text) | None => {
                let mut s = TextString::new(common, content);
                s.font = ps.font_id;
                s.italic = ps.italic.unwrap_or(false);
                s.bold = ps.bold.unwrap_or(false);
                s.underline = ps.underline.unwrap_or(false);
                s.colour = ps.colour.unwrap_or(Color::WHITE);
                let size = ps.size.unwrap_or(42);
                s.size = i32::try_from(size)
                    .map_err(|_| Error::Xml(format!("Size value {} is out of range", size)))?;
                s.set_aspect_adjust(ps.aspect_adjust.unwrap_or(1.0));
                s.direction = ps.direction.unwrap_or_default();
                s.effect = ps.effect.unwrap_or_default();
                s.effect_colour = ps.effect_colour.unwrap_or(Color::BLACK);
                s.space_before = space_before;
                s.rubies = rubies.to_vec();
                self.texts.push(Text::String(s));
            }
            Some(ContentKind::Image) => {
                let id = match self.standard {
                    Standard::Interop => {
                        // Drop the file extension.
                        let cut = content.len().saturating_sub(4);
                        match content.get(..cut) {
                            Some(stem) if content.len() >= 4 => stem,
                            _ => content,
                        }
                    }
                    Standard::Smpte => content.strip_prefix("urn:uuid:").unwrap_or(content),
                };
                self.texts.push(Text::Image(TextImage::with_id(Vec::new(), id, common)));
            }
        }

        Ok(())
    }
}

/// Parses the children of `root` called one of `names`, appending to
/// `texts`. Other children (document metadata) are left alone.
pub fn parse_texts(
    root: &Element,
    names: &[&str],
    standard: Standard,
    tcr: Option<i32>,
    texts: &mut Vec<Text>,
) -> Result<()> {
    let mut parser = TextParser::new(standard, tcr, texts);
    for child in root.elements() {
        if names.contains(&child.local_name()) {
            parser.parse(child)?;
        }
    }
    Ok(())
}
