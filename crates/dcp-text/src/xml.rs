//! A small owned XML element tree.
//!
//! Subtitle documents are read into [`Element`]s with `quick-xml`, walked by
//! the parse engine, and built up again by the serializer. Two writers are
//! provided: [`Element::to_xml_string`] (compact) and [`format_xml`], which
//! indents like a pretty printer but never adds whitespace inside elements
//! that hold text, so displayed subtitle text is unchanged.
//!
//! Element and attribute names are stored without namespace prefixes when
//! read; namespace declarations (`xmlns`, `xmlns:*`) are kept as attributes.

use std::borrow::Cow;

use dcp_core::{Error, Result};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{partial_escape, resolve_predefined_entity, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Content of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Character data, unescaped.
    Text(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Element name, as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Value of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a mandatory attribute.
    pub fn string_attribute(&self, name: &str) -> Result<String> {
        self.attribute(name)
            .map(str::to_string)
            .ok_or_else(|| Error::Xml(format!("missing attribute {} in {}", name, self.name)))
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Children in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == name)
    }

    /// Child elements called `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.local_name() == name)
    }

    /// Text of a mandatory child element.
    pub fn string_child(&self, name: &str) -> Result<String> {
        self.child(name)
            .map(Element::text_content)
            .ok_or_else(|| Error::Xml(format!("missing XML tag {} in {}", name, self.name)))
    }

    /// Text of an optional child element.
    pub fn optional_string_child(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text_content)
    }

    /// Concatenated text of the direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Appends a new child element and returns it.
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut Element {
        self.push_element(Element::new(name))
    }

    /// Appends an existing element and returns it.
    pub fn push_element(&mut self, element: Element) -> &mut Element {
        self.children.push(Node::Element(element));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Appends text, merging with a preceding text child.
    pub fn add_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        let fail = |reader: &Reader<&[u8]>, what: String| {
            Error::Xml(format!("{} at byte {}", what, reader.buffer_position()))
        };

        loop {
            let event = reader
                .read_event()
                .map_err(|e| fail(&reader, e.to_string()))?;

            match event {
                Event::Start(ref start) => {
                    let element = start_element(start).map_err(|e| fail(&reader, e.to_string()))?;
                    stack.push(element);
                }
                Event::Empty(ref start) => {
                    let element = start_element(start).map_err(|e| fail(&reader, e.to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| fail(&reader, "unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(ref text) => {
                    let s = std::str::from_utf8(text).map_err(|e| fail(&reader, e.to_string()))?;
                    let s = unescape(s).map_err(|e| fail(&reader, e.to_string()))?;
                    if let Some(top) = stack.last_mut() {
                        top.add_text(s);
                    }
                }
                Event::CData(ref data) => {
                    let s = std::str::from_utf8(data).map_err(|e| fail(&reader, e.to_string()))?;
                    if let Some(top) = stack.last_mut() {
                        top.add_text(s);
                    }
                }
                Event::GeneralRef(ref reference) => {
                    let resolved = if reference.is_char_ref() {
                        reference
                            .resolve_char_ref()
                            .map_err(|e| fail(&reader, e.to_string()))?
                            .map(String::from)
                    } else {
                        let name = std::str::from_utf8(reference)
                            .map_err(|e| fail(&reader, e.to_string()))?;
                        resolve_predefined_entity(name).map(str::to_string)
                    };
                    let resolved = resolved.ok_or_else(|| {
                        fail(
                            &reader,
                            format!("unknown entity {}", String::from_utf8_lossy(reference)),
                        )
                    })?;
                    if let Some(top) = stack.last_mut() {
                        top.add_text(resolved);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml(format!("unclosed element {}", stack[stack.len() - 1].name)));
        }
        root.ok_or_else(|| Error::Xml("document has no root element".into()))
    }

    /// Writes the document compactly, with an XML declaration.
    ///
    /// `namespaces` are declared on this element as `(prefix, uri)`; an
    /// empty prefix declares the default namespace.
    pub fn to_xml_string(&self, namespaces: &[(&str, &str)]) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        let xml_err = |e: std::io::Error| Error::Xml(e.to_string());

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;
        writer.get_mut().push(b'\n');
        write_element(&mut writer, self, namespaces).map_err(xml_err)?;
        writer.get_mut().push(b'\n');

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))
    }
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, n)| n)
}

fn start_element(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let full = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let key = if full == "xmlns" || full.starts_with("xmlns:") {
            full
        } else {
            local(&full).to_string()
        };
        let raw = std::str::from_utf8(&attr.value).map_err(|e| Error::Xml(e.to_string()))?;
        let value = unescape(raw).map_err(|e| Error::Xml(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn escape_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

fn escape_attribute(value: &str) -> String {
    partial_escape(value).replace('"', "&quot;")
}

fn namespace_attribute(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    namespaces: &[(&str, &str)],
) -> std::io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());

    let declarations: Vec<(String, String)> = namespaces
        .iter()
        .map(|(prefix, uri)| (namespace_attribute(prefix), escape_attribute(uri)))
        .collect();
    for (k, v) in &declarations {
        start.push_attribute(Attribute::from((k.as_bytes(), v.as_bytes())));
    }

    let escaped: Vec<(&str, String)> = element
        .attributes
        .iter()
        .map(|(k, v)| (k.as_str(), escape_attribute(v)))
        .collect();
    for (k, v) in &escaped {
        start.push_attribute(Attribute::from((k.as_bytes(), v.as_bytes())));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Text(t) => writer.write_event(Event::Text(BytesText::from_escaped(escape_text(t))))?,
            Node::Element(e) => write_element(writer, e, &[])?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}

// ============================================================================
// Formatted output
// ============================================================================

struct FormatState {
    indent: usize,
    xml: String,
    disable_formatting: usize,
}

fn format_node(node: &Node, state: &mut FormatState) {
    match node {
        Node::Text(t) => state.xml.push_str(&escape_text(t)),
        Node::Element(element) => {
            state.indent += 1;

            let has_text = element.children.iter().any(|c| matches!(c, Node::Text(_)));
            let keep_inline = has_text || element.local_name() == "Text";

            if state.disable_formatting == 0 {
                state.xml.push('\n');
                state.xml.push_str(&" ".repeat(state.indent * 2));
            }

            state.xml.push('<');
            state.xml.push_str(&element.name);
            for (k, v) in &element.attributes {
                state.xml.push_str(&format!(" {}=\"{}\"", k, escape_attribute(v)));
            }

            if element.children.is_empty() {
                state.xml.push_str("/>");
            } else {
                state.xml.push('>');

                if keep_inline {
                    state.disable_formatting += 1;
                }

                for child in &element.children {
                    format_node(child, state);
                }

                if state.disable_formatting == 0 {
                    state.xml.push('\n');
                    state.xml.push_str(&" ".repeat(state.indent * 2));
                }

                state.xml.push_str(&format!("</{}>", element.name));

                if keep_inline {
                    state.disable_formatting -= 1;
                }
            }

            state.indent -= 1;
        }
    }
}

/// Formats a document with two-space indentation.
///
/// Elements holding text (and every `Text` element) are written without
/// added whitespace inside them, so rendered subtitle text is unaffected.
///
/// ```rust
/// use dcp_text::xml::{format_xml, Element};
///
/// let mut root = Element::new("DCSubtitle");
/// root.set_attribute("Version", "1.0");
/// root.add_child("Font").add_child("Text").add_text("Hi");
///
/// assert_eq!(
///     format_xml(&root, &[]),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
///      <DCSubtitle Version=\"1.0\">\n  <Font>\n    <Text>Hi</Text>\n  </Font>\n</DCSubtitle>\n"
/// );
/// ```
pub fn format_xml(root: &Element, namespaces: &[(&str, &str)]) -> String {
    let mut state = FormatState {
        indent: 0,
        xml: format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<{}", root.name),
        disable_formatting: 0,
    };

    for (prefix, uri) in namespaces {
        state.xml.push_str(&format!(
            " {}=\"{}\"",
            namespace_attribute(prefix),
            escape_attribute(uri)
        ));
    }
    for (k, v) in &root.attributes {
        state.xml.push_str(&format!(" {}=\"{}\"", k, escape_attribute(v)));
    }
    state.xml.push('>');

    for child in &root.children {
        format_node(child, &mut state);
    }

    state.xml.push_str(&format!("\n</{}>\n", root.name));
    state.xml
}

/// Formats `value` with `precision` significant digits, dropping trailing
/// zeros, like C's `%g`.
pub(crate) fn format_general(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let sci = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs());
    }

    let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, value)).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
