//! Markup tree model, parser and pretty printer
//!
//! Builds an [`Element`] tree from XML events produced by `quick-xml` and
//! writes it back with indentation. Text is trimmed on the way in and
//! whitespace-only text is dropped, so printing a tree and parsing the output
//! gives back the same tree.
//!
//! Trimming also applies inside mixed content: `<p>a <b>x</b> c</p>` is read
//! as the runs `a` and `c` and prints as `<p>a<b>x</b>c</p>`. The round trip
//! is exact for the trimmed tree, not for the source text.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::HandlerError;

/// A child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// A named element with attributes and ordered children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Child elements, skipping text and comments
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element called `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated direct text content
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of elements in this subtree, this one included
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self.elements().map(Element::element_count).sum::<usize>()
    }
}

/// Parse the markup file at `path` and return its root element
pub fn parse_path(path: &Path) -> Result<Element, HandlerError> {
    let file = File::open(path).map_err(|e| HandlerError::io(path, e))?;
    parse_reader(BufReader::new(file)).map_err(|e| match e {
        ParseFailure::Io(source) => HandlerError::io(path, source),
        ParseFailure::Malformed(message) => HandlerError::malformed(path, message),
    })
}

/// Parse markup held in memory
pub fn parse_str(source: &str) -> Result<Element, ParseFailure> {
    parse_reader(source.as_bytes())
}

/// Why a parse stopped
#[derive(Debug)]
pub enum ParseFailure {
    Io(std::io::Error),
    Malformed(String),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::Io(e) => write!(f, "{e}"),
            ParseFailure::Malformed(msg) => f.write_str(msg),
        }
    }
}

impl From<quick_xml::Error> for ParseFailure {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => {
                ParseFailure::Io(std::io::Error::new(io.kind(), io.to_string()))
            }
            other => ParseFailure::Malformed(other.to_string()),
        }
    }
}

fn malformed(reader_pos: u64, message: impl std::fmt::Display) -> ParseFailure {
    ParseFailure::Malformed(format!("{message} at byte {reader_pos}"))
}

fn utf8(bytes: &[u8], pos: u64) -> Result<String, ParseFailure> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| malformed(pos, e))
}

fn start_element(start: &BytesStart<'_>, pos: u64) -> Result<Element, ParseFailure> {
    let mut element = Element::new(utf8(start.name().as_ref(), pos)?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(pos, e))?;
        let key = utf8(attr.key.as_ref(), pos)?;
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Append a finished node to the open element, or make it the root
fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    node: Node,
    pos: u64,
) -> Result<(), ParseFailure> {
    if let Some(parent) = stack.last_mut() {
        // Adjacent text runs (text next to CDATA) print as one run
        if let (Node::Text(next), Some(Node::Text(prev))) = (&node, parent.children.last_mut()) {
            prev.push_str(next);
            return Ok(());
        }
        parent.children.push(node);
        return Ok(());
    }
    match node {
        Node::Element(element) => {
            if root.is_some() {
                return Err(malformed(pos, "multiple root elements"));
            }
            *root = Some(element);
            Ok(())
        }
        Node::Text(_) => Err(malformed(pos, "text outside the root element")),
        // Comments around the root are not part of the tree
        Node::Comment(_) => Ok(()),
    }
}

fn parse_reader<R: BufRead>(source: R) -> Result<Element, ParseFailure> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        #[allow(clippy::unnecessary_cast)]
        let pos = reader.buffer_position() as u64;
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let element = start_element(&start, pos)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&start, pos)?;
                attach(&mut stack, &mut root, Node::Element(element), pos)?;
            }
            Event::End(_) => {
                // quick-xml has already matched the end name against the open tag
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(pos, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, Node::Element(element), pos)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                let text = text.trim();
                if !text.is_empty() {
                    attach(&mut stack, &mut root, Node::Text(text.to_string()), pos)?;
                }
            }
            Event::CData(cdata) => {
                let text = utf8(&cdata, pos)?;
                let text = text.trim();
                if !text.is_empty() {
                    attach(&mut stack, &mut root, Node::Text(text.to_string()), pos)?;
                }
            }
            Event::Comment(comment) => {
                let text = utf8(&comment, pos)?;
                attach(&mut stack, &mut root, Node::Comment(text.trim().to_string()), pos)?;
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    #[allow(clippy::unnecessary_cast)]
    let end = reader.buffer_position() as u64;
    if let Some(open) = stack.last() {
        return Err(malformed(end, format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed(end, "no root element"))
}

/// Write `root` as indented markup, preceded by an XML declaration
pub fn write_pretty<W: Write>(sink: W, root: &Element, indent: usize) -> std::io::Result<()> {
    let mut writer = Writer::new_with_indent(sink, b' ', indent);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;
    writer.get_mut().write_all(b"\n")?;
    writer.get_mut().flush()
}

/// Pretty-printed markup as a string
#[must_use]
pub fn to_pretty_string(root: &Element, indent: usize) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_pretty(&mut out, root, indent);
    String::from_utf8_lossy(&out).into_owned()
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> std::io::Result<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Node::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(format!(" {c} "))))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
