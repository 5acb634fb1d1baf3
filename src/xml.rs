// Copyright 2026 Toxseek Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Owned element tree for corpus markup.
//!
//! The corpus format is a small, flat XML dialect, so this module keeps an
//! explicit tree instead of streaming: documents must be reproducible
//! verbatim after indexing, and annotation extraction walks the same subtree
//! several times.

use anyhow::Result;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// One piece of mixed content inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub nodes: Vec<Node>,
}

impl Element {
    fn new(name: String, attrs: Vec<(String, String)>) -> Self {
        Self {
            name,
            attrs,
            nodes: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenation of every text node in the subtree, in document order.
    pub fn all_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(child) => child.collect_text(out),
            }
        }
    }

    /// Every descendant element with the given tag name, in document order.
    /// The element itself is not included.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for node in &self.nodes {
            if let Node::Element(child) = node {
                if child.name == name {
                    found.push(child);
                }
                child.collect_descendants(name, found);
            }
        }
    }

    /// Child elements only, skipping interleaved text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Element(child) => Some(child),
            Node::Text(_) => None,
        })
    }

    /// Serialize the subtree back to markup. Attribute order and text content
    /// are preserved from the parse; insignificant formatting is not.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.nodes.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(&escape(text.as_str())),
                Node::Element(child) => child.write_xml(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parse a complete markup document and return its root element.
///
/// Any well-formedness problem is a structural error carrying the byte
/// offset where the reader stopped.
pub fn parse_document(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let element = Element::new(name_of(e.name().as_ref()), read_attrs(e)?);
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = Element::new(name_of(e.name().as_ref()), read_attrs(e)?);
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| parse_error(&reader, err))?;
                    push_text(parent, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let raw = e.into_inner();
                    push_text(parent, &String::from_utf8_lossy(&raw));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| anyhow::anyhow!("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(parse_error(&reader, err)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        anyhow::bail!("markup ended with {} unclosed element(s)", stack.len());
    }
    root.ok_or_else(|| anyhow::anyhow!("markup contains no root element"))
}

/// Byte offset where parsing stopped; used by the validator to point at the
/// offending line.
pub fn parse_error_offset(input: &str) -> Option<usize> {
    let mut reader = Reader::from_str(input);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(_) => return Some(reader.buffer_position() as usize),
        }
    }
}

fn parse_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "markup parse error at byte {}: {err}",
        reader.buffer_position()
    )
}

fn name_of(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn read_attrs(e: &quick_xml::events::BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| anyhow::anyhow!("malformed attribute: {err}"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| anyhow::anyhow!("malformed attribute value: {err}"))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn push_text(parent: &mut Element, text: &str) {
    if text.is_empty() {
        return;
    }
    // Merge adjacent text so round-trips stay byte-stable.
    if let Some(Node::Text(last)) = parent.nodes.last_mut() {
        last.push_str(text);
    } else {
        parent.nodes.push(Node::Text(text.to_string()));
    }
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.nodes.push(Node::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    } else {
        anyhow::bail!("markup has more than one root element");
    }
    Ok(())
}
