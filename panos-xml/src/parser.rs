use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors raised while reading a configuration document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("bad escape sequence in XML: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration document: {0}")]
    Malformed(String),
}

/// Build a tree from a configuration document held in memory.
///
/// Whitespace-only text is dropped so that pretty-printed documents and their
/// compact equivalents produce identical trees.
pub fn parse(xml: &[u8]) -> Result<XmlNode, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut builder = TreeBuilder::default();
    let mut scratch = Vec::new();

    loop {
        match reader.read_event_into(&mut scratch)? {
            Event::Start(e) => builder.open(element(&e, &reader)?),
            Event::Empty(e) => builder.attach(element(&e, &reader)?)?,
            Event::End(_) => builder.close()?,
            Event::Text(e) => builder.text(&e.unescape()?),
            Event::CData(e) => builder.text(std::str::from_utf8(e.as_ref())?),
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
        scratch.clear();
    }

    builder.finish()
}

/// Read and parse a configuration file.
pub fn parse_file(path: &Path) -> Result<XmlNode, ParseError> {
    parse(&fs::read(path)?)
}

#[derive(Default)]
struct TreeBuilder {
    open: Vec<XmlNode>,
    root: Option<XmlNode>,
}

impl TreeBuilder {
    fn open(&mut self, node: XmlNode) {
        self.open.push(node);
    }

    fn close(&mut self) -> Result<(), ParseError> {
        let node = self
            .open
            .pop()
            .ok_or_else(|| ParseError::Malformed("closing tag without open tag".to_string()))?;
        self.attach(node)
    }

    fn attach(&mut self, node: XmlNode) -> Result<(), ParseError> {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        if self.root.is_some() {
            return Err(ParseError::Malformed(format!(
                "second root element <{}>",
                node.tag
            )));
        }
        self.root = Some(node);
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if let Some(current) = self.open.last_mut() {
            current
                .text
                .get_or_insert_with(String::new)
                .push_str(text);
        }
    }

    fn finish(self) -> Result<XmlNode, ParseError> {
        if let Some(unclosed) = self.open.last() {
            return Err(ParseError::Malformed(format!(
                "unclosed element <{}> at end of document",
                unclosed.tag
            )));
        }
        self.root
            .ok_or_else(|| ParseError::Malformed("no root element found".to_string()))
    }
}

fn element(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlNode, ParseError> {
    let mut node = XmlNode::new(std::str::from_utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attribute = attr.map_err(quick_xml::Error::from)?;
        let value = attribute.decode_and_unescape_value(reader.decoder())?;
        node.attributes.insert(
            std::str::from_utf8(attribute.key.as_ref())?.to_owned(),
            value.into_owned(),
        );
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_members() {
        let root = parse(
            br#"<config version="10.1.0">
                  <shared>
                    <address-group>
                      <entry name="grp"><static><member>a</member><member>b</member></static></entry>
                    </address-group>
                  </shared>
                </config>"#,
        )
        .expect("parse");

        assert_eq!(root.attributes.get("version").map(String::as_str), Some("10.1.0"));
        let group = root
            .descend(&["shared", "address-group"])
            .and_then(|n| n.find_entry("grp"))
            .expect("group entry");
        assert_eq!(group.get_child("static").map(|s| s.members()), Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn rejects_unclosed_document() {
        let err = parse(b"<config><shared>").expect_err("should fail");
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn unescapes_attribute_and_text() {
        let root = parse(br#"<entry name="a&amp;b"><description>x &lt; y</description></entry>"#)
            .expect("parse");
        assert_eq!(root.name(), Some("a&b"));
        assert_eq!(root.get_text(&["description"]), Some("x < y"));
    }
}
