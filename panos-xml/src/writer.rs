use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::tree::XmlNode;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("could not save configuration: {0}")]
    Io(#[from] std::io::Error),
}

const INDENT: usize = 2;

enum Step<'a> {
    Enter(&'a XmlNode),
    Leave(&'a str),
}

/// Serialize a tree into indented XML bytes with a trailing newline.
pub fn write(node: &XmlNode) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new_with_indent(Vec::with_capacity(4096), b' ', INDENT);
    let mut pending = vec![Step::Enter(node)];

    while let Some(step) = pending.pop() {
        match step {
            Step::Leave(tag) => {
                writer.write_event(Event::End(BytesEnd::new(tag)))?;
            }
            Step::Enter(current) => {
                let open = opening_tag(current);
                let leaf = current.children.is_empty() && current.text.is_none();
                if leaf {
                    writer.write_event(Event::Empty(open))?;
                    continue;
                }
                writer.write_event(Event::Start(open))?;
                if let Some(text) = current.text.as_deref() {
                    let escaped = BytesText::new(text);
                    writer.write_event(Event::Text(escaped))?;
                }
                pending.push(Step::Leave(&current.tag));
                pending.extend(current.children.iter().rev().map(Step::Enter));
            }
        }
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Serialize a tree and save it at `path`, replacing any existing file.
pub fn write_file(node: &XmlNode, path: &Path) -> Result<(), WriteError> {
    Ok(fs::write(path, write(node)?)?)
}

fn opening_tag(node: &XmlNode) -> BytesStart<'_> {
    BytesStart::new(node.tag.as_str()).with_attributes(
        node.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    )
}
