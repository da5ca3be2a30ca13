//! XML primitives for PAN-OS style configuration documents.
//!
//! Configuration files are parsed into a plain [`XmlNode`] tree. The tree
//! understands the two list idioms PAN-OS uses everywhere (`<entry name=..>`
//! and `<member>`), and [`ConfigPath`] addresses locations inside it the way
//! the device's own XPath locations do.

pub mod parser;
pub mod path;
pub mod tree;
pub mod writer;

pub use parser::{parse, parse_file, ParseError};
pub use path::{ConfigPath, PathError, Step};
pub use tree::{XmlNode, ENTRY_TAG, MEMBER_TAG, NAME_ATTR};
pub use writer::{write, write_file, WriteError};
