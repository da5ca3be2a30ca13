//! Minimal XPath-style addressing for PAN-OS configuration trees.
//!
//! Only the subset PAN-OS uses for configuration locations is supported:
//! absolute, slash-separated element steps with an optional
//! `[@name='...']` predicate selecting a named `<entry>`.
//!
//! ```
//! use panos_xml::{ConfigPath, XmlNode};
//!
//! let path = ConfigPath::parse("/config/devices/entry[@name='localhost.localdomain']/vsys").unwrap();
//! let mut root = XmlNode::new("config");
//! path.ensure(&mut root).unwrap();
//! assert!(path.select(&root).is_some());
//! ```

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::tree::{XmlNode, ENTRY_TAG, NAME_ATTR};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("configuration path must be absolute: {0}")]
    NotAbsolute(String),
    #[error("invalid step '{step}' in configuration path {path}")]
    InvalidStep { path: String, step: String },
    #[error("configuration path {0} does not start at the document root")]
    RootMismatch(String),
}

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub tag: String,
    pub name: Option<String>,
}

impl Step {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
        }
    }

    pub fn entry(name: impl Into<String>) -> Self {
        Self {
            tag: ENTRY_TAG.to_string(),
            name: Some(name.into()),
        }
    }

    fn matches(&self, node: &XmlNode) -> bool {
        node.tag == self.tag
            && match &self.name {
                Some(name) => node.name() == Some(name.as_str()),
                None => true,
            }
    }
}

/// An absolute location inside a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    steps: Vec<Step>,
}

impl ConfigPath {
    pub fn root(tag: impl Into<String>) -> Self {
        Self {
            steps: vec![Step::element(tag)],
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| PathError::NotAbsolute(raw.to_string()))?;
        let steps = body
            .split('/')
            .map(|step| parse_step(raw, step))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// Extend with a plain element step.
    pub fn child(mut self, tag: impl Into<String>) -> Self {
        self.steps.push(Step::element(tag));
        self
    }

    /// Extend with a named `<entry>` step.
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::entry(name));
        self
    }

    /// Extend with every `/`-separated element in `relative`.
    pub fn join(mut self, relative: &str) -> Self {
        self.steps.extend(
            relative
                .split('/')
                .filter(|s| !s.is_empty())
                .map(Step::element),
        );
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn select<'a>(&self, root: &'a XmlNode) -> Option<&'a XmlNode> {
        let (first, rest) = self.steps.split_first()?;
        if !first.matches(root) {
            return None;
        }
        rest.iter().try_fold(root, |node, step| {
            node.children.iter().find(|child| step.matches(child))
        })
    }

    pub fn select_mut<'a>(&self, root: &'a mut XmlNode) -> Option<&'a mut XmlNode> {
        let (first, rest) = self.steps.split_first()?;
        if !first.matches(root) {
            return None;
        }
        let mut node = root;
        for step in rest {
            node = node.children.iter_mut().find(|child| step.matches(child))?;
        }
        Some(node)
    }

    /// Select the addressed node, creating missing steps on the way.
    pub fn ensure<'a>(&self, root: &'a mut XmlNode) -> Result<&'a mut XmlNode, PathError> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Err(PathError::RootMismatch(self.to_string()));
        };
        if !first.matches(root) {
            return Err(PathError::RootMismatch(self.to_string()));
        }
        let mut node = root;
        for step in rest {
            let idx = match node.children.iter().position(|child| step.matches(child)) {
                Some(idx) => idx,
                None => {
                    let mut created = XmlNode::new(step.tag.clone());
                    if let Some(name) = &step.name {
                        created.attributes.insert(NAME_ATTR.to_string(), name.clone());
                    }
                    node.children.push(created);
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        Ok(node)
    }
}

impl Display for ConfigPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{}", step.tag)?;
            if let Some(name) = &step.name {
                write!(f, "[@name='{name}']")?;
            }
        }
        Ok(())
    }
}

fn parse_step(raw: &str, step: &str) -> Result<Step, PathError> {
    let invalid = || PathError::InvalidStep {
        path: raw.to_string(),
        step: step.to_string(),
    };
    if step.is_empty() {
        return Err(invalid());
    }
    let Some((tag, predicate)) = step.split_once('[') else {
        return Ok(Step::element(step));
    };
    let name = predicate
        .strip_prefix("@name=")
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|quoted| {
            quoted
                .strip_prefix('\'')
                .and_then(|q| q.strip_suffix('\''))
                .or_else(|| quoted.strip_prefix('"').and_then(|q| q.strip_suffix('"')))
        })
        .ok_or_else(invalid)?;
    if tag.is_empty() {
        return Err(invalid());
    }
    Ok(Step {
        tag: tag.to_string(),
        name: Some(name.to_string()),
    })
}
