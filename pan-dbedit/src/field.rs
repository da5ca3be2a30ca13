//! Untyped field values shared by records, edit patches, the XML codec and
//! the CSV exporter.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::kind::ObjectKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
    Int(i64),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Changeset cell rendering: lists as `['a', 'b']`, booleans as `TRUE`/`FALSE`.
impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Bool(true) => f.write_str("TRUE"),
            FieldValue::Bool(false) => f.write_str("FALSE"),
            FieldValue::List(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
        }
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{kind} is missing required field '{field}'")]
    Missing { kind: ObjectKind, field: String },
    #[error("{kind} field '{field}' should be {expected}")]
    WrongType {
        kind: ObjectKind,
        field: String,
        expected: &'static str,
    },
    #[error("{kind} field '{field}' has unsupported value '{value}'")]
    BadValue {
        kind: ObjectKind,
        field: String,
        value: String,
    },
}

/// Typed accessors over a [`FieldMap`] used when rebuilding records.
pub struct FieldReader<'a> {
    kind: ObjectKind,
    map: &'a FieldMap,
}

impl<'a> FieldReader<'a> {
    pub fn new(kind: ObjectKind, map: &'a FieldMap) -> Self {
        Self { kind, map }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn wrong(&self, field: &str, expected: &'static str) -> FieldError {
        FieldError::WrongType {
            kind: self.kind,
            field: field.to_string(),
            expected,
        }
    }

    pub fn text(&self, field: &str) -> Result<String, FieldError> {
        self.opt_text(field)?.ok_or_else(|| FieldError::Missing {
            kind: self.kind,
            field: field.to_string(),
        })
    }

    pub fn opt_text(&self, field: &str) -> Result<Option<String>, FieldError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(FieldValue::Text(value)) => Ok(Some(value.clone())),
            Some(FieldValue::Int(value)) => Ok(Some(value.to_string())),
            Some(FieldValue::List(values)) if values.len() == 1 => Ok(Some(values[0].clone())),
            Some(_) => Err(self.wrong(field, "text")),
        }
    }

    /// Parse a text field through `FromStr`, reporting the raw value on failure.
    pub fn parsed<T: std::str::FromStr>(&self, field: &str) -> Result<Option<T>, FieldError> {
        match self.opt_text(field)? {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| FieldError::BadValue {
                kind: self.kind,
                field: field.to_string(),
                value: raw,
            }),
        }
    }

    pub fn list(&self, field: &str) -> Result<Vec<String>, FieldError> {
        Ok(self.opt_list(field)?.unwrap_or_default())
    }

    pub fn opt_list(&self, field: &str) -> Result<Option<Vec<String>>, FieldError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(FieldValue::List(values)) => Ok(Some(values.clone())),
            Some(FieldValue::Text(value)) => Ok(Some(vec![value.clone()])),
            Some(_) => Err(self.wrong(field, "a list")),
        }
    }

    pub fn flag(&self, field: &str) -> Result<bool, FieldError> {
        Ok(self.opt_flag(field)?.unwrap_or(false))
    }

    pub fn opt_flag(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(FieldValue::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(self.wrong(field, "a boolean")),
        }
    }

    pub fn opt_int(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(FieldValue::Int(value)) => Ok(Some(*value)),
            Some(FieldValue::Text(raw)) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| self.wrong(field, "an integer")),
            Some(_) => Err(self.wrong(field, "an integer")),
        }
    }
}

/// Builder for the [`FieldMap`] form of a record. Absent optionals are omitted.
#[derive(Debug, Default)]
pub struct FieldWriter {
    map: FieldMap,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, field: &str, value: impl Into<String>) -> Self {
        self.map
            .insert(field.to_string(), FieldValue::Text(value.into()));
        self
    }

    pub fn opt_text(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(field, value),
            None => self,
        }
    }

    pub fn shown(self, field: &str, value: impl Display) -> Self {
        self.text(field, value.to_string())
    }

    /// Lists are written only when non-empty.
    pub fn list(mut self, field: &str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.map
                .insert(field.to_string(), FieldValue::List(values.to_vec()));
        }
        self
    }

    pub fn flag(mut self, field: &str, value: bool) -> Self {
        self.map.insert(field.to_string(), FieldValue::Bool(value));
        self
    }

    pub fn opt_flag(self, field: &str, value: Option<bool>) -> Self {
        match value {
            Some(value) => self.flag(field, value),
            None => self,
        }
    }

    pub fn opt_int(mut self, field: &str, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.map.insert(field.to_string(), FieldValue::Int(value));
        }
        self
    }

    pub fn finish(self) -> FieldMap {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_changeset_cells() {
        assert_eq!(
            FieldValue::List(vec!["a".into(), "b".into()]).to_string(),
            "['a', 'b']"
        );
        assert_eq!(FieldValue::Bool(true).to_string(), "TRUE");
        assert_eq!(FieldValue::Int(443).to_string(), "443");
    }

    #[test]
    fn reader_is_lenient_between_text_and_single_lists() {
        let map = FieldWriter::new()
            .text("service", "tcp-8080")
            .list("tag", &["prod".to_string()])
            .text("metric", "20")
            .finish();
        let reader = FieldReader::new(ObjectKind::NatRule, &map);

        assert_eq!(reader.list("service").expect("list"), vec!["tcp-8080"]);
        assert_eq!(reader.opt_text("tag").expect("text"), Some("prod".to_string()));
        assert_eq!(reader.opt_int("metric").expect("int"), Some(20));
        assert!(reader.flag("disabled").is_ok_and(|v| !v));
        assert!(matches!(
            reader.text("name"),
            Err(FieldError::Missing { .. })
        ));
    }
}
