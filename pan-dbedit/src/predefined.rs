use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::kind::Namespace;

/// Built-in object names every PAN-OS device knows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Predefined {
    #[serde(default)]
    pub applications: BTreeSet<String>,
    /// Application containers such as `facebook`. They resolve wherever an
    /// application name does.
    #[serde(default)]
    pub containers: BTreeSet<String>,
    #[serde(default)]
    pub services: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Predefined {
    /// Names contributed to `namespace`; empty for namespaces with no built-ins.
    pub fn names(&self, namespace: Namespace) -> BTreeSet<String> {
        match namespace {
            Namespace::Application => self.applications.union(&self.containers).cloned().collect(),
            Namespace::Service => self.services.clone(),
            Namespace::Tag => self.tags.clone(),
            _ => BTreeSet::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PredefinedLoadError {
    #[error("failed to read predefined names file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse predefined names file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

pub fn load_predefined(path: &Path) -> Result<Predefined, PredefinedLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| PredefinedLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_predefined(&raw, path.display().to_string())
}

/// The overlay compiled into the binary.
pub fn default_predefined() -> Predefined {
    let embedded = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/predefined/panos.toml"));
    match parse_predefined(embedded, "embedded predefined names".to_string()) {
        Ok(predefined) if !predefined.applications.is_empty() => predefined,
        _ => fallback_predefined(),
    }
}

fn parse_predefined(raw: &str, path: String) -> Result<Predefined, PredefinedLoadError> {
    toml::from_str(raw).map_err(|source| PredefinedLoadError::Parse { path, source })
}

fn fallback_predefined() -> Predefined {
    let set = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
    Predefined {
        applications: set(&["ping", "ssl", "web-browsing", "dns"]),
        containers: set(&["facebook", "office365-consumer-access"]),
        services: set(&["service-http", "service-https"]),
        tags: BTreeSet::new(),
    }
}
