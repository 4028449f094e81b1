//! Definition files: JSON or TOML, picked by extension

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

pub fn parse_document<T: DeserializeOwned>(contents: &str, format: DocumentFormat) -> anyhow::Result<T> {
    let value: Value = match format {
        DocumentFormat::Json => serde_json::from_str(contents)?,
        DocumentFormat::Toml => toml::from_str(contents)?,
    };

    Ok(serde_json::from_value(value)?)
}

pub fn load_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_document(&contents, DocumentFormat::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))
}
