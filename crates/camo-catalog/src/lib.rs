#![deny(warnings)]

//! Catalog loading: reads the versioned games/modes/weapons document from
//! YAML or JSON and checks its id invariants before anything is built on it.

use camo_core::{validate_catalog, Catalog, ValidationError};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

/// Supported document formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse and validate a catalog document.
pub fn parse(text: &str, format: Format) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = match format {
        Format::Yaml => serde_yaml::from_str(text)?,
        Format::Json => serde_json::from_str(text)?,
    };
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Load a catalog file, choosing the parser by extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let catalog = parse(&text, format)?;
    info!(
        path = %path.display(),
        version = catalog.version,
        games = catalog.games.len(),
        "catalog loaded"
    );
    Ok(catalog)
}
