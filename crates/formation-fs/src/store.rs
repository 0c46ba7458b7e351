//! Format-agnostic document loading and saving

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Format, Result, io};

/// Format-agnostic document store.
///
/// Detects the format from the file extension and handles
/// serialization/deserialization transparently.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentStore;

impl DocumentStore {
    /// Create a new DocumentStore.
    pub fn new() -> Self {
        Self
    }

    /// Load a document, detecting the format from the extension.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let format = Format::from_path(path)?;
        self.load_as(path, format)
    }

    /// Load a document in an explicit format.
    pub fn load_as<T: DeserializeOwned>(&self, path: &Path, format: Format) -> Result<T> {
        let content = io::read_text(path)?;
        parse(&content, format).map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        })
    }

    /// Load a template document.
    ///
    /// JSON is a subset of YAML, so anything that is not explicitly TOML is
    /// read with the YAML parser, whatever its extension.
    pub fn load_template<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        match Format::from_path(path) {
            Ok(Format::Toml) => self.load_as(path, Format::Toml),
            _ => self.load_as(path, Format::Yaml),
        }
    }

    /// Save a document, detecting the format from the extension.
    ///
    /// Uses an atomic write to prevent corruption.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let format = Format::from_path(path)?;
        self.save_as(path, format, value)
    }

    /// Save a document in an explicit format.
    pub fn save_as<T: Serialize>(&self, path: &Path, format: Format, value: &T) -> Result<()> {
        let content = render(value, format).map_err(|message| Error::Serialize {
            path: path.to_path_buf(),
            format: format.name().into(),
            message,
        })?;
        io::write_text(path, &content)
    }
}

/// Render a value as text in the given format.
pub fn render<T: Serialize>(value: &T, format: Format) -> std::result::Result<String, String> {
    match format {
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        Format::Json => serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| e.to_string()),
        Format::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
    }
}

fn parse<T: DeserializeOwned>(content: &str, format: Format) -> std::result::Result<T, String> {
    match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}
