use crate::error::LogTagError;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// On-disk syntax of a config or rule document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.hjson` and `.json`: Hjson is a superset of JSON, with quoteless
    /// values, optional commas and `#`/`//` comments
    Hjson,
    /// `.json5`
    Json5,
    /// `.yaml` / `.yml`
    Yaml,
}

impl DocumentFormat {
    /// File extensions recognised as documents, in the order they are tried.
    pub const EXTENSIONS: &'static [&'static str] = &["json", "hjson", "json5", "yaml", "yml"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" | "hjson" => Some(DocumentFormat::Hjson),
            "json5" => Some(DocumentFormat::Json5),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Decode a document already held in memory.
pub fn decode_str<T: DeserializeOwned>(
    path: &Path,
    format: DocumentFormat,
    text: &str,
) -> Result<T, LogTagError> {
    let decoded = match format {
        DocumentFormat::Hjson => deser_hjson::from_str::<T>(text).map_err(|e| e.to_string()),
        DocumentFormat::Json5 => json5::from_str::<T>(text).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str::<T>(text).map_err(|e| e.to_string()),
    };

    decoded.map_err(|reason| LogTagError::Decode {
        path: path.to_path_buf(),
        reason,
    })
}

/// Read and decode a document, picking the syntax from its extension.
///
/// Files with an unrecognised extension are decoded as Hjson.
pub fn decode_file<T: DeserializeOwned>(path: &Path) -> Result<T, LogTagError> {
    let text = fs::read_to_string(path).map_err(|source| LogTagError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let format = DocumentFormat::from_path(path).unwrap_or(DocumentFormat::Hjson);
    decode_str(path, format, &text)
}
