//! Immutable handle to one uploaded audit document

use dars_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// One audit document as uploaded
///
/// Cloning is cheap; the HTML text is shared. Every handle carries a fresh id so
/// work started against one upload can tell when a newer upload replaced it.
#[derive(Debug, Clone)]
pub struct AuditDocument {
    id: Uuid,
    html: Arc<str>,
    source: Option<PathBuf>,
}

impl AuditDocument {
    /// Wrap already-decoded HTML text
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            html: Arc::from(html.into()),
            source: None,
        }
    }

    /// Decode raw upload bytes; non-UTF-8 content is a load failure
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let html = String::from_utf8(bytes)
            .map_err(|e| Error::DocumentLoad(format!("Audit is not valid UTF-8: {}", e)))?;
        Ok(Self::from_html(html))
    }

    /// Read and decode an audit file
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::DocumentLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut document = Self::from_bytes(bytes)?;
        document.source = Some(path.to_path_buf());
        Ok(document)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// File the document was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
