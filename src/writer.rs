use std::fs;
use std::path::{Path, PathBuf};

use crate::document::Document;

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output locations for one invocation, derived once from the input path and
/// passed by value through the pipeline. Downstream tooling relies on the
/// exact naming: `<stem>-optimized.<ext>` beside the input for the document
/// and `<stem>-optimized.bin` for the payload.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    document_path: PathBuf,
    payload_path: PathBuf,
    payload_file_name: String,
}

impl OutputTarget {
    pub fn for_input(input: &Path) -> Self {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let dir = input.parent().unwrap_or_else(|| Path::new("."));
        let document_name = match input.extension().and_then(|s| s.to_str()) {
            Some(ext) => format!("{}-optimized.{}", stem, ext),
            None => format!("{}-optimized", stem),
        };
        let payload_file_name = format!("{}-optimized.bin", stem);
        Self {
            document_path: dir.join(document_name),
            payload_path: dir.join(&payload_file_name),
            payload_file_name,
        }
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn payload_path(&self) -> &Path {
        &self.payload_path
    }

    /// File name written into the rewritten buffer entry's uri.
    pub fn payload_file_name(&self) -> &str {
        &self.payload_file_name
    }

    /// Writes the document and the repacked payload as siblings of the input.
    /// Not transactional: a failure between the two writes leaves only the
    /// document file behind. Callers treat the optimized pair as a
    /// disposable intermediate, so a stale half is overwritten on the next
    /// run rather than cleaned up here.
    pub fn write(&self, document: &Document, payload: &[u8]) -> Result<(), Err> {
        let json = document.to_json_vec()?;
        fs::write(&self.document_path, json).map_err(|source| Err::Io {
            path: self.document_path.clone(),
            source,
        })?;
        fs::write(&self.payload_path, payload).map_err(|source| Err::Io {
            path: self.payload_path.clone(),
            source,
        })?;
        Ok(())
    }
}
