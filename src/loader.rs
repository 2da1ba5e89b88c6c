use std::fs;
use std::path::{Path, PathBuf};

use crate::document::Document;

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("buffer {0} has no uri; embedded (GLB) buffers are not supported")]
    EmbeddedBuffer(usize),
    #[error("buffer {0} holds its payload in a data uri, which is not supported")]
    DataUri(usize),
    #[error("buffer {0} points at the remote uri `{1}`; only local files are supported")]
    RemoteUri(usize, String),
    #[error("buffer {0} points at a blob uri; only local files are supported")]
    BlobUri(usize),
    #[error("failed to read buffer file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raw bytes of one entry of `document.buffers`. Read once per invocation,
/// read-only to every later stage.
#[derive(Debug)]
pub struct BufferPayload(Vec<u8>);

impl BufferPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads every buffer file the document references, resolved against
/// `base_dir`. The uris this accepts are plain relative file paths; anything
/// else (missing uri, data:, http(s), blob:) is a configuration error of the
/// input, not a transient failure, so there is nothing to retry.
pub fn load_payloads(document: &Document, base_dir: &Path) -> Result<Vec<BufferPayload>, Err> {
    let mut payloads = Vec::with_capacity(document.buffers.len());
    for (index, buffer) in document.buffers.iter().enumerate() {
        let uri = buffer.uri.as_deref().ok_or(Err::EmbeddedBuffer(index))?;
        let lower = uri.to_ascii_lowercase();
        if lower.starts_with("data:") {
            return Err(Err::DataUri(index));
        }
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
        {
            return Err(Err::RemoteUri(index, uri.to_string()));
        }
        if lower.starts_with("blob:") {
            return Err(Err::BlobUri(index));
        }
        let path = base_dir.join(uri);
        let bytes = fs::read(&path).map_err(|source| Err::Io { path, source })?;
        payloads.push(BufferPayload(bytes));
    }
    Ok(payloads)
}
