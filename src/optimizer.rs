use std::fs;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::writer::OutputTarget;
use crate::{accessors, loader, repack, views, writer};

#[derive(Debug, thiserror::Error)]
pub enum Err {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?} as glTF: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("document declares {0} buffers; only single-buffer documents are supported")]
    MultipleBuffers(usize),
    #[error("Buffer Load Error: {0}")]
    Load(#[from] loader::Err),
    #[error("BufferView Dedup Error: {0}")]
    Views(#[from] views::Err),
    #[error("Repack Error: {0}")]
    Repack(#[from] repack::Err),
    #[error("Accessor Dedup Error: {0}")]
    Accessors(#[from] accessors::Err),
    #[error("Write Error: {0}")]
    Write(#[from] writer::Err),
}

/// Pipeline options.
#[derive(Debug, Clone)]
pub struct Config {
    /// Group byte- and metadata-identical accessors after the views are
    /// repacked. On by default.
    pub dedupe_accessors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dedupe_accessors: true,
        }
    }
}

/// Paths of the two files an invocation produced.
#[derive(Debug, Clone)]
pub struct OptimizedFiles {
    pub document_path: PathBuf,
    pub payload_path: PathBuf,
}

/// Runs the five-stage pipeline over one .gltf file: load the buffer
/// payload, group byte-identical bufferViews, repack the survivors into a
/// single 4-byte-aligned buffer, group byte-identical accessors, and write
/// the `-optimized` document/payload pair beside the input.
///
/// Unsupported inputs (embedded, data-uri or remote buffers, sparse or
/// interleaved accessors, multi-buffer documents) and malformed byte ranges
/// abort the run before anything is written; none of these are retryable.
///
/// All working state is local to one `optimize_file` call, so distinct
/// inputs can be processed concurrently from separate threads.
#[derive(Debug, Default)]
pub struct GltfOptimizer {
    config: Config,
}

impl GltfOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Returns the written pair, or `Ok(None)` when every bufferView is
    /// already unique. In that case nothing is written at all and the caller
    /// must keep using the input file as the optimal version; this mirrors
    /// the behavior the downstream publish flow was built against.
    pub fn optimize_file(&self, input: &Path) -> Result<Option<OptimizedFiles>, Err> {
        let raw = fs::read(input).map_err(|source| Err::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let mut document = Document::from_json_slice(&raw).map_err(|source| Err::Parse {
            path: input.to_path_buf(),
            source,
        })?;
        if document.buffers.len() > 1 {
            return Err(Err::MultipleBuffers(document.buffers.len()));
        }
        let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
        let payloads = loader::load_payloads(&document, base_dir)?;

        let dedup = views::dedupe_views(&payloads, &document.buffer_views)?;
        if !dedup.had_duplicates() {
            return Ok(None);
        }

        let target = OutputTarget::for_input(input);
        let payload = repack::repack(&mut document, &dedup, target.payload_file_name())?;

        if self.config.dedupe_accessors {
            let dedup =
                accessors::dedupe_accessors(&payload, &document.buffer_views, &document.accessors)?;
            accessors::apply_remap(&mut document, &dedup)?;
        }

        target.write(&document, &payload)?;
        Ok(Some(OptimizedFiles {
            document_path: target.document_path().to_path_buf(),
            payload_path: target.payload_path().to_path_buf(),
        }))
    }
}
