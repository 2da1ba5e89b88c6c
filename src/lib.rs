// lib.rs

/// In-memory model of the glTF subset the optimizer reads and rewrites.
pub mod document;

/// Resolves and reads the external buffer files a document references.
pub mod loader;

/// Byte-level deduplication of bufferViews.
pub mod views;

/// Repacking of unique bufferViews into a single aligned buffer.
pub mod repack;

/// Accessor-level deduplication over the repacked payload.
pub mod accessors;

/// Output naming and serialization of the optimized document/payload pair.
pub mod writer;

/// The end-to-end optimization pipeline.
pub mod optimizer;

/// Contains the most commonly used types and objects.
pub mod prelude {
    pub use crate::document::Document;
    pub use crate::optimizer::{Config, GltfOptimizer, OptimizedFiles};
    pub use crate::writer::OutputTarget;
}
