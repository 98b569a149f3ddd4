use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document counts per file extension, e.g. `{"md": 1, "rs": 12}`.
///
/// Ordered so the rendering handed to the LLM is stable between runs.
pub type FileTypeCounts = BTreeMap<String, usize>;

/// A whole loaded file, before splitting. Consumed by the splitter.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub raw_text: String,
    pub extension: String,
}

/// A single retrievable span of text from one source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub source_path: String,
    /// Id of the [`Document`] this chunk was cut from.
    pub origin_file_id: Uuid,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
}

/// A ranked chunk together with the signals that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Row of the chunk in the index's chunk sequence.
    pub position: usize,
    pub lexical_score: f32,
    pub vector_score: f32,
    pub combined_score: f32,
}
