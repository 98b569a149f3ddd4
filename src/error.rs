use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort an indexing or question cycle.
///
/// Per-file load problems are not represented here; they are
/// [`crate::chunking::FileLoadError`] values that get logged and skipped.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to fetch repository {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no documents found to index under {}", root.display())]
    NoContent { root: PathBuf },

    #[error("no repository has been processed yet, call process_repository first")]
    NotIndexed,

    #[error("cannot score against an index built from zero chunks")]
    EmptyCorpus,

    #[error(
        "score vectors out of alignment: {chunks} chunks, {lexical} lexical scores, {vector} vector scores"
    )]
    ScoreAlignment {
        chunks: usize,
        lexical: usize,
        vector: usize,
    },

    #[error("lexical index returned stored position {position:?} for an index of {rows} rows")]
    StoredPosition {
        position: Option<usize>,
        rows: usize,
    },

    #[error("lexical index error: {0}")]
    Lexical(#[from] tantivy::TantivyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("answer generation failed: {0}")]
    Answer(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
