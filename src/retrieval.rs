//! The two-call contract the surrounding glue sees: [`Retriever::index`] a
//! repository tree, then [`Retriever::search`] it.
//!
//! The retriever holds configuration only. Every [`Index`] it builds is
//! handed to the caller, who decides how long it lives.

use std::collections::HashSet;
use std::path::Path;

use crate::chunking::{chunk_repository, ChunkedRepository};
use crate::config::Config;
use crate::error::{Result, RetrievalError};
use crate::models::{Chunk, FileTypeCounts, ScoredChunk};
use crate::search::{hybrid, LexicalIndex, VectorModel};

/// Chunks of one indexing run plus both ranking structures built over them.
///
/// Row `i` of the lexical index and of the vector model is `chunks()[i]`.
/// Immutable once built, so it can be shared across threads behind an `Arc`.
pub struct Index {
    chunks: Vec<Chunk>,
    lexical: LexicalIndex,
    vector: VectorModel,
    file_type_counts: FileTypeCounts,
    document_count: usize,
}

impl Index {
    /// Build both structures over the same ordered chunk sequence.
    pub fn from_chunks(chunks: Vec<Chunk>, file_type_counts: FileTypeCounts) -> Result<Self> {
        let document_count = chunks
            .iter()
            .map(|c| c.origin_file_id)
            .collect::<HashSet<_>>()
            .len();
        Self::assemble(ChunkedRepository {
            chunks,
            file_type_counts,
            document_count,
        })
    }

    fn assemble(chunked: ChunkedRepository) -> Result<Self> {
        let lexical = LexicalIndex::build(&chunked.chunks)?;
        let vector = VectorModel::fit(&chunked.chunks)?;

        if lexical.len() != chunked.chunks.len() || vector.len() != chunked.chunks.len() {
            return Err(RetrievalError::ScoreAlignment {
                chunks: chunked.chunks.len(),
                lexical: lexical.len(),
                vector: vector.len(),
            });
        }

        Ok(Self {
            chunks: chunked.chunks,
            lexical,
            vector,
            file_type_counts: chunked.file_type_counts,
            document_count: chunked.document_count,
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn lexical(&self) -> &LexicalIndex {
        &self.lexical
    }

    pub fn vector(&self) -> &VectorModel {
        &self.vector
    }

    pub fn file_type_counts(&self) -> &FileTypeCounts {
        &self.file_type_counts
    }

    /// Documents loaded by the run that built this index.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Source path of every chunk, in chunk order (repeats included).
    pub fn source_paths(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.source_path.as_str()).collect()
    }

    /// Distinct source paths in first-seen order.
    pub fn unique_source_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.chunks
            .iter()
            .map(|c| c.source_path.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("chunks", &self.chunks.len())
            .field("documents", &self.document_count)
            .field("vocabulary", &self.vector.vocabulary_size())
            .field("file_type_counts", &self.file_type_counts)
            .finish()
    }
}

/// Stateless entry point over the chunker, both scorers and the ranker.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    config: Config,
}

impl Retriever {
    pub fn new(config: Config) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chunk `repo_path` and build an [`Index`] over it.
    ///
    /// Fails with [`RetrievalError::NoContent`] when the tree yields no
    /// chunks; an empty index is never returned.
    pub fn index(&self, repo_path: &Path) -> Result<Index> {
        let chunked = chunk_repository(repo_path, &self.config.chunking);
        if chunked.chunks.is_empty() {
            return Err(RetrievalError::NoContent {
                root: repo_path.to_path_buf(),
            });
        }
        Index::assemble(chunked)
    }

    /// The `k` most relevant chunks for `query`, best first.
    pub fn search(&self, query: &str, index: &Index, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .search_scored(query, index, k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Like [`Retriever::search`], keeping the per-signal scores.
    pub fn search_scored(&self, query: &str, index: &Index, k: usize) -> Result<Vec<ScoredChunk>> {
        hybrid::rank(query, index, k, &self.config.ranking)
    }

    /// [`Retriever::search`] with the configured `top_k`.
    pub fn search_default(&self, query: &str, index: &Index) -> Result<Vec<Chunk>> {
        self.search(query, index, self.config.ranking.top_k)
    }
}
