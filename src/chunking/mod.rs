//! Repository chunking: walk the tree, load allow-listed files, split them
//! into overlapping chunks.

pub mod loader;
pub mod splitter;

use std::path::{Component, Path};

use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, Document, FileTypeCounts};

pub use loader::{file_extension, FileLoadError, Loader, ALLOWED_EXTENSIONS};
pub use splitter::TextSplitter;

/// Output of one chunking run.
#[derive(Debug, Clone, Default)]
pub struct ChunkedRepository {
    pub chunks: Vec<Chunk>,
    pub file_type_counts: FileTypeCounts,
    pub document_count: usize,
}

/// Walk `root` and load every allow-listed file as a [`Document`].
///
/// Files that fail to load are logged and skipped. A missing root or a tree
/// without matching files yields empty results, not an error.
pub fn load_documents(root: &Path, config: &ChunkingConfig) -> (Vec<Document>, FileTypeCounts) {
    let mut documents = Vec::new();
    let mut counts = FileTypeCounts::new();

    if !root.exists() {
        tracing::warn!("Repository root {} does not exist", root.display());
        return (documents, counts);
    }

    for path in walk_candidate_files(root) {
        let Some(ext) = file_extension(&path) else {
            continue;
        };
        let Some(loader) = Loader::for_extension(&ext) else {
            continue;
        };

        let relative = relative_path(root, &path);
        match loader.load(&path, config.max_file_bytes, config.notebook_output_chars) {
            Ok(raw_text) => {
                *counts.entry(ext.clone()).or_insert(0) += 1;
                documents.push(Document {
                    id: Uuid::new_v4(),
                    path: relative,
                    raw_text,
                    extension: ext,
                });
            }
            Err(e) => {
                tracing::warn!("Skipping {relative}: {e}");
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {}",
        documents.len(),
        root.display()
    );
    (documents, counts)
}

/// Split documents into chunks, carrying each document's id and path onto
/// every chunk cut from it. Documents are consumed.
pub fn split_documents(documents: Vec<Document>, splitter: &TextSplitter) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for doc in documents {
        for (i, text) in splitter.split(&doc.raw_text).into_iter().enumerate() {
            chunks.push(Chunk {
                id: Uuid::new_v4(),
                text,
                source_path: doc.path.clone(),
                origin_file_id: doc.id,
                chunk_index: i,
            });
        }
    }

    chunks
}

/// Load and split a whole repository tree.
pub fn chunk_repository(root: &Path, config: &ChunkingConfig) -> ChunkedRepository {
    let (documents, file_type_counts) = load_documents(root, config);
    let document_count = documents.len();
    let chunks = split_documents(documents, &TextSplitter::from_config(config));

    tracing::info!(
        "Created {} chunks from {document_count} documents",
        chunks.len()
    );

    ChunkedRepository {
        chunks,
        file_type_counts,
        document_count,
    }
}

/// Regular files under `root` in a stable order, without descending into
/// hidden directories such as `.git`.
pub(crate) fn walk_candidate_files(root: &Path) -> impl Iterator<Item = std::path::PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
}

fn is_hidden_dir(entry: &walkdir::DirEntry) -> bool {
    // The root itself may be a temp dir like `.tmpXYZ`.
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

/// `path` relative to `root`, always `/`-separated.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
