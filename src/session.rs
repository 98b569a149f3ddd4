//! Two-phase question answering over one repository at a time.
//!
//! ```text
//! process_repository(url) ─► fetch ─► fingerprint ─► index ─► remember url/name
//! ask_question(q)         ─► fetch ─► fingerprint ─► reuse or rebuild index
//!                                                  ─► top-k ─► prompt ─► Answerer
//! ```
//!
//! Every fetch lands in its own temporary directory, removed when the call
//! returns. The only state kept between calls is the repository identity
//! and, when reuse is enabled, the last index with its fingerprint.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, RetrievalError};
use crate::fingerprint::repository_fingerprint;
use crate::models::FileTypeCounts;
use crate::prompt::PromptContext;
use crate::retrieval::{Index, Retriever};

// ─── Seams ──────────────────────────────────────────────────

/// Materializes a repository snapshot into an empty directory.
pub trait RepositoryFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Turns a rendered prompt into an answer. Opaque to this crate.
pub trait Answerer: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Treats the URL as a local directory (optionally `file://`-prefixed) and
/// copies its regular files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPathFetcher;

impl RepositoryFetcher for LocalPathFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let source = Path::new(url.strip_prefix("file://").unwrap_or(url));
        let fail = |reason: String| RetrievalError::Fetch {
            url: url.to_string(),
            reason,
        };

        if !source.is_dir() {
            return Err(fail("not a local directory".to_string()));
        }

        let mut copied = 0usize;
        for entry in WalkDir::new(source) {
            let entry = entry.map_err(|e| fail(e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| fail(e.to_string()))?;
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target).map_err(|e| fail(e.to_string()))?;
            } else if entry.file_type().is_file() {
                std::fs::copy(entry.path(), &target).map_err(|e| fail(e.to_string()))?;
                copied += 1;
            }
        }

        tracing::info!("Copied {copied} files from {} into {}", source.display(), dest.display());
        Ok(())
    }
}

// ─── Session ────────────────────────────────────────────────

/// Identity of the repository questions are asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRepository {
    pub url: String,
    pub name: String,
}

/// Outcome of [`Session::process_repository`].
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub repository: ProcessedRepository,
    pub chunk_count: usize,
    pub document_count: usize,
    pub file_type_counts: FileTypeCounts,
}

#[derive(Default)]
struct SessionState {
    repository: Option<ProcessedRepository>,
    cached: Option<(String, Arc<Index>)>,
}

pub struct Session<F, A> {
    retriever: Retriever,
    reuse_index: bool,
    fetcher: F,
    answerer: A,
    state: RwLock<SessionState>,
}

impl<F: RepositoryFetcher, A: Answerer> Session<F, A> {
    pub fn new(config: Config, fetcher: F, answerer: A) -> Self {
        let reuse_index = config.reuse_index;
        Self {
            retriever: Retriever::new(config),
            reuse_index,
            fetcher,
            answerer,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The repository recorded by the last successful
    /// [`Session::process_repository`].
    pub fn repository(&self) -> Option<ProcessedRepository> {
        self.state.read().repository.clone()
    }

    /// Index kept for reuse, if any.
    pub fn cached_index(&self) -> Option<Arc<Index>> {
        self.state.read().cached.as_ref().map(|(_, index)| index.clone())
    }

    /// Fetch and index `url`, then make it the session's repository.
    ///
    /// Nothing is recorded unless indexing succeeds.
    pub fn process_repository(&self, url: &str) -> Result<ProcessSummary> {
        let index = self.load_index(url)?;
        let repository = ProcessedRepository {
            url: url.to_string(),
            name: repository_name(url),
        };

        tracing::info!(
            "Processed {} ({}): {} chunks from {} documents",
            repository.name,
            repository.url,
            index.len(),
            index.document_count()
        );

        self.state.write().repository = Some(repository.clone());

        Ok(ProcessSummary {
            repository,
            chunk_count: index.len(),
            document_count: index.document_count(),
            file_type_counts: index.file_type_counts().clone(),
        })
    }

    /// Retrieve context for `question` against a fresh snapshot of the
    /// session's repository.
    pub fn prepare_prompt(&self, question: &str) -> Result<PromptContext> {
        let repository = self.repository().ok_or(RetrievalError::NotIndexed)?;
        let index = self.load_index(&repository.url)?;
        let documents = self.retriever.search_default(question, &index)?;

        Ok(PromptContext {
            repo_name: repository.name,
            repo_url: repository.url,
            conversation_history: String::new(),
            question: question.to_string(),
            documents,
            file_type_counts: index.file_type_counts().clone(),
            file_names: index.source_paths().into_iter().map(String::from).collect(),
        })
    }

    /// Answer `question` about the processed repository.
    pub fn ask_question(&self, question: &str) -> Result<String> {
        let prompt = self.prepare_prompt(question)?.render();
        self.answerer.generate(&prompt)
    }

    fn load_index(&self, url: &str) -> Result<Arc<Index>> {
        let workdir = TempDir::new()?;
        self.fetcher.fetch(url, workdir.path())?;

        if !self.reuse_index {
            return Ok(Arc::new(self.retriever.index(workdir.path())?));
        }

        let fingerprint = repository_fingerprint(workdir.path());
        if let Some((cached_fingerprint, index)) = &self.state.read().cached {
            if *cached_fingerprint == fingerprint {
                tracing::info!("Snapshot unchanged, reusing index of {} chunks", index.len());
                return Ok(index.clone());
            }
        }

        let index = Arc::new(self.retriever.index(workdir.path())?);
        self.state.write().cached = Some((fingerprint, index.clone()));
        Ok(index)
    }
}

/// Last path segment of `url` without a trailing `.git`.
pub fn repository_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::fs;

    #[derive(Default)]
    struct RecordingAnswerer {
        prompts: Mutex<Vec<String>>,
    }

    impl Answerer for RecordingAnswerer {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok("stub answer".to_string())
        }
    }

    fn session(config: Config) -> Session<LocalPathFetcher, RecordingAnswerer> {
        Session::new(config, LocalPathFetcher, RecordingAnswerer::default())
    }

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "Demo service with token authentication.").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/auth.py"), "def authenticate(token):\n    return token").unwrap();
        dir
    }

    fn url(dir: &tempfile::TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("https://github.com/acme/widgets.git"), "widgets");
        assert_eq!(repository_name("https://github.com/acme/widgets/"), "widgets");
        assert_eq!(repository_name("widgets"), "widgets");
    }

    #[test]
    fn test_ask_before_process_is_not_indexed() {
        let session = session(Config::default());
        assert!(matches!(
            session.ask_question("anything"),
            Err(RetrievalError::NotIndexed)
        ));
        assert!(session.answerer.prompts.lock().is_empty());
    }

    #[test]
    fn test_process_then_ask() {
        let dir = repo();
        let session = session(Config::default());

        let summary = session.process_repository(&url(&dir)).unwrap();
        assert_eq!(summary.chunk_count, 2);
        assert_eq!(summary.file_type_counts.get("py"), Some(&1));
        assert_eq!(summary.file_type_counts.get("md"), Some(&1));

        let answer = session.ask_question("How does  authentication work?").unwrap();
        assert_eq!(answer, "stub answer");

        let prompts = session.answerer.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Q: How does authentication work?"));
        assert!(prompts[0].contains("src/auth.py"));
    }

    #[test]
    fn test_fetch_failure_records_nothing() {
        let session = session(Config::default());
        let err = session.process_repository("/definitely/not/here").unwrap_err();
        assert!(matches!(err, RetrievalError::Fetch { .. }));
        assert!(session.repository().is_none());
    }

    #[test]
    fn test_empty_repository_is_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(Config::default());
        assert!(matches!(
            session.process_repository(&url(&dir)),
            Err(RetrievalError::NoContent { .. })
        ));
        assert!(session.repository().is_none());
    }

    #[test]
    fn test_unchanged_snapshot_reuses_index() {
        let dir = repo();
        let session = session(Config::default());
        session.process_repository(&url(&dir)).unwrap();
        let first = session.cached_index().unwrap();

        session.ask_question("authentication").unwrap();
        assert!(Arc::ptr_eq(&first, &session.cached_index().unwrap()));

        fs::write(dir.path().join("NOTES.md"), "new notes").unwrap();
        session.ask_question("authentication").unwrap();
        assert!(!Arc::ptr_eq(&first, &session.cached_index().unwrap()));
    }

    #[test]
    fn test_reuse_disabled_keeps_no_index() {
        let dir = repo();
        let config = Config {
            reuse_index: false,
            ..Config::default()
        };
        let session = session(config);
        session.process_repository(&url(&dir)).unwrap();
        assert!(session.cached_index().is_none());
        session.ask_question("token").unwrap();
    }
}
