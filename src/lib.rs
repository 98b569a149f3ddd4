//! # repo-qa
//!
//! Retrieval core for asking questions about a source repository. A
//! repository tree is chunked, indexed twice (BM25 and TF-IDF), and the
//! chunks most relevant to a question are assembled into a prompt for an
//! external answer generator.
//!
//! ## Architecture
//!
//! ```text
//!                   ┌──────────────────┐
//!                   │ Repository tree  │
//!                   └────────┬─────────┘
//!                            │ allow-listed files
//!                            ▼
//!                   ┌──────────────────┐
//!                   │ Loaders          │
//!                   │ text / ipynb /   │
//!                   │ html+xml         │
//!                   └────────┬─────────┘
//!                            │ documents
//!                            ▼
//!                   ┌──────────────────┐
//!                   │ Recursive split  │
//!                   │ 3000 / 200 chars │
//!                   └────────┬─────────┘
//!                            │ chunks (shared row order)
//!               ┌────────────┴────────────┐
//!               ▼                         ▼
//!      ┌─────────────────┐       ┌─────────────────┐
//!      │ BM25 (tantivy)  │       │ TF-IDF cosine   │
//!      └────────┬────────┘       └────────┬────────┘
//!               │ score per chunk         │ score per chunk
//!               └────────────┬────────────┘
//!                            ▼
//!                   ┌──────────────────┐
//!                   │ 0.5·lex + 0.5·vec│
//!                   │ stable sort, k   │
//!                   └────────┬─────────┘
//!                            ▼
//!                   ┌──────────────────┐
//!                   │ Prompt → Answerer│
//!                   └──────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`chunking`] - Tree walking, per-format loaders and the recursive splitter
//! - [`tokenize`] - Lowercasing word tokenizer with English stop-word removal
//! - [`search::lexical`] - In-RAM BM25 index powered by tantivy
//! - [`search::vector`] - Sparse TF-IDF model with cosine scoring
//! - [`search::hybrid`] - Weighted score fusion and top-k selection
//! - [`retrieval`] - The `index` / `search` facade and the immutable [`retrieval::Index`]
//! - [`prompt`] - Prompt context and template rendering
//! - [`session`] - Process-then-ask flow with fetcher and answerer seams
//! - [`fingerprint`] - Snapshot hashing used to reuse an unchanged index
//! - [`config`] - Environment-based configuration
//! - [`error`] - Pipeline error type

pub mod chunking;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod search;
pub mod session;
pub mod tokenize;

pub use error::{Result, RetrievalError};
pub use retrieval::{Index, Retriever};
