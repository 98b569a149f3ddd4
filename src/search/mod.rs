//! Relevance signals over one chunk sequence and their fusion.

pub mod hybrid;
pub mod lexical;
pub mod vector;

pub use hybrid::rank;
pub use lexical::LexicalIndex;
pub use vector::VectorModel;
