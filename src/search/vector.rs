use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, RetrievalError};
use crate::models::Chunk;
use crate::tokenize::tokenize;

/// Sparse term-weight vector: `(term index, weight)` sorted by term index.
type SparseVector = Vec<(usize, f32)>;

/// TF-IDF vector space fitted over one chunk sequence.
///
/// Term frequency is sublinear (`1 + ln tf`), IDF is smoothed
/// (`ln((1 + n) / (1 + df)) + 1`), and every row is L2-normalized so cosine
/// similarity reduces to a dot product. The space belongs to the corpus it
/// was fitted on; a different chunk set needs a fresh fit.
pub struct VectorModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl VectorModel {
    pub fn fit(chunks: &[Chunk]) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }

        let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();

        // Vocabulary in sorted term order
        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        let counts: Vec<HashMap<usize, usize>> = tokenized
            .iter()
            .map(|tokens| term_counts(tokens, &vocabulary))
            .collect();
        for row in &counts {
            for &term in row.keys() {
                doc_freq[term] += 1;
            }
        }

        let n = chunks.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let rows = counts.iter().map(|row| weigh(row, &idf)).collect();

        tracing::debug!(
            "TF-IDF model fitted: {} chunks, {} terms",
            chunks.len(),
            vocabulary.len()
        );

        Ok(Self {
            vocabulary,
            idf,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Cosine similarity between the raw `query` and every chunk, in chunk
    /// order. Query terms outside the fitted vocabulary are ignored.
    pub fn score(&self, query: &str) -> Vec<f32> {
        let query_vector = self.transform(query);
        if query_vector.is_empty() {
            return vec![0.0; self.rows.len()];
        }

        let query_weights: HashMap<usize, f32> = query_vector.into_iter().collect();
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|(term, w)| query_weights.get(term).map(|q| q * w))
                    .sum::<f32>()
            })
            .collect()
    }

    /// Project text into the fitted space.
    fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        weigh(&term_counts(&tokens, &self.vocabulary), &self.idf)
    }
}

fn term_counts(tokens: &[String], vocabulary: &HashMap<String, usize>) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        if let Some(&term) = vocabulary.get(token) {
            *counts.entry(term).or_insert(0) += 1;
        }
    }
    counts
}

/// Sublinear TF times IDF, L2-normalized.
fn weigh(counts: &HashMap<usize, usize>, idf: &[f32]) -> SparseVector {
    let mut vector: SparseVector = counts
        .iter()
        .map(|(&term, &tf)| (term, (1.0 + (tf as f32).ln()) * idf[term]))
        .collect();
    vector.sort_by_key(|(term, _)| *term);

    let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
    vector
}
