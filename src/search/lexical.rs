use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::{SimpleTokenizer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use crate::error::{Result, RetrievalError};
use crate::models::Chunk;
use crate::tokenize::tokenize;

/// Name under which the pass-through tokenizer is registered. Chunk text is
/// normalized by [`tokenize`] before it reaches tantivy, so the analyzer
/// only has to split on the spaces we joined with.
const PRETOKENIZED: &str = "pretokenized";

/// Per-thread heap for the one-shot writer.
const WRITER_HEAP_BYTES: usize = 20_000_000;

/// BM25 ranking over one chunk sequence, kept in RAM for the lifetime of an
/// [`crate::retrieval::Index`].
///
/// Scoring uses tantivy's BM25 (k1 = 1.2, b = 0.75).
pub struct LexicalIndex {
    reader: IndexReader,
    f_terms: Field,
    f_position: Field,
    doc_count: usize,
}

impl LexicalIndex {
    /// Tokenize every chunk and index it. Row `i` of every score vector is
    /// `chunks[i]`.
    pub fn build(chunks: &[Chunk]) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }

        let mut schema_builder = Schema::builder();
        let terms_indexing = TextFieldIndexing::default()
            .set_tokenizer(PRETOKENIZED)
            .set_index_option(IndexRecordOption::WithFreqs);
        let f_terms = schema_builder.add_text_field(
            "terms",
            TextOptions::default().set_indexing_options(terms_indexing),
        );
        let f_position = schema_builder.add_u64_field("position", STORED);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        index.tokenizers().register(
            PRETOKENIZED,
            TextAnalyzer::builder(SimpleTokenizer::default()).build(),
        );

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        for (position, chunk) in chunks.iter().enumerate() {
            writer.add_document(doc!(
                f_terms => tokenize(&chunk.text).join(" "),
                f_position => position as u64,
            ))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        tracing::debug!("BM25 index built over {} chunks", chunks.len());

        Ok(Self {
            reader,
            f_terms,
            f_position,
            doc_count: chunks.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    /// One BM25 score per chunk, in chunk order. Chunks sharing no term with
    /// the query score 0. Repeated query terms count once per occurrence.
    pub fn score(&self, query_tokens: &[String]) -> Result<Vec<f32>> {
        let mut scores = vec![0.0f32; self.doc_count];
        if query_tokens.is_empty() {
            return Ok(scores);
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = query_tokens
            .iter()
            .map(|token| {
                let term = Term::from_field_text(self.f_terms, token);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(self.doc_count))?;

        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let position = doc
                .get_first(self.f_position)
                .and_then(|v| v.as_u64())
                .map(|p| p as usize);
            match position {
                Some(p) if p < scores.len() => scores[p] = score,
                _ => {
                    return Err(RetrievalError::StoredPosition {
                        position,
                        rows: scores.len(),
                    })
                }
            }
        }

        Ok(scores)
    }
}
