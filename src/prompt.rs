//! Assembly of the single prompt string handed to the answer generator.

use std::fmt::Write;

use crate::models::{Chunk, FileTypeCounts};

/// Everything the answer generator is told about one question.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub repo_name: String,
    pub repo_url: String,
    /// Always empty for now: nothing persists between questions.
    pub conversation_history: String,
    pub question: String,
    pub documents: Vec<Chunk>,
    pub file_type_counts: FileTypeCounts,
    /// Source path of every indexed chunk, in chunk order.
    pub file_names: Vec<String>,
}

impl PromptContext {
    pub fn render(&self) -> String {
        format!(
            "\nRepo: {name} ({url}) | Conv: {conv} | Docs: {docs} | Q: {question} | FileCount: {counts} | FileNames: {files}\n\
             Instr:\n\
             1. Answer based on context/docs.\n\
             2. Focus on repo/code.\n\
             3. Consider:\n    \
             a. Purpose/features - describe.\n    \
             b. Functions/code - provide details/samples.\n    \
             c. Setup/usage - give instructions.\n\
             4. Unsure? Say \"I am not sure\".\n\
             Answer:\n",
            name = self.repo_name,
            url = self.repo_url,
            conv = self.conversation_history,
            docs = numbered_documents(&self.documents),
            question = format_question(&self.question),
            counts = render_counts(&self.file_type_counts),
            files = self.file_names.join(", "),
        )
    }
}

/// Trim and collapse every whitespace run to a single space.
pub fn format_question(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `1. <path>\n<text>` per chunk, blank line between entries.
pub fn numbered_documents(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "{}. {}\n{}", i + 1, chunk.source_path, chunk.text);
    }
    out
}

fn render_counts(counts: &FileTypeCounts) -> String {
    counts
        .iter()
        .map(|(ext, n)| format!("{ext}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
