//! Turning a file on disk into document text.
//!
//! Loader selection is a closed set dispatched by extension: notebooks are
//! flattened cell by cell, HTML/XML has its markup stripped, and everything
//! else is read as UTF-8 text.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Extensions considered for indexing. Source code, markup, config,
/// notebook and document formats.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "py", "js", "java", "c", "cpp", "cs", "go", "rb", "php",
    "scala", "html", "htm", "xml", "json", "yaml", "yml", "ini", "toml", "cfg", "conf", "sh",
    "bash", "css", "scss", "sql", "gitignore", "dockerignore", "editorconfig", "ipynb", "ts",
    "gitattributes", "pdf", "doc", "docs", "csv", "tsx", "jsx", "cjs", "mjs", "prisma", "kt",
    "swift", "r", "rust", "rs", "dart",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    PlainText,
    Notebook,
    Markup,
}

/// Why a single file could not be turned into a document.
#[derive(Debug, Error)]
pub enum FileLoadError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("content is not valid UTF-8")]
    NotUtf8,

    #[error("file is {bytes} bytes, limit is {limit}")]
    TooLarge { bytes: u64, limit: u64 },

    #[error("malformed notebook: {0}")]
    Notebook(#[source] serde_json::Error),
}

impl Loader {
    /// Pick the loader for an allow-listed extension, or `None` if the
    /// extension is not indexed at all.
    pub fn for_extension(ext: &str) -> Option<Self> {
        if !ALLOWED_EXTENSIONS.contains(&ext) {
            return None;
        }
        Some(match ext {
            "ipynb" => Loader::Notebook,
            "html" | "htm" | "xml" => Loader::Markup,
            _ => Loader::PlainText,
        })
    }

    pub fn load(
        self,
        path: &Path,
        max_bytes: u64,
        notebook_output_chars: usize,
    ) -> Result<String, FileLoadError> {
        let bytes = std::fs::metadata(path).map_err(FileLoadError::Read)?.len();
        if bytes > max_bytes {
            return Err(FileLoadError::TooLarge {
                bytes,
                limit: max_bytes,
            });
        }

        let raw = std::fs::read(path).map_err(FileLoadError::Read)?;
        let text = String::from_utf8(raw).map_err(|_| FileLoadError::NotUtf8)?;

        match self {
            Loader::PlainText => Ok(text),
            Loader::Markup => Ok(strip_markup(&text)),
            Loader::Notebook => render_notebook(&text, notebook_output_chars),
        }
    }
}

/// Extension used for filtering and counting: the text after the last `.`
/// of the file name, lower-cased. Dotfiles such as `.gitignore` map to
/// `gitignore`.
pub fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

// ─── Notebooks ───────────────────────────────────────────

#[derive(Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    outputs: Vec<Output>,
}

#[derive(Deserialize)]
struct Output {
    #[serde(default)]
    text: Option<MultilineText>,
    #[serde(default)]
    data: Option<OutputData>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
}

#[derive(Deserialize)]
struct OutputData {
    #[serde(rename = "text/plain", default)]
    text_plain: Option<MultilineText>,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineText {
    One(String),
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::One(String::new())
    }
}

impl MultilineText {
    fn joined(&self) -> String {
        match self {
            MultilineText::One(s) => s.clone(),
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

impl Output {
    fn text(&self) -> Option<String> {
        if let Some(text) = &self.text {
            return Some(text.joined());
        }
        if let Some(plain) = self.data.as_ref().and_then(|d| d.text_plain.as_ref()) {
            return Some(plain.joined());
        }
        match (&self.ename, &self.evalue) {
            (Some(name), Some(value)) => Some(format!("{name}: {value}")),
            (Some(name), None) => Some(name.clone()),
            _ => None,
        }
    }
}

fn render_notebook(json: &str, output_chars: usize) -> Result<String, FileLoadError> {
    let notebook: Notebook = serde_json::from_str(json).map_err(FileLoadError::Notebook)?;

    let cells: Vec<String> = notebook
        .cells
        .iter()
        .map(|cell| {
            let source = remove_newlines(&cell.source.joined());
            let mut rendered = format!("'{}' cell: '{}'", cell.cell_type, source);
            if let Some(output) = cell.outputs.iter().find_map(Output::text) {
                let output: String = remove_newlines(&output).chars().take(output_chars).collect();
                rendered.push_str(&format!(" with output: '{output}'"));
            }
            rendered
        })
        .collect();

    Ok(cells.join("\n\n"))
}

fn remove_newlines(text: &str) -> String {
    text.replace(['\r', '\n'], "")
}

// ─── Markup ──────────────────────────────────────────────

/// Drop tags, comments and `<script>`/`<style>` bodies, decode the common
/// entities, and collapse whitespace on each remaining line.
fn strip_markup(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let tail = &rest[open..];

        if tail.starts_with("<!--") {
            rest = skip_past(tail, "-->");
            continue;
        }

        let lower_head: String = tail.chars().take(8).collect::<String>().to_lowercase();
        let raw_body_end = if lower_head.starts_with("<script") {
            Some("</script>")
        } else if lower_head.starts_with("<style") {
            Some("</style>")
        } else {
            None
        };

        rest = match raw_body_end {
            Some(end_tag) => skip_past_ignore_case(tail, end_tag),
            None => skip_past(tail, ">"),
        };
        // Tags separate words
        text.push(' ');
    }
    text.push_str(rest);

    decode_entities(&text)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn skip_past<'a>(text: &'a str, needle: &str) -> &'a str {
    match text.find(needle) {
        Some(pos) => &text[pos + needle.len()..],
        None => "",
    }
}

fn skip_past_ignore_case<'a>(text: &'a str, needle: &str) -> &'a str {
    // ASCII lower-casing keeps byte offsets aligned with `text`.
    match text.to_ascii_lowercase().find(needle) {
        Some(pos) => &text[pos + needle.len()..],
        None => "",
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("src/main.py")), Some("py".into()));
        assert_eq!(file_extension(Path::new("README.MD")), Some("md".into()));
        assert_eq!(file_extension(Path::new(".gitignore")), Some("gitignore".into()));
        assert_eq!(file_extension(Path::new("Makefile")), None);
        assert_eq!(file_extension(Path::new("weird.")), None);
    }

    #[test]
    fn test_loader_dispatch() {
        assert_eq!(Loader::for_extension("ipynb"), Some(Loader::Notebook));
        assert_eq!(Loader::for_extension("html"), Some(Loader::Markup));
        assert_eq!(Loader::for_extension("xml"), Some(Loader::Markup));
        assert_eq!(Loader::for_extension("py"), Some(Loader::PlainText));
        assert_eq!(Loader::for_extension("exe"), None);
        assert_eq!(Loader::for_extension("rs"), Some(Loader::PlainText));
    }

    #[test]
    fn test_render_notebook_truncates_outputs_and_strips_newlines() {
        let nb = r##"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title\n", "Intro text"]},
                {"cell_type": "code", "source": "x = 1\nprint(x)",
                 "outputs": [{"output_type": "stream", "text": ["1\n", "a much longer output line here\n"]}]}
            ]
        }"##;
        let text = render_notebook(nb, 20).unwrap();
        assert_eq!(
            text,
            "'markdown' cell: '# TitleIntro text'\n\n'code' cell: 'x = 1print(x)' with output: '1a much longer outpu'"
        );
    }

    #[test]
    fn test_render_notebook_keeps_heading_markers() {
        let nb = r##"{"cells": [{"cell_type": "markdown", "source": "# Setup"}]}"##;
        assert_eq!(render_notebook(nb, 20).unwrap(), "'markdown' cell: '# Setup'");
    }

    #[test]
    fn test_load_error_messages() {
        let err = FileLoadError::TooLarge { bytes: 64, limit: 10 };
        assert_eq!(err.to_string(), "file is 64 bytes, limit is 10");
        let read = FileLoadError::Read(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(read.to_string(), "read failed: gone");
        assert!(std::error::Error::source(&read).is_some());
        assert_eq!(FileLoadError::NotUtf8.to_string(), "content is not valid UTF-8");
    }

    #[test]
    fn test_render_notebook_uses_plain_text_data() {
        let nb = r#"{"cells": [{"cell_type": "code", "source": "2+2",
            "outputs": [{"output_type": "execute_result", "data": {"text/plain": "4"}}]}]}"#;
        assert_eq!(
            render_notebook(nb, 20).unwrap(),
            "'code' cell: '2+2' with output: '4'"
        );
    }

    #[test]
    fn test_render_notebook_rejects_garbage() {
        assert!(matches!(
            render_notebook("not json", 20),
            Err(FileLoadError::Notebook(_))
        ));
    }

    #[test]
    fn test_strip_markup() {
        let html = "<html><head><style>body { color: red; }</style>\
                    <script>var x = 1 < 2;</script></head>\
                    <body><!-- hidden --><h1>Title</h1>\n<p>Fish &amp; chips</p></body></html>";
        assert_eq!(strip_markup(html), "Title\nFish & chips");
    }

    #[test]
    fn test_load_rejects_binary_and_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let binary: PathBuf = dir.path().join("report.pdf");
        std::fs::write(&binary, [0xffu8, 0xfe, 0x00, 0x81]).unwrap();
        assert!(matches!(
            Loader::PlainText.load(&binary, 1024, 20),
            Err(FileLoadError::NotUtf8)
        ));

        let large = dir.path().join("big.txt");
        std::fs::write(&large, "a".repeat(64)).unwrap();
        assert!(matches!(
            Loader::PlainText.load(&large, 10, 20),
            Err(FileLoadError::TooLarge { bytes: 64, limit: 10 })
        ));
    }
}
