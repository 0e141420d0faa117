use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a valid .docx document: {0}")]
    InvalidDocument(String),
}

pub struct DocxReader;

impl DocxReader {
    /// Read a .docx file from disk and return its body text
    pub async fn read_file(path: &Path) -> Result<String, ParseError> {
        let bytes = fs::read(path).await.map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::read_bytes(&bytes)
    }

    /// Parse an in-memory .docx and join its body paragraphs with newlines.
    ///
    /// Only top-level paragraphs are read, in document order. Formatting is
    /// ignored; tabs and line breaks inside a paragraph are kept as `\t`/`\n`.
    /// The joined text is trimmed at both ends.
    pub fn read_bytes(bytes: &[u8]) -> Result<String, ParseError> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| ParseError::InvalidDocument(e.to_string()))?;

        let paragraphs: Vec<String> = docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
                _ => None,
            })
            .collect();

        Ok(paragraphs.join("\n").trim().to_string())
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&paragraph.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            // Hyperlinks wrap their own runs
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
