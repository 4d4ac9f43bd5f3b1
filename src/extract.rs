//! Best-effort text extraction for uploaded documents.
//!
//! Dispatch is by file extension: `pdf` concatenates per-page text, `docx` joins paragraph
//! runs with newlines, `txt` is read verbatim. Any other extension yields empty text rather
//! than an error, so the document still flows through ingestion with zero chunks.

use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

/// Errors raised while extracting text from a document on disk.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the file from disk failed.
    #[error("failed to read document {path}: {source}")]
    Io {
        /// Path of the document that could not be read.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// The PDF document could not be loaded.
    #[error("failed to load PDF {path}: {source}")]
    Pdf {
        /// Path of the failing document.
        path: PathBuf,
        /// Error raised by the PDF parser.
        #[source]
        source: lopdf::Error,
    },
    /// The DOCX container could not be opened or lacked a document body.
    #[error("failed to open DOCX archive {path}: {source}")]
    DocxArchive {
        /// Path of the failing document.
        path: PathBuf,
        /// Error raised by the archive reader.
        #[source]
        source: zip::result::ZipError,
    },
    /// The DOCX document body could not be parsed.
    #[error("failed to parse DOCX body in {path}: {source}")]
    DocxBody {
        /// Path of the failing document.
        path: PathBuf,
        /// Error raised by the XML reader.
        #[source]
        source: quick_xml::Error,
    },
}

/// Extract the text content of the document at `path`.
///
/// Unrecognized extensions produce empty text; extraction inside a recognized format is
/// best-effort (a PDF page that yields no text contributes nothing).
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => extract_pdf(path),
        Some("docx") => extract_docx(path),
        Some("txt") => std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }),
        other => {
            tracing::debug!(path = %path.display(), extension = ?other, "Unsupported extension; extracting no text");
            Ok(String::new())
        }
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let document = lopdf::Document::load(path).map_err(|source| ExtractError::Pdf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    page = page_number,
                    error = %err,
                    "Skipping page with unextractable text"
                );
            }
        }
    }
    Ok(text)
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractError::DocxArchive {
        path: path.to_path_buf(),
        source,
    })?;
    let mut body = Vec::new();
    archive
        .by_name("word/document.xml")
        .map_err(|source| ExtractError::DocxArchive {
            path: path.to_path_buf(),
            source,
        })?
        .read_to_end(&mut body)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_docx_body(&body).map_err(|source| ExtractError::DocxBody {
        path: path.to_path_buf(),
        source,
    })
}

/// Collect the `w:t` runs from a DOCX document body, one line per paragraph.
fn parse_docx_body(body: &[u8]) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) if element.name().as_ref() == b"w:t" => in_run = true,
            Event::End(element) => match element.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(run) if in_run => {
                text.push_str(&run.unescape()?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
