//! Document loading: per-extension text extraction.
//!
//! Each supported format maps to one loader variant, selected by a pure
//! extension lookup. PDF pages become separate segments; DOCX and plain text
//! produce a single segment with formatting stripped.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, Result};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// Pure extension lookup. Returns `None` for unrecognized extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }
}

/// One extracted text segment with positional metadata.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Raw extracted text.
    pub text: String,
    /// 1-based page number for paged formats, `None` otherwise.
    pub page: Option<usize>,
}

/// Load a document, producing an ordered sequence of text segments.
///
/// Fails with `UnsupportedType` for unrecognized extensions, `NotFound` when
/// the path does not exist, and `ReadError`/`ParseError` on corrupt content.
pub fn load(path: &Path) -> Result<Vec<Segment>> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("<none>");
        Error::UnsupportedType(format!(".{ext}"))
    })?;

    let segments = match format {
        DocumentFormat::Pdf => load_pdf(path)?,
        DocumentFormat::Docx => load_docx(path)?,
        DocumentFormat::PlainText => load_text(path)?,
    };

    debug!(
        "Loaded {} segment(s) from {}",
        segments.len(),
        path.display()
    );
    Ok(segments)
}

/// PDF: one segment per page.
fn load_pdf(path: &Path) -> Result<Vec<Segment>> {
    let document = lopdf::Document::load(path)
        .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))?;

    let mut segments = Vec::new();
    for (page_number, _) in document.get_pages() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|e| Error::ParseError(format!("{} page {}: {}", path.display(), page_number, e)))?;
        segments.push(Segment {
            text,
            page: Some(page_number as usize),
        });
    }

    Ok(segments)
}

/// DOCX: unzip the OOXML archive and collect text runs from document.xml.
fn load_docx(path: &Path) -> Result<Vec<Segment>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::ReadError(format!("{}: {}", path.display(), e)))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::ParseError(format!("{}: not a docx archive: {}", path.display(), e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::ParseError(format!("{}: missing document.xml: {}", path.display(), e)))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::ReadError(format!("{}: {}", path.display(), e)))?;

    Ok(vec![Segment {
        text: strip_docx_xml(&xml)?,
        page: None,
    }])
}

/// Collect character data from `w:t` runs, with paragraph ends as newlines.
fn strip_docx_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                let decoded = e
                    .unescape()
                    .map_err(|err| Error::ParseError(format!("docx text run: {err}")))?;
                text.push_str(&decoded);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(Error::ParseError(format!("docx xml: {err}"))),
        }
    }

    Ok(text)
}

/// Plain text: single segment.
fn load_text(path: &Path) -> Result<Vec<Segment>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::ReadError(format!("{}: {}", path.display(), e)))?;
    Ok(vec![Segment { text, page: None }])
}
