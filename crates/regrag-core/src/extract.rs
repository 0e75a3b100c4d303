//! Plain-text extraction for regulatory source files.
//!
//! The format is picked from the file extension. HTML, PDF and DOCX support are cargo
//! features; when one is compiled out that format extracts to an empty string so that
//! ingestion keeps going with whatever the build can read.

use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Html,
    Pdf,
    Docx,
    Plain,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        match extension_of(path).as_str() {
            "html" | "htm" | "xhtml" => Self::Html,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::Plain,
        }
    }

    /// Whether this build can read the format.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Html => cfg!(feature = "html"),
            Self::Pdf => cfg!(feature = "pdf"),
            Self::Docx => cfg!(feature = "docx"),
            Self::Plain => true,
        }
    }
}

/// Lowercased extension with a leading dot (`".pdf"`), or `""`.
pub fn extension_label(path: &Path) -> String {
    let ext = extension_of(path);
    if ext.is_empty() { ext } else { format!(".{ext}") }
}

fn extension_of(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase()
}

/// Extract text, returning `""` on any failure. Never panics on bad input.
pub fn extract(path: &Path) -> String {
    match try_extract(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "extraction failed; treating source as empty");
            String::new()
        }
    }
}

/// Extract text, surfacing the failure reason.
pub fn try_extract(path: &Path) -> Result<String> {
    let format = SourceFormat::from_path(path);
    if !format.is_supported() {
        tracing::debug!(path = %path.display(), ?format, "format support not compiled in");
        return Ok(String::new());
    }
    match format {
        SourceFormat::Html => extract_html(path),
        SourceFormat::Pdf => extract_pdf(path),
        SourceFormat::Docx => extract_docx(path),
        SourceFormat::Plain => extract_plain(path),
    }
}

fn failure(path: &Path, reason: impl ToString) -> Error {
    Error::Extraction { path: path.to_path_buf(), reason: reason.to_string() }
}

fn extract_plain(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| failure(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(feature = "html")]
fn extract_html(path: &Path) -> Result<String> {
    use html2text::render::text_renderer::TrivialDecorator;

    // Wide enough that the renderer never re-wraps paragraphs.
    const WRAP_WIDTH: usize = 10_000;
    let bytes = std::fs::read(path).map_err(|e| failure(path, e))?;
    let text = html2text::from_read_with_decorator(bytes.as_slice(), WRAP_WIDTH, TrivialDecorator::new());
    Ok(text)
}

#[cfg(not(feature = "html"))]
fn extract_html(_path: &Path) -> Result<String> {
    Ok(String::new())
}

/// `pdf-extract` can panic on malformed font encodings instead of returning an error.
#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String> {
    let owned = path.to_path_buf();
    match std::panic::catch_unwind(move || pdf_extract::extract_text_by_pages(&owned)) {
        Ok(Ok(pages)) => Ok(pages.iter().map(|page| page.trim()).collect::<Vec<_>>().join("\n")),
        Ok(Err(e)) => Err(failure(path, e)),
        Err(_) => Err(failure(path, "PDF parser panicked")),
    }
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path) -> Result<String> {
    Ok(String::new())
}

#[cfg(feature = "docx")]
fn extract_docx(path: &Path) -> Result<String> {
    use std::io::Read;

    let file = std::fs::File::open(path).map_err(|e| failure(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| failure(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| failure(path, e))?
        .read_to_string(&mut xml)
        .map_err(|e| failure(path, e))?;
    docx_paragraphs(&xml).map_err(|reason| failure(path, reason))
}

#[cfg(not(feature = "docx"))]
fn extract_docx(_path: &Path) -> Result<String> {
    Ok(String::new())
}

/// Text of every `w:p` paragraph in a WordprocessingML body, one per line.
#[cfg(feature = "docx")]
fn docx_paragraphs(xml: &str) -> std::result::Result<String, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
