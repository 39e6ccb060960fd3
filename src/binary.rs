//! Text extraction from uploaded binary documents.
//!
//! The pipeline's contract here is narrow: declared MIME type plus bytes
//! in, plain text out, or a typed extraction error. PDF decoding is
//! delegated to `pdf-extract`; DOCX is a zip archive whose
//! `word/document.xml` we read with `quick-xml`; legacy `.doc` gets a
//! best-effort printable-run salvage pass.

use std::io::{Cursor, Read as _};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ImportError;
use crate::model::{DocumentMetadata, ImportOptions, RawDocument};

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn extract_file(
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
    _options: &ImportOptions,
) -> Result<RawDocument, ImportError> {
    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let text = match mime.as_str() {
        "application/pdf" => pdf_to_text(bytes)?,
        DOCX_MIME => docx_to_text(bytes)?,
        "application/msword" => legacy_doc_to_text(bytes),
        "text/plain" => String::from_utf8_lossy(bytes).into_owned(),
        other => return Err(ImportError::UnsupportedType(other.to_owned())),
    };

    let body = normalize_extracted_text(&text);
    if body.is_empty() {
        return Err(ImportError::ExtractionFailed(format!(
            "no text content in {filename}"
        )));
    }

    let title = filename_stem(filename);
    tracing::debug!(
        filename = %filename,
        mime = %mime,
        body_chars = body.len(),
        "extracted file document"
    );

    Ok(RawDocument {
        title,
        metadata: DocumentMetadata::for_body(&body, None),
        body,
        excerpt: None,
        author: None,
        published_at: None,
        images: Vec::new(),
        categories: Vec::new(),
    })
}

fn pdf_to_text(bytes: &[u8]) -> Result<String, ImportError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| ImportError::ExtractionFailed(format!("pdf: {err}")))
}

fn docx_to_text(bytes: &[u8]) -> Result<String, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ImportError::ExtractionFailed(format!("docx archive: {err}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| ImportError::ExtractionFailed(format!("docx document.xml: {err}")))?
        .read_to_string(&mut xml)
        .map_err(|err| ImportError::ExtractionFailed(format!("docx read: {err}")))?;

    Ok(docx_xml_to_text(&xml))
}

/// Pull run text (`w:t`) out of WordprocessingML, one line per paragraph
/// (`w:p`) boundary.
fn docx_xml_to_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"t" => {
                in_text_run = true;
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text_run => {
                if let Ok(text) = e.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    out
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Legacy `.doc` is an OLE compound file we do not fully parse. Salvage
/// runs of printable characters; short runs are binary noise and dropped.
fn legacy_doc_to_text(bytes: &[u8]) -> String {
    const MIN_RUN: usize = 8;

    let mut out = String::new();
    let mut run = String::new();

    for &byte in bytes {
        let ch = byte as char;
        if byte >= 0x20 && byte < 0x7f {
            run.push(ch);
        } else {
            if run.trim().len() >= MIN_RUN {
                out.push_str(run.trim());
                out.push('\n');
            }
            run.clear();
        }
    }
    if run.trim().len() >= MIN_RUN {
        out.push_str(run.trim());
        out.push('\n');
    }

    out
}

/// Collapse extraction artifacts: trim lines, fold 3+ newlines into
/// paragraph breaks, keep single newlines inside a paragraph.
fn normalize_extracted_text(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.to_owned());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}

pub fn filename_stem(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let cleaned = stem.replace(['-', '_'], " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Untitled Document".to_owned()
    } else {
        cleaned.to_owned()
    }
}
