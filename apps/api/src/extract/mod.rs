//! Document Extractor — turns an uploaded CV binary into raw text.
//!
//! Only PDF and Word-processor documents are accepted, gated on the filename
//! suffix before anything else runs. PDF text comes out of the embedded text
//! layer; DOCX is unzipped and the main document part is decoded directly.
//! Extraction never calls a remote service.

use std::io::{Cursor, Read};

use crate::errors::AppError;

/// Below this many extracted characters the document is treated as a scanned,
/// image-only PDF and the structurer is never called.
pub const MIN_EXTRACTED_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Accepts `.pdf`, `.doc`, `.docx` (case-insensitive). Anything else is a
    /// user-visible rejection with no further processing.
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") || lower.ends_with(".doc") {
            Ok(DocumentKind::Docx)
        } else {
            let extension = filename.rsplit('.').next().unwrap_or(filename);
            Err(AppError::UnsupportedFormat(extension.to_string()))
        }
    }

    /// MIME type used when forwarding raw bytes to the multimodal model.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Extracts raw text from the uploaded document.
pub fn extract_text(kind: DocumentKind, data: &[u8]) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    match kind {
        DocumentKind::Pdf => extract_pdf_text(data),
        DocumentKind::Docx => extract_docx_text(data),
    }
}

/// Rejects extractions too short to be a digital CV.
pub fn ensure_extractable(text: &str) -> Result<(), AppError> {
    if text.trim().chars().count() < MIN_EXTRACTED_CHARS {
        return Err(AppError::ScannedDocument);
    }
    Ok(())
}

fn extract_pdf_text(data: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(data)
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))
}

/// Unzips the DOCX container and decodes `word/document.xml` to plain text.
fn extract_docx_text(data: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| AppError::Validation(format!("Could not read DOCX container: {e}")))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| AppError::Validation("DOCX is missing its document part".to_string()))?
        .read_to_string(&mut document_xml)
        .map_err(|e| AppError::Validation(format!("Could not read DOCX document part: {e}")))?;

    Ok(decode_document_xml(&document_xml))
}

/// Strips WordprocessingML markup, keeping paragraph and line-break structure.
/// Field-code instructions (`w:instrText`) and tab-stop definitions (`w:tab`
/// elements inside `w:tabs`) carry no body text and are skipped.
fn decode_document_xml(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut rest = xml;
    let mut field_depth = 0usize;
    let mut tab_stop_depth = 0usize;

    while let Some(open) = rest.find('<') {
        if field_depth == 0 {
            out.push_str(&rest[..open]);
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = rest[open + 1..open + close].trim();
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or("");

        match name {
            "w:instrText" if !self_closing => {
                if closing {
                    field_depth = field_depth.saturating_sub(1);
                } else {
                    field_depth += 1;
                }
            }
            "w:tabs" if !self_closing => {
                if closing {
                    tab_stop_depth = tab_stop_depth.saturating_sub(1);
                } else {
                    tab_stop_depth += 1;
                }
            }
            // Paragraph ends and explicit breaks become newlines; tab runs become tabs.
            "w:p" if closing && field_depth == 0 => out.push('\n'),
            "w:br" | "w:cr" if !closing && field_depth == 0 => out.push('\n'),
            "w:tab" if !closing && field_depth == 0 && tab_stop_depth == 0 => out.push('\t'),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }
    if field_depth == 0 {
        out.push_str(rest);
    }

    decode_xml_entities(&out).trim().to_string()
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
