use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ErrorContext, SatPrepError, SatPrepResult};
use crate::log_processing_start;

/// Plain text of a single PDF page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based position in the page tree
    pub page_number: u32,
    pub text: String,
}

/// Native PDF text extractor.
///
/// lopdf parses and validates the file; pdf-extract renders each page to
/// text, which covers CID (Type0 / Identity-H) fonts with ToUnicode maps.
/// Holds no state; every call parses the payload from scratch and drops the
/// parsed document before returning.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the whole document as one string, pages concatenated in order.
    /// A PDF with zero pages yields an empty string.
    ///
    /// Page text keeps the line breaks pdf-extract derives from the layout,
    /// so two one-line pages come back as separate lines, not one run of text.
    pub fn extract(&self, document: &[u8]) -> SatPrepResult<String> {
        let pages = self.extract_pages(document)?;
        Ok(pages.into_iter().map(|page| page.text).collect())
    }

    /// Extract text page by page, in page order
    pub fn extract_pages(&self, document: &[u8]) -> SatPrepResult<Vec<PageText>> {
        let mut doc = Document::load_mem(document)
            .map_err(|e| SatPrepError::document_parse_with_source("Failed to load PDF", e))?;

        let page_count = doc.get_pages().len();
        debug!("PDF has {} pages", page_count);
        if page_count == 0 {
            return Ok(Vec::new());
        }

        let bytes: Cow<[u8]> = if expand_text_shorthands(&mut doc) {
            let mut rewritten = Vec::with_capacity(document.len());
            doc.save_to(&mut rewritten)
                .map_err(|e| SatPrepError::document_parse_with_source("Failed to rewrite page content", e))?;
            Cow::Owned(rewritten)
        } else {
            Cow::Borrowed(document)
        };
        drop(doc);

        // pdf-extract panics on some malformed content streams
        let texts = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .map_err(|_| SatPrepError::document_parse("Page content could not be decoded"))?
            .map_err(|e| SatPrepError::document_parse_with_source("Failed to extract text", e))?;

        if texts.len() != page_count {
            warn!("Page tree lists {} pages, extracted {}", page_count, texts.len());
        }

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| PageText {
                page_number: index as u32 + 1,
                text,
            })
            .collect())
    }

    /// Read a PDF from disk and extract it
    pub fn extract_file<P: AsRef<Path>>(&self, pdf_path: P) -> SatPrepResult<String> {
        let path = pdf_path.as_ref();
        let bytes = std::fs::read(path).with_path(path)?;
        log_processing_start!(path.display(), bytes.len());

        let text = self.extract(&bytes)?;
        info!("✅ Extracted {} characters from {}", text.chars().count(), path.display());
        Ok(text)
    }
}

/// Convenience wrapper around [`PdfTextExtractor::extract`]
pub fn extract(document: &[u8]) -> SatPrepResult<String> {
    PdfTextExtractor::new().extract(document)
}

/// Rewrite `'` and `"` on every page as the `T*` / `Tj` sequence they stand
/// for. Returns whether any page changed.
fn expand_text_shorthands(doc: &mut Document) -> bool {
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    let mut changed = false;

    for page_id in page_ids {
        let Ok(raw) = doc.get_page_content(page_id) else {
            continue;
        };
        let Ok(content) = Content::decode(&raw) else {
            continue;
        };
        if !content
            .operations
            .iter()
            .any(|op| op.operator == "'" || op.operator == "\"")
        {
            continue;
        }

        let operations: Vec<Operation> = content.operations.into_iter().flat_map(expand_shorthand).collect();
        let Ok(encoded) = (Content { operations }).encode() else {
            continue;
        };
        match doc.change_page_content(page_id, encoded) {
            Ok(()) => changed = true,
            Err(e) => warn!("Could not rewrite content of page {:?}: {}", page_id, e),
        }
    }

    changed
}

fn expand_shorthand(op: Operation) -> Vec<Operation> {
    let Operation { operator, operands } = op;
    let expanded = match operator.as_str() {
        "'" => <[Object; 1]>::try_from(operands)
            .map(|[text]| vec![Operation::new("T*", vec![]), Operation::new("Tj", vec![text])]),
        "\"" => <[Object; 3]>::try_from(operands).map(|[word_spacing, char_spacing, text]| {
            vec![
                Operation::new("Tw", vec![word_spacing]),
                Operation::new("Tc", vec![char_spacing]),
                Operation::new("T*", vec![]),
                Operation::new("Tj", vec![text]),
            ]
        }),
        _ => Err(operands),
    };
    expanded.unwrap_or_else(|operands| vec![Operation { operator, operands }])
}
