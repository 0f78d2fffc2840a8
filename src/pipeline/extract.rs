//! Glyph extraction: pull per-character geometry from a PDF via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy text extraction.
//!
//! ## Failure granularity
//!
//! Opening the document is fatal; anything after that degrades per page. A
//! page whose text API fails still carries its dimensions (the page itself
//! opened) and an [`PageError::ExtractionFailed`] record, so the pipeline can
//! ship it image-only instead of aborting a long document over one bad page.
//! When a plain text read still succeeds on such a page, the text rides along
//! as a fallback so the page keeps its word count.

use crate::error::{PageError, Pdf2EpubError};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One character from a PDF page, with its loose bounding box.
///
/// Coordinates are PDF points with the origin at the bottom-left of the page
/// and y increasing upwards, exactly as pdfium reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// The character(s) this glyph maps to. Ligatures report several.
    pub text: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Effective font size in points (loose-bounds height).
    pub size: f32,
    /// Font name as embedded in the PDF, empty when unavailable.
    pub font_name: String,
}

/// Extracted text state for one page.
#[derive(Debug)]
pub struct PageText {
    /// 1-indexed page number in the source PDF.
    pub page_number: usize,
    /// Page width in PDF points.
    pub width: f32,
    /// Page height in PDF points.
    pub height: f32,
    /// Glyphs in paint order, or the reason extraction failed.
    pub glyphs: Result<Vec<Glyph>, PageError>,
    /// Plain page text captured when the glyph walk failed.
    ///
    /// Without geometry the words cannot be positioned, but the text itself
    /// still feeds the page's word count. `None` when the fallback read also
    /// failed or returned only whitespace.
    pub fallback_text: Option<String>,
}

impl PageText {
    /// Whether the page carries a usable glyph run.
    pub fn has_text(&self) -> bool {
        self.glyphs.is_ok()
    }
}

/// Extract glyph geometry for the selected pages.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// Returns one [`PageText`] per requested page, in the order given.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<PageText>, Pdf2EpubError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, pwd.as_deref(), &indices))
        .await
        .map_err(|e| Pdf2EpubError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of glyph extraction.
fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<PageText>, Pdf2EpubError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_open_error(e, pdf_path, password))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded for extraction: {} pages", total_pages);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            continue;
        }
        let page_number = idx + 1;

        let page = match pages.get(idx as u16) {
            Ok(p) => p,
            Err(e) => {
                results.push(PageText {
                    page_number,
                    width: 0.0,
                    height: 0.0,
                    glyphs: Err(PageError::ExtractionFailed {
                        page: page_number,
                        detail: format!("{:?}", e),
                    }),
                    fallback_text: None,
                });
                continue;
            }
        };

        let width = page.width().value;
        let height = page.height().value;

        let (glyphs, fallback_text) = match extract_page_glyphs(&page) {
            Ok(g) => {
                debug!("Page {}: {} glyphs", page_number, g.len());
                (Ok(g), None)
            }
            Err(e) => {
                // Geometry is gone; a second, plain text read still gives the
                // page a word count.
                let fallback = page
                    .text()
                    .ok()
                    .map(|t| t.all())
                    .filter(|t| !t.trim().is_empty());
                (
                    Err(PageError::ExtractionFailed {
                        page: page_number,
                        detail: e,
                    }),
                    fallback,
                )
            }
        };

        results.push(PageText {
            page_number,
            width,
            height,
            glyphs,
            fallback_text,
        });
    }

    Ok(results)
}

/// Walk one page's characters in paint order and collect their geometry.
fn extract_page_glyphs(page: &PdfPage) -> Result<Vec<Glyph>, String> {
    let text_page = page.text().map_err(|e| format!("{:?}", e))?;

    let mut glyphs = Vec::new();
    for ch in text_page.chars().iter() {
        let Some(text) = ch.unicode_string() else {
            continue;
        };

        let bounds = match ch.loose_bounds() {
            Ok(b) => b,
            Err(_) => continue, // glyph without geometry cannot be positioned
        };

        let font_name = ch.font_name();

        glyphs.push(Glyph {
            text,
            x0: bounds.left.value,
            y0: bounds.bottom.value,
            x1: bounds.right.value,
            y1: bounds.top.value,
            size: bounds.height().value,
            font_name,
        });
    }

    Ok(glyphs)
}

/// Map a pdfium document-open failure to the matching fatal error.
pub(crate) fn map_open_error(
    e: PdfiumError,
    pdf_path: &Path,
    password: Option<&str>,
) -> Pdf2EpubError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2EpubError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Pdf2EpubError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        Pdf2EpubError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}
