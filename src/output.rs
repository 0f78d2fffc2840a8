//! Output types returned by the conversion entry points.
//!
//! [`ConversionOutput`] is the full result of a conversion: where the EPUB
//! landed, a per-page summary, document metadata, timing stats, and the
//! structured list of page-level degradations ([`crate::error::PageError`]).
//! Everything serialises to JSON so the CLI `--json` mode and service
//! embeddings get the same view.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of a successful conversion.
///
/// "Successful" means a structurally valid EPUB was produced — individual
/// pages may still have degraded (no text layer) or been dropped (no bitmap);
/// check [`ConversionOutput::diagnostics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path of the produced `.epub` archive.
    pub epub_path: PathBuf,

    /// One summary per page that made it into the archive, in spine order.
    pub pages: Vec<PageSummary>,

    /// Metadata read from the source PDF.
    pub metadata: DocumentMetadata,

    /// Aggregate statistics.
    pub stats: ConversionStats,

    /// Structured record of every page-level degradation.
    ///
    /// Extraction failures mean the page shipped image-only; render failures
    /// mean the page is absent from the archive entirely.
    pub diagnostics: Vec<PageError>,
}

impl ConversionOutput {
    /// Number of page documents in the produced EPUB.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total words across all pages: positioned overlay words, plus
    /// fallback-text words on pages that degraded to image-only.
    pub fn total_words(&self) -> usize {
        self.pages.iter().map(|p| p.word_count).sum()
    }
}

/// Summary of one converted page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number in the source PDF.
    pub page_number: usize,

    /// Page width in PDF points.
    pub width: f32,

    /// Page height in PDF points.
    pub height: f32,

    /// Words positioned on this page's overlay, or counted from
    /// [`fallback_text`](Self::fallback_text) when positioning failed. Zero
    /// when the page genuinely has no embedded text.
    pub word_count: usize,

    /// Whether the text overlay was built from extracted glyphs.
    ///
    /// `false` means the page degraded to image-only output.
    pub has_text_layer: bool,

    /// Plain page text captured when glyph positioning failed.
    ///
    /// The words are not selectable on the page image, but the content
    /// survives here and `word_count` is derived from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_text: Option<String>,
}

/// Metadata extracted from the PDF document header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Aggregate timing and page-count statistics for one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages included in the EPUB.
    pub converted_pages: usize,
    /// Pages dropped because rasterisation or encoding failed.
    pub dropped_pages: usize,
    /// Pages that shipped image-only because text extraction failed.
    pub degraded_pages: usize,
    /// Words positioned across all converted pages.
    pub total_words: usize,
    /// Wall-clock milliseconds spent rasterising.
    pub render_duration_ms: u64,
    /// Wall-clock milliseconds spent building and sealing the archive.
    pub assembly_duration_ms: u64,
    /// Total wall-clock milliseconds for the conversion.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> ConversionOutput {
        ConversionOutput {
            epub_path: PathBuf::from("/tmp/book.epub"),
            pages: vec![
                PageSummary {
                    page_number: 1,
                    width: 612.0,
                    height: 792.0,
                    word_count: 120,
                    has_text_layer: true,
                    fallback_text: None,
                },
                PageSummary {
                    page_number: 3,
                    width: 612.0,
                    height: 792.0,
                    word_count: 2,
                    has_text_layer: false,
                    fallback_text: Some("degraded page".into()),
                },
            ],
            metadata: DocumentMetadata {
                title: Some("Sample".into()),
                author: None,
                subject: None,
                creator: None,
                producer: None,
                creation_date: None,
                modification_date: None,
                page_count: 3,
                pdf_version: "1.7".into(),
            },
            stats: ConversionStats {
                total_pages: 3,
                converted_pages: 2,
                dropped_pages: 1,
                degraded_pages: 1,
                total_words: 120,
                render_duration_ms: 10,
                assembly_duration_ms: 5,
                total_duration_ms: 20,
            },
            diagnostics: vec![PageError::RenderFailed {
                page: 2,
                detail: "bitmap failed".into(),
            }],
        }
    }

    #[test]
    fn totals_derive_from_page_summaries() {
        let out = sample_output();
        assert_eq!(out.page_count(), 2);
        assert_eq!(out.total_words(), 122);
    }

    #[test]
    fn output_round_trips_through_json() {
        let out = sample_output();
        let json = serde_json::to_string_pretty(&out).unwrap();
        let back: ConversionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page_count(), out.page_count());
        assert_eq!(back.stats.total_pages, 3);
        assert_eq!(back.diagnostics.len(), 1);
        assert_eq!(back.pages[1].fallback_text.as_deref(), Some("degraded page"));
        // Pages with a real text layer omit the field entirely.
        assert!(!json.contains("\"fallback_text\": null"));
    }
}
