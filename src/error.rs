//! Error types for the pdf2epub library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2EpubError`] — **Fatal**: the conversion cannot proceed at all
//!   (missing input file, corrupt PDF, archive sealing failure). Returned as
//!   `Err(Pdf2EpubError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (text extraction
//!   glitch, rasterisation error) but all other pages are fine. Collected
//!   into [`crate::output::ConversionOutput::diagnostics`] so callers can
//!   inspect partial degradation rather than losing a multi-hundred-page
//!   document to one bad page.
//!
//! Page-level failures never bubble past page granularity: a page whose text
//! extraction fails still ships as an image-only page, and a page whose
//! bitmap cannot be rendered is dropped from the output. Archive-level
//! failures always abort the whole conversion — a partial EPUB is never
//! returned.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2epub library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::ConversionOutput::diagnostics`] rather than propagated
/// here.
#[derive(Debug, Error)]
pub enum Pdf2EpubError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Extraction and rasterisation together yielded zero usable pages.
    ///
    /// Raised for zero-page (corrupt) documents and for documents where
    /// every page's bitmap failed to render. An EPUB with no content pages
    /// is never produced.
    #[error("No usable pages: {detail}")]
    NoPages { detail: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// Writing the EPUB archive failed (disk full, permissions, zip error).
    ///
    /// Always fatal: the partial archive is deleted, never returned.
    #[error("EPUB assembly failed at step '{step}': {detail}")]
    Assembly { step: &'static str, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not move the finished EPUB to its final destination.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy, or install\n\
pdfium from https://github.com/bblanchon/pdfium-binaries.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Collected in [`crate::output::ConversionOutput::diagnostics`]. The overall
/// conversion continues unless no usable pages remain.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Text/glyph extraction failed; the page ships image-only.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Rasterisation failed; the page is dropped from the output.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// PNG encoding of the rendered bitmap failed; the page is dropped.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ExtractionFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pages_display() {
        let e = Pdf2EpubError::NoPages {
            detail: "document has 0 pages".into(),
        };
        assert!(e.to_string().contains("No usable pages"));
    }

    #[test]
    fn assembly_display_names_step() {
        let e = Pdf2EpubError::Assembly {
            step: "seal_archive",
            detail: "disk full".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("seal_archive"), "got: {msg}");
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn page_error_reports_page_number() {
        let e = PageError::RenderFailed {
            page: 7,
            detail: "bitmap allocation failed".into(),
        };
        assert_eq!(e.page(), 7);
        assert!(e.to_string().contains("Page 7"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::ExtractionFailed {
            page: 2,
            detail: "malformed glyph data".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page(), 2);
    }
}
