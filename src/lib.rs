//! # pdf2epub
//!
//! Convert PDF documents to EPUB with an invisible, selectable text layer.
//!
//! ## Why this crate?
//!
//! Reflowing PDF content into EPUB markup destroys layout — multi-column
//! text, tables, figures, and math come out garbled or out of reading order.
//! Instead this crate rasterises each page into a PNG that is shown exactly
//! as designed, then overlays the PDF's own embedded text as invisible,
//! percentage-positioned word boxes. The result looks like the PDF and
//! behaves like an ebook: text can be selected, searched, and copied, and
//! the overlay tracks the page image at any display size.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   per-glyph geometry via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Words     group glyphs into word bounding boxes
//!  ├─ 4. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 5. Encode    PNG-encode bitmaps, bounded concurrency
//!  ├─ 6. Layout    map word boxes to percentage-of-page overlay nodes
//!  ├─ 7. Pages     one XHTML document per page (image + text layer)
//!  └─ 8. Assemble  sealed OCF archive (mimetype, container, OPF, nav, pages)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2epub::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", "document.epub", &config).await?;
//!     println!(
//!         "{} pages, {} words → {}",
//!         output.page_count(),
//!         output.total_words(),
//!         output.epub_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Page-level failures never abort a conversion: a page whose text extraction
//! fails ships image-only, a page whose rasterisation fails is dropped, and
//! both are recorded in [`ConversionOutput::diagnostics`]. Input, document,
//! and archive failures are fatal and return [`Pdf2EpubError`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2epub` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2epub = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod epub;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect};
pub use epub::EpubAssembler;
pub use error::{PageError, Pdf2EpubError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageSummary};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
