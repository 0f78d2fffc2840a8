//! Pipeline stages for PDF-to-EPUB conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ words ──▶ layout ──▶ page_doc
//! (URL/path)  (pdfium)   (group)  (pct map)  (XHTML)
//!       └───▶ render ──▶ encode ─────────────┘
//!             (pdfium)   (PNG)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]  — per-page glyph geometry via the pdfium text API; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`words`]    — group a page's glyph run into word bounding boxes (pure)
//! 4. [`render`]   — rasterise selected pages; also `spawn_blocking`
//! 5. [`encode`]   — PNG-encode each rendered `DynamicImage`
//! 6. [`layout`]   — map word boxes to percentage-of-page overlay nodes (pure)
//! 7. [`page_doc`] — one bitmap + overlay nodes → one XHTML page document (pure)
//!
//! Stages 3, 6, and 7 are deterministic pure functions over in-memory data;
//! the page document builder and the EPUB assembler consume the same overlay
//! node list — positioning is never serialised and re-parsed.

pub mod encode;
pub mod extract;
pub mod input;
pub mod layout;
pub mod page_doc;
pub mod render;
pub mod words;
