//! Conversion entry points: PDF in, sealed EPUB out.
//!
//! [`convert`] drives the whole pipeline: resolve input, read metadata,
//! extract glyphs, rasterise, PNG-encode with bounded concurrency, build one
//! page document per usable page, and seal the archive. Page-level failures
//! degrade or drop individual pages and are reported in
//! [`ConversionOutput::diagnostics`]; only input, document, and archive
//! failures abort the conversion.

use crate::config::ConversionConfig;
use crate::epub::EpubAssembler;
use crate::error::{PageError, Pdf2EpubError};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageSummary};
use crate::pipeline::page_doc::PageDoc;
use crate::pipeline::{encode, extract, input, layout, render, words};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF file or URL to an EPUB at `output_path`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str`   — Local file path or HTTP/HTTPS URL to a PDF
/// * `output_path` — Destination for the `.epub` file; parent directories are
///   created, and the file appears atomically (temp file + rename)
/// * `config`      — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some pages degraded or were
/// dropped (check `output.diagnostics`).
///
/// # Errors
/// Returns `Err(Pdf2EpubError)` only for fatal errors:
/// - File not found / permission denied / download failure
/// - Not a valid PDF, corrupt PDF, wrong password
/// - Zero usable pages
/// - Archive assembly or output write failure
pub async fn convert(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    let output_path = output_path.as_ref();
    info!("Starting conversion: {} → {}", input_str, output_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Extract metadata ─────────────────────────────────────────
    let metadata = render::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    if total_pages == 0 {
        return Err(Pdf2EpubError::NoPages {
            detail: "document has 0 pages".to_string(),
        });
    }

    // ── Step 3: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(Pdf2EpubError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for conversion", page_indices.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(page_indices.len());
    }

    // ── Step 4: Extract glyph geometry ───────────────────────────────────
    let extracted = extract::extract_pages(&pdf_path, config.password.as_deref(), &page_indices)
        .await?;
    let mut text_by_page: HashMap<usize, extract::PageText> = extracted
        .into_iter()
        .map(|pt| (pt.page_number, pt))
        .collect();

    // ── Step 5: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, &page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_duration_ms
    );

    // ── Step 6: Encode bitmaps, collect render failures ──────────────────
    let mut diagnostics: Vec<PageError> = Vec::new();
    let mut to_encode = Vec::new();
    for (idx, result) in rendered {
        match result {
            Ok(img) => to_encode.push((idx, img)),
            Err(e) => {
                warn!("{}", e);
                diagnostics.push(e);
            }
        }
    }
    let encoded = encode::encode_pages(to_encode, config.concurrency).await;

    // ── Step 7: Build one page document per usable page ──────────────────
    let selected_count = page_indices.len();
    let mut title = config.title.clone();
    let mut assembler = EpubAssembler::new(
        resolve_title(&mut title, &metadata, input_str),
        config.language.clone(),
    );
    let mut pages: Vec<PageSummary> = Vec::new();
    let mut degraded_pages = 0usize;

    for (idx, encode_result) in encoded {
        let page_number = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_number, selected_count);
        }

        let image = match encode_result {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_number, selected_count, e.to_string());
                }
                diagnostics.push(e);
                continue;
            }
        };

        let (nodes, summary) = match text_by_page.remove(&page_number) {
            Some(pt) => {
                let width = pt.width;
                let height = pt.height;
                let fallback_text = pt.fallback_text;
                match pt.glyphs {
                    // Layout needs a real page box; a degenerate media box
                    // degrades the page to image-only rather than dividing
                    // by zero.
                    Ok(glyphs) if width > 0.0 && height > 0.0 => {
                        let page_words = words::assemble_words(&glyphs);
                        let nodes = layout::layout_page(&page_words, width, height);
                        let summary = PageSummary {
                            page_number,
                            width,
                            height,
                            word_count: nodes.len(),
                            has_text_layer: true,
                            fallback_text: None,
                        };
                        (nodes, summary)
                    }
                    Ok(_) => {
                        let e = PageError::ExtractionFailed {
                            page: page_number,
                            detail: format!("degenerate page box: {width}x{height} pt"),
                        };
                        warn!("{}", e);
                        diagnostics.push(e);
                        degraded_pages += 1;
                        (vec![], fallback_summary(page_number, width, height, None))
                    }
                    Err(e) => {
                        warn!("{}", e);
                        if let Some(ref cb) = config.progress_callback {
                            cb.on_page_error(page_number, selected_count, e.to_string());
                        }
                        diagnostics.push(e);
                        degraded_pages += 1;
                        (
                            vec![],
                            fallback_summary(page_number, width, height, fallback_text),
                        )
                    }
                }
            }
            // No extraction record at all; ship image-only.
            None => {
                degraded_pages += 1;
                (vec![], fallback_summary(page_number, 0.0, 0.0, None))
            }
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_number, selected_count, summary.word_count);
        }

        assembler.add_page(PageDoc {
            page_number,
            nodes,
            image,
        });
        pages.push(summary);
    }

    if assembler.page_count() == 0 {
        let first_error = diagnostics
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Pdf2EpubError::NoPages {
            detail: format!(
                "all {} selected pages failed; first error: {}",
                selected_count, first_error
            ),
        });
    }

    // ── Step 8: Seal the archive, atomically ─────────────────────────────
    let assembly_start = Instant::now();
    write_archive_atomically(&assembler, output_path).await?;
    let assembly_duration_ms = assembly_start.elapsed().as_millis() as u64;

    // ── Step 9: Compute stats ────────────────────────────────────────────
    let converted_pages = pages.len();
    let dropped_pages = selected_count - converted_pages;
    let total_words: usize = pages.iter().map(|p| p.word_count).sum();

    let stats = ConversionStats {
        total_pages,
        converted_pages,
        dropped_pages,
        degraded_pages,
        total_words,
        render_duration_ms,
        assembly_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {} words, {}ms total",
        converted_pages, selected_count, total_words, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(selected_count, converted_pages);
    }

    Ok(ConversionOutput {
        epub_path: output_path.to_path_buf(),
        pages,
        metadata,
        stats,
        diagnostics,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2EpubError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, output_path, config))
}

/// Extract PDF metadata without converting content.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2EpubError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    render::extract_metadata(&pdf_path, None).await
}

/// Convert PDF bytes in memory to an EPUB at `output_path`.
///
/// Internally the library writes `bytes` to a managed [`tempfile`] and cleans
/// it up automatically on return or panic. This is the recommended API when
/// PDF data comes from a database, network stream, or in-memory buffer rather
/// than a file on disk.
pub async fn convert_from_bytes(
    bytes: &[u8],
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2EpubError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2EpubError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2EpubError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, output_path, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the EPUB title: explicit config, then PDF metadata, then file stem.
fn resolve_title(
    configured: &mut Option<String>,
    metadata: &DocumentMetadata,
    input_str: &str,
) -> String {
    if let Some(t) = configured.take() {
        return t;
    }
    if let Some(ref t) = metadata.title {
        if !t.trim().is_empty() {
            return t.clone();
        }
    }
    Path::new(input_str)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Summary for a page that ships image-only.
///
/// When a plain-text fallback survived extraction, its whitespace-split word
/// count stands in for the overlay word count, matching what the page would
/// have reported with working glyph geometry.
fn fallback_summary(
    page_number: usize,
    width: f32,
    height: f32,
    fallback_text: Option<String>,
) -> PageSummary {
    let word_count = fallback_text
        .as_deref()
        .map(|t| t.split_whitespace().count())
        .unwrap_or(0);
    PageSummary {
        page_number,
        width,
        height,
        word_count,
        has_text_layer: false,
        fallback_text,
    }
}

/// Seal the archive next to its destination, then rename into place.
///
/// The rename is what makes the output atomic: readers polling the
/// destination path never observe a half-written zip.
async fn write_archive_atomically(
    assembler: &EpubAssembler,
    output_path: &Path,
) -> Result<(), Pdf2EpubError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Pdf2EpubError::OutputWriteFailed {
                    path: output_path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = output_path.with_extension("epub.tmp");
    if let Err(e) = assembler.write_to_path(&tmp_path) {
        // Never leave a partial archive behind.
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    tokio::fs::rename(&tmp_path, output_path)
        .await
        .map_err(|e| {
            // Best effort: don't leave the temp archive behind.
            let _ = std::fs::remove_file(&tmp_path);
            Pdf2EpubError::OutputWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            }
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: Option<&str>) -> DocumentMetadata {
        DocumentMetadata {
            title: title.map(|s| s.to_string()),
            author: None,
            subject: None,
            creator: None,
            producer: None,
            creation_date: None,
            modification_date: None,
            page_count: 1,
            pdf_version: "1.7".into(),
        }
    }

    #[test]
    fn title_prefers_config_then_metadata_then_stem() {
        let mut configured = Some("Configured".to_string());
        assert_eq!(
            resolve_title(&mut configured, &meta(Some("Meta")), "/a/b/doc.pdf"),
            "Configured"
        );

        let mut none = None;
        assert_eq!(
            resolve_title(&mut none, &meta(Some("Meta")), "/a/b/doc.pdf"),
            "Meta"
        );

        let mut none = None;
        assert_eq!(
            resolve_title(&mut none, &meta(None), "/a/b/doc.pdf"),
            "doc"
        );

        let mut none = None;
        assert_eq!(
            resolve_title(&mut none, &meta(Some("   ")), "report.pdf"),
            "report"
        );
    }

    #[test]
    fn fallback_summary_counts_words_from_plain_text() {
        let s = fallback_summary(2, 612.0, 792.0, Some("lorem ipsum\n dolor ".into()));
        assert_eq!(s.word_count, 3);
        assert!(!s.has_text_layer);
        assert_eq!(s.fallback_text.as_deref(), Some("lorem ipsum\n dolor "));
    }

    #[test]
    fn fallback_summary_without_text_reports_zero_words() {
        let s = fallback_summary(4, 612.0, 792.0, None);
        assert_eq!(s.word_count, 0);
        assert!(!s.has_text_layer);
        assert!(s.fallback_text.is_none());
    }
}
