//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. The DPI-derived target width is therefore capped
//! at `max_rendered_pixels` on the longest edge, keeping memory bounded no
//! matter what the media box says.
//!
//! Rendering failures are per-page: one unreadable page becomes a
//! [`PageError::RenderFailed`] record and the rest of the document proceeds.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2EpubError};
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A rendered page bitmap, or the reason it could not be produced.
pub type RenderedPage = (usize, Result<DynamicImage, PageError>);

/// Rasterise selected pages of a PDF into images.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// One `(page_index_0based, Result<DynamicImage, PageError>)` entry per
/// requested in-range page, in the order given.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ConversionConfig,
    page_indices: &[usize],
) -> Result<Vec<RenderedPage>, Pdf2EpubError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| Pdf2EpubError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<RenderedPage>, Pdf2EpubError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| super::extract::map_open_error(e, pdf_path, password))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded for rendering: {} pages", total_pages);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            continue;
        }

        let rendered = render_one(&pages, idx, dpi, max_pixels);
        results.push((idx, rendered));
    }

    Ok(results)
}

fn render_one(
    pages: &PdfPages,
    idx: usize,
    dpi: u32,
    max_pixels: u32,
) -> Result<DynamicImage, PageError> {
    let page_number = idx + 1;

    let page = pages.get(idx as u16).map_err(|e| PageError::RenderFailed {
        page: page_number,
        detail: format!("{:?}", e),
    })?;

    // DPI sets the target size; the pixel cap bounds the longest edge.
    let target_width = (page.width().value / 72.0 * dpi as f32) as i32;
    let target_width = target_width.clamp(1, max_pixels as i32);

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageError::RenderFailed {
            page: page_number,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_number,
        image.width(),
        image.height()
    );

    Ok(image)
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2EpubError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2EpubError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2EpubError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| super::extract::map_open_error(e, pdf_path, password))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
