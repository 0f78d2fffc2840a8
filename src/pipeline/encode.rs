//! Image encoding: `DynamicImage` → PNG bytes for the EPUB archive.
//!
//! PNG is chosen over JPEG because it is lossless — rendered text must stay
//! crisp when the reader zooms, and JPEG ringing around glyph edges is very
//! visible at e-reader DPIs. Encoding is CPU-bound, so the pipeline fans
//! pages out across the blocking thread pool with `buffer_unordered` and
//! restores spine order afterwards.

use crate::error::PageError;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// PNG-encode a single rasterised page.
pub fn encode_page(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded image → {} bytes PNG", buf.len());
    Ok(buf)
}

/// PNG-encode a batch of rendered pages, up to `concurrency` at a time.
///
/// Input and output are keyed by 0-based page index; output is sorted by
/// index so downstream assembly sees pages in spine order regardless of
/// which encode task finished first.
pub async fn encode_pages(
    pages: Vec<(usize, DynamicImage)>,
    concurrency: usize,
) -> Vec<(usize, Result<Vec<u8>, PageError>)> {
    let mut encoded: Vec<(usize, Result<Vec<u8>, PageError>)> = stream::iter(pages)
        .map(|(idx, img)| async move {
            let result = tokio::task::spawn_blocking(move || encode_page(&img))
                .await
                .map_err(|e| PageError::EncodeFailed {
                    page: idx + 1,
                    detail: format!("Encode task panicked: {}", e),
                })
                .and_then(|r| {
                    r.map_err(|e| PageError::EncodeFailed {
                        page: idx + 1,
                        detail: e.to_string(),
                    })
                });
            (idx, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    encoded.sort_by_key(|(idx, _)| *idx);
    encoded
}
