//! Overlay layout: map word boxes from PDF points to page percentages.
//!
//! PDF coordinates put the origin at the bottom-left with y increasing
//! upwards; CSS positioning puts it at the top-left with y increasing
//! downwards. Expressing every box as a percentage of the page lets the
//! overlay track the page image at any rendered size, so the rasterisation
//! DPI never leaks into positioning.
//!
//! All percentages are formatted to exactly three decimal places, which is
//! what makes page documents byte-reproducible across runs and platforms.

use crate::pipeline::words::Word;

/// One positioned, invisible text box on a page overlay.
///
/// All fields are percentages of the page box except `text`. `font_size_vh`
/// is the word's font size as a percentage of page height, rendered as a CSS
/// `vh`-like unit relative to the page container.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    /// Word text, markup-escaped and ready for embedding in XHTML.
    pub text: String,
    pub left_pct: f32,
    pub top_pct: f32,
    pub width_pct: f32,
    pub height_pct: f32,
    pub font_size_vh: f32,
}

/// Position a single word on the page as percentage coordinates.
///
/// The top edge is derived from the word's *top* (`y1`) in the flipped axis:
/// `top = (page_height - y1) / page_height`. Degenerate boxes (zero width or
/// height) produce zero-size nodes rather than being dropped, so the word's
/// text still participates in selection and search.
///
/// Callers must guarantee `page_width > 0` and `page_height > 0`; pages with
/// a degenerate media box are rejected upstream before layout runs.
pub fn layout_word(word: &Word, page_width: f32, page_height: f32) -> OverlayNode {
    OverlayNode {
        text: escape_markup(&word.text),
        left_pct: word.x0 / page_width * 100.0,
        top_pct: (page_height - word.y1) / page_height * 100.0,
        width_pct: (word.x1 - word.x0) / page_width * 100.0,
        height_pct: (word.y1 - word.y0) / page_height * 100.0,
        font_size_vh: word.size / page_height * 100.0,
    }
}

/// Lay out every word on a page.
pub fn layout_page(words: &[Word], page_width: f32, page_height: f32) -> Vec<OverlayNode> {
    words
        .iter()
        .map(|w| layout_word(w, page_width, page_height))
        .collect()
}

/// Escape text for embedding in XHTML attribute and element content.
///
/// Ampersand must be replaced first or it would re-escape the entities
/// produced for the other characters.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Format a percentage with the fixed three-decimal precision used in
/// every generated style attribute.
pub fn fmt_pct(value: f32) -> String {
    format!("{:.3}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32, size: f32) -> Word {
        Word {
            text: text.to_string(),
            x0,
            y0,
            x1,
            y1,
            size,
            font_name: "Helvetica".to_string(),
        }
    }

    #[test]
    fn maps_pdf_coordinates_to_percentages() {
        // US Letter: 612 x 792 pt. Word occupying the top-left quarter-inch.
        let w = word("Title", 61.2, 752.4, 122.4, 792.0, 24.0);
        let node = layout_word(&w, 612.0, 792.0);
        assert!((node.left_pct - 10.0).abs() < 1e-4);
        assert!((node.top_pct - 0.0).abs() < 1e-4);
        assert!((node.width_pct - 10.0).abs() < 1e-4);
        assert!((node.height_pct - 5.0).abs() < 1e-4);
        assert!((node.font_size_vh - (24.0 / 792.0 * 100.0)).abs() < 1e-4);
    }

    #[test]
    fn top_uses_word_top_edge_not_baseline() {
        // y1 = 700 on a 1000pt page: top is 30%, not whatever y0 would give.
        let w = word("x", 0.0, 688.0, 10.0, 700.0, 12.0);
        let node = layout_word(&w, 500.0, 1000.0);
        assert!((node.top_pct - 30.0).abs() < 1e-4);
        assert!((node.height_pct - 1.2).abs() < 1e-4);
    }

    #[test]
    fn in_bounds_words_produce_in_bounds_percentages() {
        let page_w = 612.0;
        let page_h = 792.0;
        let words = vec![
            word("a", 0.0, 0.0, 50.0, 20.0, 10.0),
            word("b", 300.0, 400.0, 350.0, 420.0, 10.0),
            word("c", 562.0, 772.0, 612.0, 792.0, 10.0),
        ];
        for node in layout_page(&words, page_w, page_h) {
            assert!(node.left_pct >= 0.0 && node.left_pct <= 100.0);
            assert!(node.top_pct >= 0.0 && node.top_pct <= 100.0);
            assert!(node.left_pct + node.width_pct <= 100.0 + 1e-3);
            assert!(node.top_pct + node.height_pct <= 100.0 + 1e-3);
        }
    }

    #[test]
    fn degenerate_box_yields_zero_size_node() {
        let w = word("dot", 100.0, 500.0, 100.0, 500.0, 8.0);
        let node = layout_word(&w, 612.0, 792.0);
        assert_eq!(node.width_pct, 0.0);
        assert_eq!(node.height_pct, 0.0);
        assert_eq!(node.text, "dot");
    }

    #[test]
    fn escapes_markup_ampersand_first() {
        assert_eq!(escape_markup("AT&T"), "AT&amp;T");
        assert_eq!(escape_markup("a<b>c"), "a&lt;b&gt;c");
        assert_eq!(escape_markup("say \"hi\""), "say &quot;hi&quot;");
        // Pre-escaped input escapes again rather than being passed through.
        assert_eq!(escape_markup("&amp;"), "&amp;amp;");
        assert_eq!(escape_markup("x < &y"), "x &lt; &amp;y");
    }

    #[test]
    fn percentages_format_to_three_decimals() {
        assert_eq!(fmt_pct(10.0), "10.000");
        assert_eq!(fmt_pct(33.33333), "33.333");
        assert_eq!(fmt_pct(0.0005), "0.001");
        assert_eq!(fmt_pct(0.0), "0.000");
    }
}
