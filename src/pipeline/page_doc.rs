//! Page document builder: one bitmap + overlay nodes → one XHTML page.
//!
//! Each page of the EPUB is a full-bleed page image with an absolutely
//! positioned, invisible text layer on top. The text layer is what makes the
//! book selectable and searchable; the image is what the reader actually sees.
//!
//! Output is fully deterministic: markup is emitted in a fixed order with
//! fixed three-decimal percentage formatting, so the same page input always
//! produces the same bytes. The overlay nodes arrive pre-escaped from
//! [`crate::pipeline::layout`]; this module never re-parses its own markup.

use crate::pipeline::layout::{fmt_pct, OverlayNode};

/// Everything needed to emit one page document.
#[derive(Debug)]
pub struct PageDoc {
    /// 1-indexed page number.
    pub page_number: usize,
    /// Overlay nodes in paint order. Empty for image-only pages.
    pub nodes: Vec<OverlayNode>,
    /// PNG bytes of the rendered page.
    pub image: Vec<u8>,
}

impl PageDoc {
    /// Archive path of this page's XHTML document, relative to `EPUB/`.
    pub fn document_href(&self) -> String {
        format!("pages/page_{}.xhtml", self.page_number)
    }

    /// Archive path of this page's PNG, relative to `EPUB/`.
    pub fn image_href(&self) -> String {
        format!("images/page_{}.png", self.page_number)
    }

    /// Render the page as an XHTML document.
    ///
    /// `total_pages` feeds the "Page N of M" header shown above the page.
    pub fn to_xhtml(&self, total_pages: usize) -> String {
        let n = self.page_number;
        // Rough preallocation: boilerplate plus ~160 bytes per word span.
        let mut doc = String::with_capacity(1024 + self.nodes.len() * 160);

        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str("<!DOCTYPE html>\n");
        doc.push_str(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" \
             xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
        );
        doc.push_str("<head>\n");
        doc.push_str(&format!("  <title>Page {}</title>\n", n));
        doc.push_str("  <meta charset=\"utf-8\"/>\n");
        doc.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"../styles.css\"/>\n");
        doc.push_str("</head>\n");
        doc.push_str("<body>\n");
        doc.push_str(&format!(
            "  <div class=\"page-info\">Page {} of {}</div>\n",
            n, total_pages
        ));
        doc.push_str("  <div class=\"page-container\">\n");
        doc.push_str(&format!(
            "    <img class=\"page-image\" src=\"../{}\" alt=\"Page {}\"/>\n",
            self.image_href(),
            n
        ));

        if !self.nodes.is_empty() {
            doc.push_str("    <div class=\"text-layer\">\n");
            for node in &self.nodes {
                doc.push_str(&format!(
                    "      <span class=\"text-word\" \
                     style=\"left:{}%;top:{}%;width:{}%;height:{}%;font-size:{}vh;\" \
                     data-text=\"{}\">{}</span>\n",
                    fmt_pct(node.left_pct),
                    fmt_pct(node.top_pct),
                    fmt_pct(node.width_pct),
                    fmt_pct(node.height_pct),
                    fmt_pct(node.font_size_vh),
                    node.text,
                    node.text
                ));
            }
            doc.push_str("    </div>\n");
        }

        doc.push_str("  </div>\n");
        doc.push_str("</body>\n");
        doc.push_str("</html>\n");
        doc
    }
}

/// Stylesheet shared by every page document.
///
/// The text layer is selectable but invisible: `color: transparent` hides the
/// glyphs while selection highlighting still tracks the word boxes.
pub const STYLESHEET: &str = "\
body {
  margin: 0;
  padding: 0;
  background: #ffffff;
}

.page-info {
  font-family: sans-serif;
  font-size: 0.75em;
  color: #888888;
  text-align: center;
  padding: 0.25em 0;
}

.page-container {
  position: relative;
  width: 100%;
}

.page-image {
  display: block;
  width: 100%;
  height: auto;
}

.text-layer {
  position: absolute;
  top: 0;
  left: 0;
  width: 100%;
  height: 100%;
}

.text-word {
  position: absolute;
  color: transparent;
  white-space: nowrap;
  overflow: hidden;
  cursor: text;
}

.text-word::selection {
  background: rgba(0, 100, 255, 0.3);
}

@media (prefers-color-scheme: dark) {
  body {
    background: #1a1a1a;
  }
  .page-info {
    color: #aaaaaa;
  }
}
";

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> OverlayNode {
        OverlayNode {
            text: text.to_string(),
            left_pct: 10.0,
            top_pct: 5.0,
            width_pct: 20.0,
            height_pct: 2.5,
            font_size_vh: 2.0,
        }
    }

    fn sample_doc() -> PageDoc {
        PageDoc {
            page_number: 3,
            nodes: vec![node("Hello"), node("world")],
            image: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn hrefs_follow_page_number() {
        let doc = sample_doc();
        assert_eq!(doc.document_href(), "pages/page_3.xhtml");
        assert_eq!(doc.image_href(), "images/page_3.png");
    }

    #[test]
    fn xhtml_contains_image_and_text_layer() {
        let xhtml = sample_doc().to_xhtml(10);
        assert!(xhtml.contains("<img class=\"page-image\" src=\"../images/page_3.png\""));
        assert!(xhtml.contains("Page 3 of 10"));
        assert!(xhtml.contains("class=\"text-layer\""));
        assert!(xhtml.contains(">Hello</span>"));
        assert!(xhtml.contains("data-text=\"world\""));
    }

    #[test]
    fn style_attribute_uses_three_decimal_percentages() {
        let xhtml = sample_doc().to_xhtml(10);
        assert!(xhtml
            .contains("style=\"left:10.000%;top:5.000%;width:20.000%;height:2.500%;font-size:2.000vh;\""));
    }

    #[test]
    fn image_only_page_omits_text_layer() {
        let doc = PageDoc {
            page_number: 1,
            nodes: vec![],
            image: vec![],
        };
        let xhtml = doc.to_xhtml(1);
        assert!(!xhtml.contains("text-layer"));
        assert!(xhtml.contains("page-image"));
    }

    #[test]
    fn output_is_byte_deterministic() {
        let a = sample_doc().to_xhtml(10);
        let b = sample_doc().to_xhtml(10);
        assert_eq!(a, b);
    }

    #[test]
    fn no_embedded_scripts() {
        let xhtml = sample_doc().to_xhtml(10);
        assert!(!xhtml.contains("<script"));
    }
}
