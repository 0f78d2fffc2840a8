//! Word assembly: group a page's glyph run into word bounding boxes.
//!
//! Glyphs arrive in paint order from [`crate::pipeline::extract`]. A word is a
//! maximal run of consecutive non-whitespace glyphs; any glyph whose text trims
//! to empty closes the current run. The word's box is the union of its member
//! glyph boxes, and its font size and name come from the first member glyph —
//! mixed-font ligature runs keep the leading style.
//!
//! This stage is a pure function over in-memory data, so the grouping rules
//! are tested exhaustively here without touching pdfium.

use crate::pipeline::extract::Glyph;

/// A word positioned on a PDF page, in PDF point coordinates.
///
/// Coordinates use the PDF convention: origin at the bottom-left of the page,
/// `y1 > y0`. The overlay layout stage converts these to top-left percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// The word text, concatenated from member glyphs with whitespace trimmed.
    pub text: String,
    /// Left edge in PDF points.
    pub x0: f32,
    /// Bottom edge in PDF points.
    pub y0: f32,
    /// Right edge in PDF points.
    pub x1: f32,
    /// Top edge in PDF points.
    pub y1: f32,
    /// Font size in points, taken from the first glyph of the run.
    pub size: f32,
    /// Font name, taken from the first glyph of the run.
    pub font_name: String,
}

/// Accumulator for the word run currently being built.
///
/// Local to `assemble_words`; holding run state in a struct rather than loose
/// mutable variables keeps the flush logic in one place.
struct WordRun {
    text: String,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    size: f32,
    font_name: String,
}

impl WordRun {
    fn start(glyph: &Glyph, trimmed: &str) -> Self {
        Self {
            text: trimmed.to_string(),
            x0: glyph.x0,
            y0: glyph.y0,
            x1: glyph.x1,
            y1: glyph.y1,
            size: glyph.size,
            font_name: glyph.font_name.clone(),
        }
    }

    fn extend(&mut self, glyph: &Glyph, trimmed: &str) {
        self.text.push_str(trimmed);
        self.x0 = self.x0.min(glyph.x0);
        self.y0 = self.y0.min(glyph.y0);
        self.x1 = self.x1.max(glyph.x1);
        self.y1 = self.y1.max(glyph.y1);
    }

    fn finish(self) -> Word {
        Word {
            text: self.text,
            x0: self.x0,
            y0: self.y0,
            x1: self.x1,
            y1: self.y1,
            size: self.size,
            font_name: self.font_name,
        }
    }
}

/// Group a page's glyphs, in paint order, into words.
///
/// Every non-whitespace glyph belongs to exactly one word; whitespace glyphs
/// act purely as separators and carry no geometry into the output. An empty
/// glyph slice yields an empty word list.
pub fn assemble_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut run: Option<WordRun> = None;

    for glyph in glyphs {
        let trimmed = glyph.text.trim();
        if trimmed.is_empty() {
            // Whitespace closes the current run.
            if let Some(r) = run.take() {
                words.push(r.finish());
            }
            continue;
        }

        match run.as_mut() {
            Some(r) => r.extend(glyph, trimmed),
            None => run = Some(WordRun::start(glyph, trimmed)),
        }
    }

    // A page rarely ends on whitespace; flush the trailing run.
    if let Some(r) = run.take() {
        words.push(r.finish());
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Glyph {
        Glyph {
            text: text.to_string(),
            x0,
            y0,
            x1,
            y1,
            size: 12.0,
            font_name: "Helvetica".to_string(),
        }
    }

    fn glyph_with_font(text: &str, x0: f32, size: f32, font: &str) -> Glyph {
        Glyph {
            text: text.to_string(),
            x0,
            y0: 700.0,
            x1: x0 + 6.0,
            y1: 712.0,
            size,
            font_name: font.to_string(),
        }
    }

    #[test]
    fn groups_glyphs_into_words() {
        let glyphs = vec![
            glyph("H", 10.0, 700.0, 16.0, 712.0),
            glyph("i", 16.0, 700.0, 19.0, 712.0),
            glyph(" ", 19.0, 700.0, 23.0, 712.0),
            glyph("t", 23.0, 700.0, 27.0, 712.0),
            glyph("o", 27.0, 700.0, 33.0, 712.0),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hi");
        assert_eq!(words[1].text, "to");
    }

    #[test]
    fn word_box_is_union_of_member_boxes() {
        let glyphs = vec![
            glyph("A", 10.0, 700.0, 16.0, 712.0),
            glyph("y", 16.0, 697.0, 22.0, 709.0), // descender dips below
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 1);
        let w = &words[0];
        assert_eq!(w.x0, 10.0);
        assert_eq!(w.y0, 697.0);
        assert_eq!(w.x1, 22.0);
        assert_eq!(w.y1, 712.0);
    }

    #[test]
    fn whitespace_geometry_never_leaks_into_word_box() {
        // Wide space glyph whose box extends far right of the word.
        let glyphs = vec![
            glyph("a", 10.0, 700.0, 16.0, 712.0),
            glyph(" ", 16.0, 690.0, 400.0, 720.0),
            glyph("b", 30.0, 700.0, 36.0, 712.0),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].x1, 16.0);
        assert_eq!(words[1].x0, 30.0);
    }

    #[test]
    fn trailing_run_is_flushed() {
        let glyphs = vec![
            glyph("e", 10.0, 700.0, 16.0, 712.0),
            glyph("n", 16.0, 700.0, 22.0, 712.0),
            glyph("d", 22.0, 700.0, 28.0, 712.0),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "end");
    }

    #[test]
    fn leading_and_consecutive_whitespace_collapse() {
        let glyphs = vec![
            glyph(" ", 0.0, 700.0, 4.0, 712.0),
            glyph("\t", 4.0, 700.0, 8.0, 712.0),
            glyph("x", 8.0, 700.0, 14.0, 712.0),
            glyph(" ", 14.0, 700.0, 18.0, 712.0),
            glyph("\n", 18.0, 700.0, 18.0, 712.0),
            glyph("y", 20.0, 700.0, 26.0, 712.0),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "x");
        assert_eq!(words[1].text, "y");
    }

    #[test]
    fn empty_page_yields_no_words() {
        assert!(assemble_words(&[]).is_empty());
    }

    #[test]
    fn whitespace_only_page_yields_no_words() {
        let glyphs = vec![
            glyph(" ", 0.0, 0.0, 4.0, 12.0),
            glyph(" ", 4.0, 0.0, 8.0, 12.0),
        ];
        assert!(assemble_words(&glyphs).is_empty());
    }

    #[test]
    fn style_comes_from_first_glyph() {
        let glyphs = vec![
            glyph_with_font("f", 10.0, 12.0, "Times-Italic"),
            glyph_with_font("i", 16.0, 9.0, "Times-Roman"),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].size, 12.0);
        assert_eq!(words[0].font_name, "Times-Italic");
    }

    #[test]
    fn every_non_whitespace_glyph_lands_in_exactly_one_word() {
        let glyphs = vec![
            glyph("a", 0.0, 0.0, 5.0, 10.0),
            glyph("b", 5.0, 0.0, 10.0, 10.0),
            glyph(" ", 10.0, 0.0, 15.0, 10.0),
            glyph("c", 15.0, 0.0, 20.0, 10.0),
            glyph(" ", 20.0, 0.0, 25.0, 10.0),
            glyph("d", 25.0, 0.0, 30.0, 10.0),
            glyph("e", 30.0, 0.0, 35.0, 10.0),
            glyph("f", 35.0, 0.0, 40.0, 10.0),
        ];
        let words = assemble_words(&glyphs);
        let total_chars: usize = words.iter().map(|w| w.text.chars().count()).sum();
        let non_ws = glyphs.iter().filter(|g| !g.text.trim().is_empty()).count();
        assert_eq!(total_chars, non_ws);
        assert_eq!(
            words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(),
            vec!["ab", "c", "def"]
        );
    }

    #[test]
    fn repeated_runs_yield_identical_words_and_boxes() {
        let glyphs = vec![
            glyph("T", 10.0, 700.0, 17.0, 712.0),
            glyph("o", 17.0, 700.0, 23.0, 712.0),
            glyph(" ", 23.0, 700.0, 27.0, 712.0),
            glyph("b", 27.0, 697.0, 33.0, 712.0),
            glyph("e", 33.0, 700.0, 39.0, 709.0),
        ];
        let first = assemble_words(&glyphs);
        let second = assemble_words(&glyphs);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn multi_char_glyph_text_is_kept_whole() {
        // Ligature glyphs report several characters in one glyph.
        let glyphs = vec![
            glyph("ffi", 10.0, 700.0, 22.0, 712.0),
            glyph("x", 22.0, 700.0, 28.0, 712.0),
        ];
        let words = assemble_words(&glyphs);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "ffix");
    }
}
