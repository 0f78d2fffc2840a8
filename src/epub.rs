//! EPUB assembly: page documents + images → a sealed OCF archive.
//!
//! The assembler walks a fixed sequence of steps: `mimetype` (first entry,
//! stored uncompressed, exactly `application/epub+zip`), then
//! `META-INF/container.xml`, the package document, the navigation document,
//! the shared stylesheet, and finally one XHTML document and one PNG per page.
//! Any write failure aborts the whole archive; a partial EPUB is never
//! surfaced to the caller.
//!
//! Publication identity (a `urn:uuid:` identifier and a publication
//! timestamp shared by `dc:date` and `dcterms:modified`) is generated once
//! when the assembler is constructed. Tests inject a
//! fixed identity via [`EpubAssembler::with_identity`], which together with
//! constant zip entry timestamps makes the archive byte-reproducible.

use crate::error::Pdf2EpubError;
use crate::pipeline::layout::escape_markup;
use crate::pipeline::page_doc::{PageDoc, STYLESHEET};
use chrono::Utc;
use std::io::{Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MIMETYPE: &str = "application/epub+zip";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Builds one EPUB 3 archive from accumulated page documents.
pub struct EpubAssembler {
    title: String,
    language: String,
    identifier: String,
    modified: String,
    pages: Vec<PageDoc>,
}

impl EpubAssembler {
    /// Create an assembler with a fresh publication identity.
    pub fn new(title: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
            identifier: format!("urn:uuid:{}", Uuid::new_v4()),
            modified: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            pages: Vec::new(),
        }
    }

    /// Create an assembler with a caller-supplied identity.
    ///
    /// Used when the archive must be byte-reproducible across runs.
    pub fn with_identity(
        title: impl Into<String>,
        language: impl Into<String>,
        identifier: impl Into<String>,
        modified: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            language: language.into(),
            identifier: identifier.into(),
            modified: modified.into(),
            pages: Vec::new(),
        }
    }

    /// Queue a page for the archive. Pages are emitted in insertion order.
    pub fn add_page(&mut self, page: PageDoc) {
        self.pages.push(page);
    }

    /// Number of pages queued so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build and seal the archive at `path`.
    ///
    /// Fails with [`Pdf2EpubError::NoPages`] when no pages were queued; an
    /// EPUB without content pages would not open in most readers.
    pub fn write_to_path(&self, path: &Path) -> Result<(), Pdf2EpubError> {
        let file = std::fs::File::create(path).map_err(|e| Pdf2EpubError::Assembly {
            step: "create_archive",
            detail: format!("{}: {}", path.display(), e),
        })?;
        self.write_to(file)?;
        info!("Sealed EPUB: {} ({} pages)", path.display(), self.pages.len());
        Ok(())
    }

    /// Build and seal the archive into any `Write + Seek` destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), Pdf2EpubError> {
        if self.pages.is_empty() {
            return Err(Pdf2EpubError::NoPages {
                detail: "no pages queued for assembly".to_string(),
            });
        }

        let mut zip = ZipWriter::new(writer);

        // Constant entry timestamps keep the archive reproducible.
        let stored = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .last_modified_time(zip::DateTime::default());
        let deflated = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        // mimetype must be the first entry and must not be compressed, or
        // readers that sniff the leading bytes reject the file.
        write_entry(&mut zip, "mimetype", MIMETYPE.as_bytes(), stored, "mimetype")?;

        write_entry(
            &mut zip,
            "META-INF/container.xml",
            CONTAINER_XML.as_bytes(),
            deflated,
            "container",
        )?;

        write_entry(
            &mut zip,
            "EPUB/content.opf",
            self.package_document().as_bytes(),
            deflated,
            "package_document",
        )?;

        write_entry(
            &mut zip,
            "EPUB/nav.xhtml",
            self.nav_document().as_bytes(),
            deflated,
            "nav_document",
        )?;

        write_entry(
            &mut zip,
            "EPUB/styles.css",
            STYLESHEET.as_bytes(),
            deflated,
            "stylesheet",
        )?;

        let total = self.pages.len();
        for page in &self.pages {
            write_entry(
                &mut zip,
                &format!("EPUB/{}", page.document_href()),
                page.to_xhtml(total).as_bytes(),
                deflated,
                "page_document",
            )?;
            write_entry(
                &mut zip,
                &format!("EPUB/{}", page.image_href()),
                &page.image,
                deflated,
                "page_image",
            )?;
            debug!("Archived page {}", page.page_number);
        }

        zip.finish().map_err(|e| Pdf2EpubError::Assembly {
            step: "seal",
            detail: e.to_string(),
        })?;

        Ok(())
    }

    /// The OPF package document: metadata, manifest, spine.
    ///
    /// Each page contributes a `page_N` manifest item paired with exactly one
    /// spine itemref, so manifest and spine stay 1:1 for content documents.
    fn package_document(&self) -> String {
        let mut opf = String::new();

        opf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        opf.push_str(
            "<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\" \
             unique-identifier=\"pub-id\">\n",
        );
        opf.push_str(
            "  <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n",
        );
        opf.push_str(&format!(
            "    <dc:identifier id=\"pub-id\">{}</dc:identifier>\n",
            escape_markup(&self.identifier)
        ));
        opf.push_str(&format!(
            "    <dc:title>{}</dc:title>\n",
            escape_markup(&self.title)
        ));
        opf.push_str(&format!(
            "    <dc:language>{}</dc:language>\n",
            escape_markup(&self.language)
        ));
        opf.push_str(&format!(
            "    <dc:date>{}</dc:date>\n",
            escape_markup(&self.modified)
        ));
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{}</meta>\n",
            escape_markup(&self.modified)
        ));
        opf.push_str("  </metadata>\n");

        opf.push_str("  <manifest>\n");
        opf.push_str(
            "    <item id=\"nav\" href=\"nav.xhtml\" \
             media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        );
        opf.push_str(
            "    <item id=\"css\" href=\"styles.css\" media-type=\"text/css\"/>\n",
        );
        for page in &self.pages {
            let n = page.page_number;
            opf.push_str(&format!(
                "    <item id=\"page_{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                n,
                page.document_href()
            ));
            opf.push_str(&format!(
                "    <item id=\"img_{}\" href=\"{}\" media-type=\"image/png\"/>\n",
                n,
                page.image_href()
            ));
        }
        opf.push_str("  </manifest>\n");

        opf.push_str("  <spine>\n");
        opf.push_str("    <itemref idref=\"nav\" linear=\"no\"/>\n");
        for page in &self.pages {
            opf.push_str(&format!(
                "    <itemref idref=\"page_{}\"/>\n",
                page.page_number
            ));
        }
        opf.push_str("  </spine>\n");

        opf.push_str("</package>\n");
        opf
    }

    /// The EPUB 3 navigation document, one entry per page.
    fn nav_document(&self) -> String {
        let mut nav = String::new();

        nav.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        nav.push_str("<!DOCTYPE html>\n");
        nav.push_str(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" \
             xmlns:epub=\"http://www.idpf.org/2007/ops\">\n",
        );
        nav.push_str("<head>\n");
        nav.push_str(&format!(
            "  <title>{}</title>\n",
            escape_markup(&self.title)
        ));
        nav.push_str("  <meta charset=\"utf-8\"/>\n");
        nav.push_str("</head>\n");
        nav.push_str("<body>\n");
        nav.push_str("  <nav epub:type=\"toc\" id=\"toc\">\n");
        nav.push_str("    <h1>Contents</h1>\n");
        nav.push_str("    <ol>\n");
        for page in &self.pages {
            nav.push_str(&format!(
                "      <li><a href=\"{}\">Page {}</a></li>\n",
                page.document_href(),
                page.page_number
            ));
        }
        nav.push_str("    </ol>\n");
        nav.push_str("  </nav>\n");
        nav.push_str("</body>\n");
        nav.push_str("</html>\n");
        nav
    }
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
    step: &'static str,
) -> Result<(), Pdf2EpubError> {
    zip.start_file(name, options)
        .map_err(|e| Pdf2EpubError::Assembly {
            step,
            detail: e.to_string(),
        })?;
    zip.write_all(data).map_err(|e| Pdf2EpubError::Assembly {
        step,
        detail: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn page(n: usize, words: &[&str]) -> PageDoc {
        use crate::pipeline::layout::layout_page;
        use crate::pipeline::words::Word;

        let words: Vec<Word> = words
            .iter()
            .enumerate()
            .map(|(i, text)| Word {
                text: text.to_string(),
                x0: 10.0 + i as f32 * 50.0,
                y0: 700.0,
                x1: 50.0 + i as f32 * 50.0,
                y1: 712.0,
                size: 12.0,
                font_name: "Helvetica".to_string(),
            })
            .collect();

        PageDoc {
            page_number: n,
            nodes: layout_page(&words, 612.0, 792.0),
            image: vec![0x89, b'P', b'N', b'G', 0, 0, 0, n as u8],
        }
    }

    fn build(assembler: &EpubAssembler) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        assembler.write_to(&mut buf).unwrap();
        buf.into_inner()
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn empty_assembler_refuses_to_seal() {
        let assembler = EpubAssembler::new("Empty", "en");
        let mut buf = Cursor::new(Vec::new());
        let err = assembler.write_to(&mut buf).unwrap_err();
        assert!(matches!(err, Pdf2EpubError::NoPages { .. }));
    }

    #[test]
    fn mimetype_is_first_stored_and_exact() {
        let mut assembler = EpubAssembler::new("Book", "en");
        assembler.add_page(page(1, &["hello"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), zip::CompressionMethod::Stored);
            assert_eq!(first.size(), 20);
        }
        let content = read_entry(&mut archive, "mimetype");
        assert_eq!(content, "application/epub+zip");
    }

    #[test]
    fn container_points_at_package_document() {
        let mut assembler = EpubAssembler::new("Book", "en");
        assembler.add_page(page(1, &["x"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let container = read_entry(&mut archive, "META-INF/container.xml");
        assert!(container.contains("full-path=\"EPUB/content.opf\""));
        // The target must actually exist in the archive.
        assert!(archive.by_name("EPUB/content.opf").is_ok());
    }

    #[test]
    fn manifest_and_spine_are_paired_per_page() {
        let mut assembler = EpubAssembler::new("Book", "en");
        assembler.add_page(page(1, &["a"]));
        assembler.add_page(page(2, &["b"]));
        assembler.add_page(page(3, &[]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let opf = read_entry(&mut archive, "EPUB/content.opf");

        for n in 1..=3 {
            assert!(opf.contains(&format!(
                "<item id=\"page_{n}\" href=\"pages/page_{n}.xhtml\""
            )));
            assert!(opf.contains(&format!("<itemref idref=\"page_{n}\"/>")));
            assert!(opf.contains(&format!(
                "<item id=\"img_{n}\" href=\"images/page_{n}.png\""
            )));
            assert!(archive
                .by_name(&format!("EPUB/pages/page_{n}.xhtml"))
                .is_ok());
            assert!(archive.by_name(&format!("EPUB/images/page_{n}.png")).is_ok());
        }

        // Exactly one spine itemref per page plus the nav entry.
        assert_eq!(opf.matches("<itemref idref=\"page_").count(), 3);
        assert_eq!(opf.matches("<itemref idref=\"nav\"").count(), 1);
    }

    #[test]
    fn nav_document_lists_every_page_and_is_declared_nav() {
        let mut assembler = EpubAssembler::new("Book", "en");
        assembler.add_page(page(1, &["a"]));
        assembler.add_page(page(2, &["b"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let opf = read_entry(&mut archive, "EPUB/content.opf");
        assert!(opf.contains("properties=\"nav\""));

        let nav = read_entry(&mut archive, "EPUB/nav.xhtml");
        assert!(nav.contains("epub:type=\"toc\""));
        assert!(nav.contains("<a href=\"pages/page_1.xhtml\">Page 1</a>"));
        assert!(nav.contains("<a href=\"pages/page_2.xhtml\">Page 2</a>"));
    }

    #[test]
    fn identifier_and_modified_are_shared_and_well_formed() {
        let mut assembler = EpubAssembler::new("Book", "en");
        assembler.add_page(page(1, &["a"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let opf = read_entry(&mut archive, "EPUB/content.opf");

        assert!(opf.contains("urn:uuid:"));
        assert!(opf.contains("dcterms:modified"));
    }

    #[test]
    fn package_metadata_declares_publication_date() {
        let mut assembler = EpubAssembler::with_identity(
            "Book",
            "en",
            "urn:uuid:00000000-0000-4000-8000-000000000000",
            "2025-01-01T00:00:00Z",
        );
        assembler.add_page(page(1, &["a"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let opf = read_entry(&mut archive, "EPUB/content.opf");

        // dc:date and dcterms:modified carry the same injected timestamp.
        assert!(opf.contains("<dc:date>2025-01-01T00:00:00Z</dc:date>"));
        assert!(opf.contains(
            "<meta property=\"dcterms:modified\">2025-01-01T00:00:00Z</meta>"
        ));
    }

    #[test]
    fn title_and_language_are_escaped_into_metadata() {
        let mut assembler = EpubAssembler::new("Tom & Jerry <vol 1>", "fr");
        assembler.add_page(page(1, &["a"]));
        let bytes = build(&assembler);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let opf = read_entry(&mut archive, "EPUB/content.opf");
        assert!(opf.contains("<dc:title>Tom &amp; Jerry &lt;vol 1&gt;</dc:title>"));
        assert!(opf.contains("<dc:language>fr</dc:language>"));
    }

    #[test]
    fn seeded_identity_makes_archives_byte_identical() {
        let build_one = || {
            let mut assembler = EpubAssembler::with_identity(
                "Book",
                "en",
                "urn:uuid:00000000-0000-4000-8000-000000000000",
                "2025-01-01T00:00:00Z",
            );
            assembler.add_page(page(1, &["alpha", "beta"]));
            assembler.add_page(page(2, &["gamma"]));
            build(&assembler)
        };

        assert_eq!(build_one(), build_one());
    }

    #[test]
    fn fresh_assemblers_get_distinct_identifiers() {
        let a = EpubAssembler::new("Book", "en");
        let b = EpubAssembler::new("Book", "en");
        assert_ne!(a.identifier, b.identifier);
        assert!(a.identifier.starts_with("urn:uuid:"));
    }
}
