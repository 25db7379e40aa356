use std::io::{Seek, Write};
use std::path::Path;

use chrono::Utc;
use log::debug;
use quick_xml::escape::escape;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Book, TocEntry};
use crate::error::Result;
use crate::util::{name_based_uuid, utc_timestamp};

const NAV_HREF: &str = "nav.xhtml";
const NCX_HREF: &str = "toc.ncx";
const OPF_HREF: &str = "content.opf";

/// Write a [`Book`] to an EPUB 3 file on disk.
///
/// The package carries an OPF document, an XHTML navigation document and,
/// for older readers, an NCX table of contents.
///
/// # Example
///
/// ```no_run
/// use novelbind::{Book, Metadata, write_epub};
///
/// let mut book = Book::new();
/// book.metadata = Metadata::new("My Book").with_author("Me");
/// write_epub(&book, "output.epub")?;
/// # Ok::<(), novelbind::Error>(())
/// ```
pub fn write_epub<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_epub_to_writer(book, file)
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination.
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    // mimetype must be first and uncompressed
    let options_stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    // Same identifier in OPF and NCX
    let identifier = if book.metadata.identifier.trim().is_empty() {
        let parts = std::iter::once(book.metadata.title.as_str()).chain(book.metadata.authors.iter().map(String::as_str));
        format!("urn:uuid:{}", name_based_uuid(parts))
    } else {
        book.metadata.identifier.clone()
    };
    let modified = book
        .metadata
        .modified
        .clone()
        .unwrap_or_else(|| utc_timestamp(Utc::now()));

    zip.start_file(format!("OEBPS/{OPF_HREF}"), options_deflate)?;
    zip.write_all(generate_opf(book, &identifier, &modified).as_bytes())?;

    zip.start_file(format!("OEBPS/{NAV_HREF}"), options_deflate)?;
    zip.write_all(generate_nav(book).as_bytes())?;

    zip.start_file(format!("OEBPS/{NCX_HREF}"), options_deflate)?;
    zip.write_all(generate_ncx(book, &identifier).as_bytes())?;

    for resource in book.resources.iter().filter(|r| !is_generated(&r.href)) {
        zip.start_file(format!("OEBPS/{}", resource.href), options_deflate)?;
        zip.write_all(&resource.data)?;
    }

    zip.finish()?;
    debug!(
        "wrote EPUB with {} resources and {} spine items",
        book.resources.len(),
        book.spine.len()
    );
    Ok(())
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn is_generated(href: &str) -> bool {
    matches!(href, NAV_HREF | NCX_HREF | OPF_HREF)
}

fn language(book: &Book) -> &str {
    let language = book.metadata.language.trim();
    if language.is_empty() { "en" } else { language }
}

fn generate_opf(book: &Book, identifier: &str, modified: &str) -> String {
    let meta = &book.metadata;
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!("    <dc:identifier id=\"BookId\">{}</dc:identifier>\n", escape(identifier)));
    opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape(meta.title.as_str())));
    opf.push_str(&format!("    <dc:language>{}</dc:language>\n", escape(language(book))));

    for author in &meta.authors {
        opf.push_str(&format!("    <dc:creator>{}</dc:creator>\n", escape(author.as_str())));
    }
    for subject in &meta.subjects {
        opf.push_str(&format!("    <dc:subject>{}</dc:subject>\n", escape(subject.as_str())));
    }
    if let Some(ref description) = meta.description {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape(description.as_str())
        ));
    }

    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape(modified)
    ));
    if let Some(pages) = meta.page_count {
        opf.push_str(&format!("    <meta name=\"calculated_pages\" content=\"{pages}\"/>\n"));
    }
    let cover_id = meta
        .cover_image
        .as_deref()
        .and_then(|href| book.get_resource(href))
        .map(|r| r.id.as_str());
    if let Some(cover_id) = cover_id {
        opf.push_str(&format!("    <meta name=\"cover\" content=\"{}\"/>\n", escape(cover_id)));
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str(&format!(
        "    <item id=\"nav\" href=\"{NAV_HREF}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n"
    ));
    opf.push_str(&format!(
        "    <item id=\"ncx\" href=\"{NCX_HREF}\" media-type=\"application/x-dtbncx+xml\"/>\n"
    ));

    for resource in book.resources.iter().filter(|r| !is_generated(&r.href)) {
        let properties = resource
            .properties
            .as_deref()
            .map(|p| format!(" properties=\"{}\"", escape(p)))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
            escape(resource.id.as_str()),
            escape(resource.href.as_str()),
            escape(resource.media_type.as_str())
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for item in &book.spine {
        let linear = if item.linear { "" } else { " linear=\"no\"" };
        opf.push_str(&format!("    <itemref idref=\"{}\"{linear}/>\n", escape(item.id.as_str())));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_nav(book: &Book) -> String {
    let lang = escape(language(book));
    let mut nav = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>{title}</h1>
"#,
        title = escape(book.metadata.title.as_str()),
    );

    if book.toc.is_empty() {
        // An empty <ol> is not allowed; point at the first document instead.
        let first = book.spine.iter().find(|s| s.href != NAV_HREF).map_or("", |s| s.href.as_str());
        nav.push_str(&format!(
            "    <ol>\n      <li><a href=\"{}\">{}</a></li>\n    </ol>\n",
            escape(first),
            escape(book.metadata.title.as_str())
        ));
    } else {
        write_nav_list(&mut nav, &book.toc, 2);
    }

    nav.push_str("  </nav>\n</body>\n</html>\n");
    nav
}

fn write_nav_list(nav: &mut String, entries: &[TocEntry], indent: usize) {
    let indent_str = "  ".repeat(indent);
    nav.push_str(&format!("{indent_str}<ol>\n"));
    for entry in entries {
        nav.push_str(&format!(
            "{indent_str}  <li><a href=\"{}\">{}</a>",
            escape(entry.href.as_str()),
            escape(entry.title.as_str())
        ));
        if !entry.children.is_empty() {
            nav.push('\n');
            write_nav_list(nav, &entry.children, indent + 2);
            nav.push_str(&format!("{indent_str}  "));
        }
        nav.push_str("</li>\n");
    }
    nav.push_str(&format!("{indent_str}</ol>\n"));
}

fn generate_ncx(book: &Book, identifier: &str) -> String {
    let depth = book.toc.iter().map(TocEntry::depth).max().unwrap_or(1);
    let mut ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{depth}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
"#,
        escape(identifier),
        escape(book.metadata.title.as_str()),
    );

    let mut play_order = 1;
    for entry in &book.toc {
        write_nav_point(&mut ncx, entry, &mut play_order, 2);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, entry: &TocEntry, play_order: &mut usize, indent: usize) {
    let indent_str = "  ".repeat(indent);

    ncx.push_str(&format!(
        "{indent_str}<navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">\n"
    ));
    ncx.push_str(&format!(
        "{indent_str}  <navLabel>\n{indent_str}    <text>{}</text>\n{indent_str}  </navLabel>\n",
        escape(entry.title.as_str())
    ));
    ncx.push_str(&format!("{indent_str}  <content src=\"{}\"/>\n", escape(entry.href.as_str())));

    *play_order += 1;

    for child in &entry.children {
        write_nav_point(ncx, child, play_order, indent + 1);
    }

    ncx.push_str(&format!("{indent_str}</navPoint>\n"));
}
