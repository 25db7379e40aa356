//! Turning an [`Outline`] into a [`Book`].
//!
//! Every heading gets its own XHTML document: the title as `<h1>` followed by
//! one `<p>` per non-blank body line. The preamble gets a document only when
//! it holds text. Navigation mirrors the outline's nesting.

use log::info;
use quick_xml::escape::escape;

use super::cover::{Cover, cover_page};
use crate::book::{Book, Metadata, TocEntry};
use crate::outline::{HeadingNode, Outline};
use crate::text::Line;
use crate::util::name_based_uuid;

/// Title used when the metadata has none.
pub const DEFAULT_BOOK_TITLE: &str = "未命名作品";

/// Language used when the metadata has none.
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Characters per estimated page.
const CHARS_PER_PAGE: usize = 800;

const STYLESHEET_HREF: &str = "style/main.css";

const DEFAULT_STYLE: &str = "body { line-height: 1.6; margin: 0 6%; }
p { text-indent: 2em; margin: 0.5em 0; }
h1 { text-align: center; margin: 1em 0; }
";

/// Rough page count: non-blank characters divided by 800, at least 1.
pub fn estimate_pages<'a>(lines: impl IntoIterator<Item = &'a Line>) -> usize {
    let chars: usize = lines.into_iter().map(|l| l.text.trim().chars().count()).sum();
    chars.div_ceil(CHARS_PER_PAGE).max(1)
}

/// Build a book from an outline.
///
/// Blank metadata fields are filled in: title and language get defaults, the
/// identifier becomes a name-based UUID of the title, authors and text, and
/// the page count is estimated. Without a cover one is generated.
pub fn assemble(outline: &Outline, metadata: &Metadata, cover: Option<&Cover>) -> Book {
    let mut book = Book::new();
    book.metadata = complete_metadata(outline, metadata);
    let language = book.metadata.language.clone();

    let style_id = book.add_resource(STYLESHEET_HREF, DEFAULT_STYLE.as_bytes().to_vec(), "text/css");
    log::debug!("stylesheet {style_id}");

    let generated;
    let cover = match cover {
        Some(cover) => cover,
        None => {
            generated = Cover::generated(&book.metadata.title);
            &generated
        }
    };
    let image_href = format!("images/cover.{}", cover.format.extension());
    let image = book.add_resource_with_id("cover-image", &image_href, cover.data.clone(), cover.format.mime_type());
    image.properties = Some("cover-image".to_string());
    book.metadata.cover_image = Some(image_href.clone());

    let page = cover_page(&format!("../{image_href}"), cover.dimensions(), &language);
    book.add_resource_with_id("cover", "text/cover.xhtml", page.into_bytes(), "application/xhtml+xml")
        .properties = Some("svg".to_string());
    book.add_spine_item("cover", "text/cover.xhtml");
    book.add_spine_item("nav", "nav.xhtml");

    let mut counter = 0;
    for root in &outline.roots {
        if let Some(entry) = add_node(&mut book, root, &language, &mut counter) {
            book.toc.push(entry);
        }
    }

    info!(
        "assembled \"{}\": {} documents, {} TOC entries",
        book.metadata.title,
        counter,
        book.toc_len()
    );
    book
}

fn complete_metadata(outline: &Outline, metadata: &Metadata) -> Metadata {
    let mut meta = metadata.clone();
    meta.title = non_blank(&meta.title).unwrap_or(DEFAULT_BOOK_TITLE).to_string();
    meta.language = non_blank(&meta.language).unwrap_or(DEFAULT_LANGUAGE).to_string();
    meta.authors = meta.authors.iter().filter_map(|a| non_blank(a)).map(str::to_string).collect();
    meta.subjects = meta.subjects.iter().filter_map(|s| non_blank(s)).map(str::to_string).collect();

    let lines = outline.lines();
    if meta.identifier.trim().is_empty() {
        let parts = std::iter::once(meta.title.as_str())
            .chain(meta.authors.iter().map(String::as_str))
            .chain(lines.iter().map(|l| l.text.as_str()));
        meta.identifier = format!("urn:uuid:{}", name_based_uuid(parts));
    }
    if meta.page_count.is_none() {
        meta.page_count = Some(estimate_pages(lines));
    }
    meta
}

fn add_node(book: &mut Book, node: &HeadingNode, language: &str, counter: &mut usize) -> Option<TocEntry> {
    if node.is_preamble() && !node.has_text() {
        return None;
    }

    *counter += 1;
    let id = format!("chapter_{:04}", *counter);
    let href = format!("text/{id}.xhtml");
    let document = chapter_document(node, language);
    book.add_resource_with_id(id.as_str(), href.as_str(), document.into_bytes(), "application/xhtml+xml");
    book.add_spine_item(id.as_str(), href.as_str());

    let mut entry = TocEntry::new(node.title.as_str(), href);
    for child in &node.children {
        if let Some(child_entry) = add_node(book, child, language, counter) {
            entry.children.push(child_entry);
        }
    }
    Some(entry)
}

fn chapter_document(node: &HeadingNode, language: &str) -> String {
    let title = escape(node.title.as_str());
    let mut body = String::new();
    for line in node.body.iter().filter(|l| !l.is_blank()) {
        body.push_str("  <p>");
        body.push_str(&escape(line.text.trim()));
        body.push_str("</p>\n");
    }
    if body.is_empty() {
        body.push_str("  <p></p>\n");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="../{STYLESHEET_HREF}"/>
</head>
<body>
  <h1>{title}</h1>
{body}</body>
</html>
"#,
        lang = escape(language),
    )
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::recognize;
    use crate::rules::RuleSet;
    use crate::text::normalize_str;

    fn outline(text: &str) -> Outline {
        recognize(&normalize_str(text), &RuleSet::default()).unwrap()
    }

    fn resource_text(book: &Book, href: &str) -> String {
        String::from_utf8(book.get_resource(href).unwrap().data.clone()).unwrap()
    }

    #[test]
    fn test_estimate_pages() {
        assert_eq!(estimate_pages(&normalize_str("")), 1);
        let lines = vec![Line::new(0, "字".repeat(800)), Line::new(1, "  x  ")];
        assert_eq!(estimate_pages(&lines), 2);
    }

    #[test]
    fn test_documents_follow_outline() {
        let outline = outline("第一卷 起\n第1章 风\n风起\n第2章 雨\n雨落");
        let book = assemble(&outline, &Metadata::new("风雨"), None);

        let spine: Vec<&str> = book.spine.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(spine, vec!["cover", "nav", "chapter_0001", "chapter_0002", "chapter_0003"]);

        assert_eq!(book.toc.len(), 1);
        assert_eq!(book.toc[0].title, "第一卷 起");
        let chapters: Vec<&str> = book.toc[0].children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(chapters, vec!["第1章 风", "第2章 雨"]);
        assert_eq!(book.toc[0].children[1].href, "text/chapter_0003.xhtml");

        let chapter = resource_text(&book, "text/chapter_0002.xhtml");
        assert!(chapter.contains("<h1>第1章 风</h1>"));
        assert!(chapter.contains("<p>风起</p>"));
        assert!(!chapter.contains("雨落"));
    }

    #[test]
    fn test_blank_preamble_is_skipped_and_text_preamble_kept() {
        let blank = assemble(&outline("\n\n第1章\nx"), &Metadata::default(), None);
        assert_eq!(blank.toc.len(), 1);

        let text = assemble(&outline("作者的话\n第1章\nx"), &Metadata::default(), None);
        assert_eq!(text.toc.len(), 2);
        assert_eq!(text.toc[0].title, "正文");
        assert!(resource_text(&text, "text/chapter_0001.xhtml").contains("<p>作者的话</p>"));
    }

    #[test]
    fn test_metadata_defaults() {
        let outline = outline("第1章\n正文内容");
        let book = assemble(&outline, &Metadata::new("  ").with_author(" "), None);
        assert_eq!(book.metadata.title, DEFAULT_BOOK_TITLE);
        assert_eq!(book.metadata.language, DEFAULT_LANGUAGE);
        assert!(book.metadata.authors.is_empty());
        assert_eq!(book.metadata.page_count, Some(1));
        assert!(book.metadata.identifier.starts_with("urn:uuid:"));

        let again = assemble(&outline, &Metadata::new("  "), None);
        assert_eq!(again.metadata.identifier, book.metadata.identifier);
    }

    #[test]
    fn test_explicit_metadata_is_kept() {
        let meta = Metadata::new("Book")
            .with_identifier("isbn:1")
            .with_page_count(42)
            .with_language("en");
        let book = assemble(&outline("Chapter 1\nx"), &meta, None);
        assert_eq!(book.metadata.identifier, "isbn:1");
        assert_eq!(book.metadata.page_count, Some(42));
        assert_eq!(book.metadata.language, "en");
    }

    #[test]
    fn test_cover_generated_or_supplied() {
        let generated = assemble(&outline("x"), &Metadata::new("T"), None);
        assert_eq!(generated.metadata.cover_image.as_deref(), Some("images/cover.svg"));
        let image = generated.get_resource("images/cover.svg").unwrap();
        assert_eq!(image.properties.as_deref(), Some("cover-image"));

        let supplied = Cover::new("c.jpg", vec![0xFF, 0xD8, 0xFF]);
        let book = assemble(&outline("x"), &Metadata::new("T"), Some(&supplied));
        assert_eq!(book.metadata.cover_image.as_deref(), Some("images/cover.jpg"));
        assert_eq!(book.get_resource("images/cover.jpg").unwrap().media_type, "image/jpeg");
    }

    #[test]
    fn test_text_is_escaped() {
        let book = assemble(&outline("Chapter 1 <A & B>\n1 < 2"), &Metadata::new("T"), None);
        let chapter = resource_text(&book, "text/chapter_0001.xhtml");
        assert!(chapter.contains("<h1>Chapter 1 &lt;A &amp; B&gt;</h1>"));
        assert!(chapter.contains("<p>1 &lt; 2</p>"));
    }
}
