/// An assembled book, ready to be written as EPUB.
///
/// Resources keep insertion order so the manifest and the archive come out
/// the same way every time.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    pub spine: Vec<SpineItem>,
    pub toc: Vec<TocEntry>,
    pub resources: Vec<Resource>,
}

/// Book metadata (Dublin Core + extensions)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub description: Option<String>,
    /// Categories, written as `dc:subject`.
    pub subjects: Vec<String>,
    /// Estimated page count, written as the `calculated_pages` meta.
    pub page_count: Option<usize>,
    /// `dcterms:modified` timestamp; the current time when absent.
    pub modified: Option<String>,
    /// Href of the cover image resource.
    pub cover_image: Option<String>,
}

/// An item in the reading order (spine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub id: String,
    pub href: String,
    pub linear: bool,
}

/// A table of contents entry (hierarchical)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    pub children: Vec<TocEntry>,
}

/// A resource (content document, image, CSS)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
    /// EPUB 3 manifest properties, e.g. `cover-image` or `svg`.
    pub properties: Option<String>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource and return its manifest id, derived from the href.
    pub fn add_resource(
        &mut self,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) -> String {
        let href = href.into();
        let id = href_to_id(&href);
        self.add_resource_with_id(id.clone(), href, data, media_type);
        id
    }

    /// Add a resource under an explicit manifest id.
    pub fn add_resource_with_id(
        &mut self,
        id: impl Into<String>,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) -> &mut Resource {
        self.resources.push(Resource {
            id: id.into(),
            href: href.into(),
            data,
            media_type: media_type.into(),
            properties: None,
        });
        let last = self.resources.len() - 1;
        &mut self.resources[last]
    }

    /// Get a resource by href
    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.href == href)
    }

    /// Add a spine item
    pub fn add_spine_item(&mut self, id: impl Into<String>, href: impl Into<String>) {
        self.spine.push(SpineItem {
            id: id.into(),
            href: href.into(),
            linear: true,
        });
    }

    /// Number of TOC entries at every depth.
    pub fn toc_len(&self) -> usize {
        fn count(entries: &[TocEntry]) -> usize {
            entries.iter().map(|e| 1 + count(&e.children)).sum()
        }
        count(&self.toc)
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    pub fn with_page_count(mut self, pages: usize) -> Self {
        self.page_count = Some(pages);
        self
    }

    pub fn with_modified(mut self, modified: impl Into<String>) -> Self {
        self.modified = Some(modified.into());
        self
    }
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TocEntry) -> Self {
        self.children.push(child);
        self
    }

    /// Depth of this entry's subtree, 1 for a leaf.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TocEntry::depth).max().unwrap_or(0)
    }
}

pub(crate) fn href_to_id(href: &str) -> String {
    href.replace(['/', '.', ' ', '-'], "_")
}
