//! # novelbind
//!
//! Turn plain-text novels into EPUB 3 books, using ordered regex rules to
//! find volume and chapter headings.
//!
//! ## Pipeline
//!
//! 1. [`normalize`] decodes the raw bytes (BOM, UTF-8, or a legacy fallback
//!    such as GBK) and splits them into numbered [`Line`]s.
//! 2. A [`RuleSet`] is compiled from per-level rule lists. Each rule reads
//!    `PATTERN => TEMPLATE`; the template may refer to capture groups.
//! 3. [`recognize`] classifies every line and builds an [`Outline`], a tree
//!    of headings with their body text.
//! 4. [`assemble`] turns the outline into a [`Book`], and [`write_epub`]
//!    packages it.
//!
//! [`test_line`] uses the same classification as [`recognize`], so rules
//! can be tried on single lines before converting a whole file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use novelbind::{DecodeOptions, Metadata, RuleSet, assemble, read_text_file, recognize, write_epub};
//!
//! let text = read_text_file("novel.txt", &DecodeOptions::default())?;
//! let outline = recognize(&text.lines, &RuleSet::default())?;
//! let book = assemble(&outline, &Metadata::new("My Novel").with_author("Me"), None);
//! write_epub(&book, "novel.epub")?;
//! # Ok::<(), novelbind::Error>(())
//! ```
//!
//! ## Custom Rules
//!
//! ```
//! use novelbind::{RuleLevel, RuleSet, Verdict};
//!
//! let rules = RuleSet::compile(&[
//!     RuleLevel::new("Part", [r"^Part (\d+)$ => Part \1"]),
//!     RuleLevel::new("Chapter", [r"^(\d+)\.\s*(.+)$ => \1. \2"]),
//! ])?;
//!
//! let result = rules.classify_text("12.   The Return");
//! assert_eq!(result.verdict, Verdict::Matched);
//! assert_eq!(result.matched_level, Some(2));
//! assert_eq!(result.output_title.as_deref(), Some("12. The Return"));
//! # Ok::<(), novelbind::InvalidPatternError>(())
//! ```

pub mod book;
pub mod epub;
pub mod error;
pub mod outline;
pub mod rules;
pub mod tester;
pub mod text;
pub mod toc;
pub(crate) mod util;

pub use book::{Book, Metadata, Resource, SpineItem, TocEntry};
pub use epub::{Cover, assemble, estimate_pages, write_epub, write_epub_to_writer};
pub use error::{EncodingError, Error, InvalidPatternError, PatternFault, PreconditionError, Result};
pub use outline::{HeadingNode, Outline, recognize};
pub use rules::{RecognitionResult, RuleConfig, RuleId, RuleLevel, RuleSet, Verdict};
pub use tester::{test_line, test_line_at};
pub use text::{DecodeOptions, Line, NormalizedText, normalize, normalize_str, read_text_file};
pub use toc::{EditError, Toc, TocItem};
pub use util::MediaFormat;
