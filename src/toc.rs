//! Flat, editable table of contents.
//!
//! Recognition gets most headings right; the rest are fixed by hand here:
//! add a heading at a line, delete one, rename one, or swap titles between
//! neighbours of the same level. The edited list is turned back into an
//! [`Outline`] through the same builder the recognizer uses.

use serde::Serialize;
use thiserror::Error;

use crate::error::PreconditionError;
use crate::outline::{Outline, OutlineBuilder};
use crate::rules::RuleId;
use crate::text::Line;

/// Errors from editing a [`Toc`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("line {line} out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("no TOC item at index {index} ({len} items)")]
    ItemOutOfRange { index: usize, len: usize },

    #[error("line {line} already starts \"{title}\"")]
    LineTaken { line: usize, title: String },

    #[error("heading level must be at least 1")]
    InvalidLevel,

    #[error("at least one TOC item must remain")]
    LastItem,

    #[error("titles can only be swapped between items of the same level")]
    LevelMismatch,
}

/// One heading with its inclusive line range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub title: String,
    pub start_line: usize,
    pub end_line: usize,
    pub level: usize,
    pub level_name: String,
    pub rule: Option<RuleId>,
}

/// Headings of a document, sorted by start line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Toc {
    items: Vec<TocItem>,
    line_count: usize,
}

impl Toc {
    /// An empty TOC over a document of `line_count` lines.
    pub fn new(line_count: usize) -> Self {
        Self {
            items: Vec::new(),
            line_count,
        }
    }

    pub fn from_outline(outline: &Outline) -> Self {
        let items = outline
            .headings()
            .into_iter()
            .map(|node| TocItem {
                title: node.title.clone(),
                start_line: node.start_line,
                end_line: node.start_line,
                level: node.level,
                level_name: node.level_name.clone(),
                rule: node.rule,
            })
            .collect();
        let mut toc = Self {
            items,
            line_count: outline.line_count,
        };
        toc.recompute_ranges();
        toc
    }

    pub fn items(&self) -> &[TocItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Add a heading starting at `start_line`. A blank title becomes
    /// `<level_name><n>`, n counting items of that level. Returns the new
    /// item's index.
    pub fn insert(
        &mut self,
        start_line: usize,
        level: usize,
        level_name: &str,
        title: &str,
    ) -> Result<usize, EditError> {
        if start_line >= self.line_count {
            return Err(EditError::LineOutOfRange {
                line: start_line,
                len: self.line_count,
            });
        }
        if level == 0 {
            return Err(EditError::InvalidLevel);
        }
        if let Some(taken) = self.items.iter().find(|i| i.start_line == start_line) {
            return Err(EditError::LineTaken {
                line: start_line,
                title: taken.title.clone(),
            });
        }

        let same_level = self.items.iter().filter(|i| i.level == level).count();
        self.items.push(TocItem {
            title: title_or(title, || format!("{level_name}{}", same_level + 1)),
            start_line,
            end_line: start_line,
            level,
            level_name: level_name.to_string(),
            rule: None,
        });
        self.recompute_ranges();
        Ok(self
            .items
            .iter()
            .position(|i| i.start_line == start_line)
            .unwrap_or(self.items.len() - 1))
    }

    /// Delete an item. The last remaining item cannot be deleted.
    pub fn remove(&mut self, index: usize) -> Result<TocItem, EditError> {
        self.check_index(index)?;
        if self.items.len() == 1 {
            return Err(EditError::LastItem);
        }
        let removed = self.items.remove(index);
        self.recompute_ranges();
        Ok(removed)
    }

    /// Rename an item. A blank title becomes `<level_name><index + 1>`.
    pub fn rename(&mut self, index: usize, title: &str) -> Result<(), EditError> {
        self.check_index(index)?;
        let item = &mut self.items[index];
        item.title = title_or(title, || format!("{}{}", item.level_name, index + 1));
        Ok(())
    }

    /// Swap the titles of item `index` and its neighbour at `index + offset`.
    /// Both must be at the same level.
    pub fn swap_titles(&mut self, index: usize, offset: isize) -> Result<(), EditError> {
        self.check_index(index)?;
        let target = index
            .checked_add_signed(offset)
            .filter(|t| *t < self.items.len())
            .ok_or(EditError::ItemOutOfRange {
                index: index.wrapping_add_signed(offset),
                len: self.items.len(),
            })?;
        if self.items[index].level != self.items[target].level {
            return Err(EditError::LevelMismatch);
        }
        let title = std::mem::take(&mut self.items[index].title);
        self.items[index].title = std::mem::replace(&mut self.items[target].title, title);
        Ok(())
    }

    /// Rebuild the outline of `lines` with these headings.
    pub fn to_outline(&self, lines: &[Line], preamble_title: &str) -> Result<Outline, PreconditionError> {
        let mut builder = OutlineBuilder::new(preamble_title);
        let mut items = self.items.iter().peekable();

        for (expected, line) in lines.iter().enumerate() {
            if line.index != expected {
                return Err(PreconditionError::NonDenseLines {
                    expected,
                    found: line.index,
                });
            }
            match items.next_if(|item| item.start_line == line.index) {
                Some(item) => builder.heading(
                    line.clone(),
                    item.level,
                    &item.level_name,
                    item.rule,
                    item.title.clone(),
                ),
                None => builder.body(line.clone()),
            }
        }

        if let Some(item) = items.next() {
            return Err(PreconditionError::LineOutOfRange {
                index: item.start_line,
                len: lines.len(),
            });
        }
        Ok(builder.finish())
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(EditError::ItemOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    /// Sort by start line, then level; each item ends just before the next
    /// later start, the last one at the end of the document.
    fn recompute_ranges(&mut self) {
        self.items.sort_by_key(|i| (i.start_line, i.level));
        let last_line = self.line_count.saturating_sub(1);
        let mut next_start: Option<usize> = None;
        for i in (0..self.items.len()).rev() {
            let start = self.items[i].start_line;
            if i + 1 < self.items.len() && self.items[i + 1].start_line > start {
                next_start = Some(self.items[i + 1].start_line);
            }
            self.items[i].end_line = next_start.map_or(last_line, |s| s - 1).max(start);
        }
    }
}

fn title_or(title: &str, fallback: impl FnOnce() -> String) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::recognize;
    use crate::rules::RuleSet;
    use crate::text::normalize_str;

    const TEXT: &str = "第一卷 开端\n序\n第1章 风\n风起\n第2章 雨\n雨落\n\n雨停\n第二卷 远行\n第3章 山\n山高";

    fn sample() -> (Vec<Line>, Outline) {
        let lines = normalize_str(TEXT);
        let outline = recognize(&lines, &RuleSet::default()).unwrap();
        (lines, outline)
    }

    fn titles(toc: &Toc) -> Vec<&str> {
        toc.items().iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_ranges_follow_next_start() {
        let (_, outline) = sample();
        let toc = outline.toc();
        let ranges: Vec<(usize, usize)> = toc.items().iter().map(|i| (i.start_line, i.end_line)).collect();
        assert_eq!(ranges, vec![(0, 1), (2, 3), (4, 7), (8, 8), (9, 10)]);
        assert_eq!(toc.items()[0].level_name, "卷");
        assert_eq!(toc.items()[1].level, 2);
    }

    #[test]
    fn test_ranges_skip_items_sharing_a_start() {
        let item = |start_line, level| TocItem {
            title: format!("{start_line}/{level}"),
            start_line,
            end_line: start_line,
            level,
            level_name: "章".to_string(),
            rule: None,
        };
        let mut toc = Toc {
            items: vec![item(5, 2), item(0, 1), item(5, 1), item(0, 2), item(9, 1)],
            line_count: 12,
        };
        toc.recompute_ranges();

        let ranges: Vec<(usize, usize, usize)> =
            toc.items().iter().map(|i| (i.start_line, i.level, i.end_line)).collect();
        assert_eq!(ranges, vec![(0, 1, 4), (0, 2, 4), (5, 1, 8), (5, 2, 8), (9, 1, 11)]);
    }

    #[test]
    fn test_insert_manual_heading() {
        let (lines, outline) = sample();
        let mut toc = outline.toc();

        let index = toc.insert(6, 2, "章", "  ").unwrap();
        assert_eq!(index, 3);
        assert_eq!(toc.items()[3].title, "章4");
        assert_eq!(toc.items()[3].rule, None);
        assert_eq!(toc.items()[2].end_line, 5);

        let rebuilt = toc.to_outline(&lines, "正文").unwrap();
        assert_eq!(rebuilt.roots[0].children.len(), 3);
        let cloned: Vec<Line> = rebuilt.lines().into_iter().cloned().collect();
        assert_eq!(cloned, lines);
    }

    #[test]
    fn test_insert_rejects_bad_targets() {
        let (_, outline) = sample();
        let mut toc = outline.toc();
        assert_eq!(
            toc.insert(99, 2, "章", "x"),
            Err(EditError::LineOutOfRange { line: 99, len: 11 })
        );
        assert!(matches!(toc.insert(2, 2, "章", "x"), Err(EditError::LineTaken { line: 2, .. })));
        assert_eq!(toc.insert(3, 0, "章", "x"), Err(EditError::InvalidLevel));
    }

    #[test]
    fn test_remove_merges_into_previous() {
        let (lines, outline) = sample();
        let mut toc = outline.toc();

        let removed = toc.remove(2).unwrap();
        assert_eq!(removed.title, "第2章 雨");
        assert_eq!(toc.items()[1].end_line, 7);

        let rebuilt = toc.to_outline(&lines, "正文").unwrap();
        let chapter = &rebuilt.roots[0].children[0];
        assert_eq!(chapter.body.len(), 5);
        assert_eq!(chapter.body[1].text, "第2章 雨");
    }

    #[test]
    fn test_last_item_cannot_be_removed() {
        let lines = normalize_str("第1章\nx");
        let outline = recognize(&lines, &RuleSet::default()).unwrap();
        let mut toc = outline.toc();
        assert_eq!(toc.remove(0), Err(EditError::LastItem));
        assert_eq!(toc.remove(5), Err(EditError::ItemOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn test_rename_with_fallback() {
        let (_, outline) = sample();
        let mut toc = outline.toc();
        toc.rename(1, " 新标题 ").unwrap();
        assert_eq!(toc.items()[1].title, "新标题");
        toc.rename(1, "").unwrap();
        assert_eq!(toc.items()[1].title, "章2");
    }

    #[test]
    fn test_swap_titles_same_level_only() {
        let (_, outline) = sample();
        let mut toc = outline.toc();

        toc.swap_titles(1, 1).unwrap();
        assert_eq!(&titles(&toc)[1..3], &["第2章 雨", "第1章 风"]);

        assert_eq!(toc.swap_titles(2, 1), Err(EditError::LevelMismatch));
        assert!(matches!(toc.swap_titles(0, -1), Err(EditError::ItemOutOfRange { .. })));
        assert!(matches!(toc.swap_titles(4, 1), Err(EditError::ItemOutOfRange { .. })));
    }

    #[test]
    fn test_empty_toc_rebuilds_as_preamble() {
        let lines = normalize_str("a\nb");
        let outline = Toc::new(lines.len()).to_outline(&lines, "Text").unwrap();
        assert_eq!(outline.roots.len(), 1);
        assert_eq!(outline.roots[0].title, "Text");
    }

    #[test]
    fn test_rebuild_against_shorter_document_fails() {
        let (lines, outline) = sample();
        let toc = outline.toc();
        let err = toc.to_outline(&lines[..5], "正文").unwrap_err();
        assert_eq!(err, PreconditionError::LineOutOfRange { index: 8, len: 5 });
    }
}
