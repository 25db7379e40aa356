//! Heading recognition: from a flat line sequence to a tree of headings.
//!
//! ```
//! use novelbind::{RuleSet, normalize_str, recognize};
//!
//! let lines = normalize_str("第一卷 起\n第1章 风\n正文\n第2章 雨\n正文");
//! let outline = recognize(&lines, &RuleSet::default())?;
//! assert_eq!(outline.roots.len(), 1);
//! assert_eq!(outline.roots[0].children.len(), 2);
//! # Ok::<(), novelbind::PreconditionError>(())
//! ```

mod builder;

use log::{debug, info};
use serde::Serialize;

use crate::error::PreconditionError;
use crate::rules::{RuleId, RuleSet};
use crate::text::Line;
use crate::toc::Toc;

pub(crate) use builder::OutlineBuilder;

/// A heading and everything up to its next sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingNode {
    /// Level number, or 0 for the synthetic preamble.
    pub level: usize,
    pub level_name: String,
    /// The heading line itself; `None` only for the preamble.
    pub line: Option<Line>,
    /// Rule that recognized the heading; `None` for the preamble and for
    /// headings added by hand.
    pub rule: Option<RuleId>,
    pub title: String,
    pub start_line: usize,
    /// Lines after the heading line and before the first child.
    pub body: Vec<Line>,
    pub children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn preamble(title: &str, start_line: usize) -> Self {
        Self {
            level: 0,
            level_name: String::new(),
            line: None,
            rule: None,
            title: title.to_string(),
            start_line,
            body: Vec::new(),
            children: Vec::new(),
        }
    }

    /// True for the synthetic node holding text before the first heading.
    pub fn is_preamble(&self) -> bool {
        self.line.is_none()
    }

    /// True when the body holds at least one non-blank line.
    pub fn has_text(&self) -> bool {
        self.body.iter().any(|line| !line.is_blank())
    }

    fn collect_lines<'a>(&'a self, out: &mut Vec<&'a Line>) {
        out.extend(self.line.iter());
        out.extend(self.body.iter());
        for child in &self.children {
            child.collect_lines(out);
        }
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a HeadingNode>) {
        out.push(self);
        for child in &self.children {
            child.collect_nodes(out);
        }
    }
}

/// The recognized structure of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub roots: Vec<HeadingNode>,
    /// Number of lines the outline covers.
    pub line_count: usize,
}

impl Outline {
    /// Every line in document order: each node's heading line, then its
    /// body, then its children.
    pub fn lines(&self) -> Vec<&Line> {
        let mut out = Vec::with_capacity(self.line_count);
        for root in &self.roots {
            root.collect_lines(&mut out);
        }
        out
    }

    /// All nodes in pre-order, preamble included.
    pub fn nodes(&self) -> Vec<&HeadingNode> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.collect_nodes(&mut out);
        }
        out
    }

    /// Recognized headings in pre-order, preamble excluded.
    pub fn headings(&self) -> Vec<&HeadingNode> {
        self.nodes().into_iter().filter(|n| !n.is_preamble()).collect()
    }

    pub fn heading_count(&self) -> usize {
        self.headings().len()
    }

    pub fn preamble(&self) -> Option<&HeadingNode> {
        self.roots.first().filter(|n| n.is_preamble())
    }

    /// Deepest heading level present, 0 when there are no headings.
    pub fn max_level(&self) -> usize {
        self.headings().iter().map(|n| n.level).max().unwrap_or(0)
    }

    /// Flat, editable table of contents.
    pub fn toc(&self) -> Toc {
        Toc::from_outline(self)
    }
}

/// Build the outline of `lines` under `rules`.
///
/// Every line is classified with [`RuleSet::classify`]. A heading at level L
/// closes all open headings at level L or deeper and becomes a child of the
/// nearest remaining one (or a root). Anything else is body text of the
/// innermost open heading, or of the preamble before the first heading.
///
/// Fails only when line indices are not dense from 0.
pub fn recognize(lines: &[Line], rules: &RuleSet) -> Result<Outline, PreconditionError> {
    let mut builder = OutlineBuilder::new(rules.preamble_title());

    for (expected, line) in lines.iter().enumerate() {
        if line.index != expected {
            return Err(PreconditionError::NonDenseLines {
                expected,
                found: line.index,
            });
        }
        let result = rules.classify(line);
        match (result.matched_level, result.output_title) {
            (Some(level), Some(title)) => {
                debug!("line {}: level {} heading {:?}", line.index + 1, level, title);
                let level_name = rules.level_name(level).unwrap_or_default();
                builder.heading(line.clone(), level, level_name, result.matched_rule, title);
            }
            _ => builder.body(line.clone()),
        }
    }

    let outline = builder.finish();
    info!(
        "recognized {} headings in {} lines",
        outline.heading_count(),
        outline.line_count
    );
    Ok(outline)
}
