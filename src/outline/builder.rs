use crate::rules::RuleId;
use crate::text::Line;

use super::{HeadingNode, Outline};

/// Position of an open node: its level and its index among its siblings.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    level: usize,
    index: usize,
}

/// Builds an [`Outline`] one line at a time.
///
/// The open-node stack holds sibling indices rather than references, so the
/// tree stays the sole owner of every node. Levels on the stack strictly
/// increase from bottom to top.
pub(crate) struct OutlineBuilder {
    roots: Vec<HeadingNode>,
    open: Vec<OpenNode>,
    preamble_title: String,
    line_count: usize,
}

impl OutlineBuilder {
    pub(crate) fn new(preamble_title: &str) -> Self {
        Self {
            roots: Vec::new(),
            open: Vec::new(),
            preamble_title: preamble_title.to_string(),
            line_count: 0,
        }
    }

    /// Open a heading at `level` (>= 1), closing every open node at the same
    /// or a deeper level first.
    pub(crate) fn heading(
        &mut self,
        line: Line,
        level: usize,
        level_name: &str,
        rule: Option<RuleId>,
        title: String,
    ) {
        while self.open.last().is_some_and(|top| top.level >= level) {
            self.open.pop();
        }

        self.line_count += 1;
        let node = HeadingNode {
            level,
            level_name: level_name.to_string(),
            start_line: line.index,
            line: Some(line),
            rule,
            title,
            body: Vec::new(),
            children: Vec::new(),
        };

        let siblings = children_at(&mut self.roots, &self.open);
        siblings.push(node);
        let index = siblings.len() - 1;
        self.open.push(OpenNode { level, index });
    }

    /// Append a body line to the innermost open node, or to the preamble
    /// when no heading has been seen yet.
    pub(crate) fn body(&mut self, line: Line) {
        self.line_count += 1;
        match self.open.split_last() {
            Some((last, path)) => children_at(&mut self.roots, path)[last.index].body.push(line),
            None => {
                // Nothing is open only before the first heading, so the last
                // root, if any, is the preamble.
                if !self.roots.last().is_some_and(HeadingNode::is_preamble) {
                    self.roots.push(HeadingNode::preamble(&self.preamble_title, line.index));
                }
                if let Some(preamble) = self.roots.last_mut() {
                    preamble.body.push(line);
                }
            }
        }
    }

    pub(crate) fn finish(self) -> Outline {
        Outline {
            roots: self.roots,
            line_count: self.line_count,
        }
    }
}

fn children_at<'a>(roots: &'a mut Vec<HeadingNode>, path: &[OpenNode]) -> &'a mut Vec<HeadingNode> {
    let mut siblings = roots;
    for step in path {
        siblings = &mut siblings[step.index].children;
    }
    siblings
}
