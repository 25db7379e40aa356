//! Checking single lines against a rule set.
//!
//! The tester has no matching logic of its own: it calls
//! [`RuleSet::classify`], the same function [`recognize`](crate::recognize)
//! calls for every line, so a tested line is always judged exactly as it
//! would be during recognition.

use crate::error::PreconditionError;
use crate::rules::{RecognitionResult, RuleSet, Verdict};
use crate::text::Line;

/// Classify one line.
pub fn test_line(line: &Line, rules: &RuleSet) -> RecognitionResult {
    rules.classify(line)
}

/// Classify the line at `index` of a document.
pub fn test_line_at(lines: &[Line], index: usize, rules: &RuleSet) -> Result<RecognitionResult, PreconditionError> {
    let line = lines.get(index).ok_or(PreconditionError::LineOutOfRange {
        index,
        len: lines.len(),
    })?;
    Ok(test_line(line, rules))
}

impl RecognitionResult {
    /// One-line, human-readable account of the decision for `line_number`
    /// (1-based, as shown to users).
    pub fn describe(&self, line_number: usize, rules: &RuleSet) -> String {
        match self.verdict {
            Verdict::Matched => {
                let level = self.matched_level.unwrap_or_default();
                let level_name = rules.level_name(level).unwrap_or_default();
                let rule = self
                    .matched_rule
                    .and_then(|id| rules.rule(id))
                    .map_or("", |r| r.raw.as_str());
                format!(
                    "line {line_number} -> L{level} ({level_name}), title: {}, rule: {rule}",
                    self.output_title.as_deref().unwrap_or_default()
                )
            }
            Verdict::Blank => format!("line {line_number} is not a heading (blank line)"),
            Verdict::TooLong { limit } => {
                format!("line {line_number} is not a heading (longer than {limit} characters)")
            }
            Verdict::NoRule => format!("line {line_number} is not a heading (no rule matched)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::recognize;
    use crate::text::normalize_str;

    #[test]
    fn test_agrees_with_recognizer() {
        let lines = normalize_str("前言\n第一卷 起\n第1章 风\n风起了\n\n第2章 雨");
        let rules = RuleSet::default();
        let outline = recognize(&lines, &rules).unwrap();

        let headings = outline.headings();
        for line in &lines {
            let result = test_line(line, &rules);
            let node = headings.iter().find(|n| n.start_line == line.index);
            match node {
                Some(node) => {
                    assert_eq!(result.matched_level, Some(node.level));
                    assert_eq!(result.matched_rule, node.rule);
                    assert_eq!(result.output_title.as_deref(), Some(node.title.as_str()));
                }
                None => assert!(!result.is_heading()),
            }
        }
    }

    #[test]
    fn test_line_at_bounds() {
        let lines = normalize_str("第1章\n正文");
        let rules = RuleSet::default();
        assert!(test_line_at(&lines, 0, &rules).unwrap().is_heading());
        assert_eq!(
            test_line_at(&lines, 2, &rules),
            Err(PreconditionError::LineOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_describe() {
        let rules = RuleSet::default();
        let hit = test_line(&Line::new(0, "第5章 归途"), &rules);
        let text = hit.describe(1, &rules);
        assert!(text.starts_with("line 1 -> L2 (章), title: 第5章 归途, rule: ^第"));

        let miss = test_line(&Line::new(3, "他笑了。"), &rules);
        assert_eq!(miss.describe(4, &rules), "line 4 is not a heading (no rule matched)");

        let blank = test_line(&Line::new(3, ""), &rules);
        assert_eq!(blank.describe(4, &rules), "line 4 is not a heading (blank line)");
    }
}
