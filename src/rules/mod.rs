//! Heading rules and the per-line classifier.
//!
//! A rule is written as `<pattern> => <replacement>`, or just `<pattern>`,
//! in which case the title is the whole match. Rules are grouped into
//! levels (volume, chapter, ...). Levels are tried in ascending order and
//! rules within a level in declaration order; the first match wins.
//!
//! [`RuleSet::classify`] is the only place a line is judged. The recognizer
//! and the line tester both call it.

mod config;
mod template;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidPatternError, PatternFault};
use crate::text::Line;

pub use config::{DEFAULT_MAX_HEADING_CHARS, DEFAULT_PREAMBLE_TITLE, RuleConfig};
pub use template::Template;

/// One level of rules as the user writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleLevel {
    pub name: String,
    pub rules: Vec<String>,
}

impl RuleLevel {
    pub fn new<I, S>(name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }
}

/// Identifies a compiled rule: 1-based level number and 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId {
    pub level: usize,
    pub position: usize,
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub level: usize,
    /// 1-based declaration position within the level.
    pub order: usize,
    pub pattern: Regex,
    pub replacement: Template,
    /// The rule as written.
    pub raw: String,
}

impl Rule {
    pub fn id(&self) -> RuleId {
        RuleId {
            level: self.level,
            position: self.order,
        }
    }
}

/// A compiled level.
#[derive(Debug, Clone)]
pub struct Level {
    pub number: usize,
    pub name: String,
    pub rules: Vec<Rule>,
}

/// Why a line was or was not taken as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Matched,
    Blank,
    TooLong { limit: usize },
    NoRule,
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionResult {
    pub matched_level: Option<usize>,
    pub matched_rule: Option<RuleId>,
    pub output_title: Option<String>,
    pub verdict: Verdict,
}

impl RecognitionResult {
    fn body(verdict: Verdict) -> Self {
        Self {
            matched_level: None,
            matched_rule: None,
            output_title: None,
            verdict,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.verdict == Verdict::Matched
    }
}

/// An immutable, compiled set of heading rules.
///
/// Editing rules means compiling a new `RuleSet`; a compiled one is never
/// changed, so it can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct RuleSet {
    levels: Vec<Level>,
    max_heading_chars: usize,
    preamble_title: String,
}

impl RuleSet {
    /// Compile levels with the default limits.
    pub fn compile(levels: &[RuleLevel]) -> Result<Self, InvalidPatternError> {
        Self::compile_with(levels, DEFAULT_MAX_HEADING_CHARS, DEFAULT_PREAMBLE_TITLE)
    }

    /// Compile levels. Level `i` of the slice becomes level number `i + 1`.
    ///
    /// Blank rule entries are ignored but still count towards positions, so
    /// an error's position matches what the user sees. Levels left without
    /// rules are dropped; the others keep their slice-based numbers.
    pub fn compile_with(
        levels: &[RuleLevel],
        max_heading_chars: usize,
        preamble_title: &str,
    ) -> Result<Self, InvalidPatternError> {
        let mut compiled = Vec::new();
        for (index, level) in levels.iter().enumerate() {
            let number = index + 1;
            let name = non_blank_or(&level.name, || format!("L{number}"));
            let mut rules = Vec::new();
            for (offset, raw) in level.rules.iter().enumerate() {
                if raw.trim().is_empty() {
                    continue;
                }
                let rule = compile_rule(raw, number, offset + 1).map_err(|fault| InvalidPatternError {
                    level: number,
                    level_name: name.clone(),
                    position: offset + 1,
                    rule: raw.clone(),
                    fault,
                })?;
                rules.push(rule);
            }
            if !rules.is_empty() {
                compiled.push(Level { number, name, rules });
            }
        }

        debug!(
            "compiled {} rules across {} levels",
            compiled.iter().map(|l| l.rules.len()).sum::<usize>(),
            compiled.len()
        );
        Ok(Self {
            levels: compiled,
            max_heading_chars,
            preamble_title: non_blank_or(preamble_title, || DEFAULT_PREAMBLE_TITLE.to_string()),
        })
    }

    /// The built-in rule set.
    pub fn default_rules() -> Self {
        Self::compile(&default_levels()).expect("built-in rules compile")
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, number: usize) -> Option<&Level> {
        self.levels.iter().find(|l| l.number == number)
    }

    pub fn level_name(&self, number: usize) -> Option<&str> {
        self.level(number).map(|l| l.name.as_str())
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.level(id.level)?.rules.iter().find(|r| r.order == id.position)
    }

    /// Deepest level number, or 0 when there are no rules.
    pub fn deepest_level(&self) -> usize {
        self.levels.last().map_or(0, |l| l.number)
    }

    pub fn max_heading_chars(&self) -> usize {
        self.max_heading_chars
    }

    pub fn preamble_title(&self) -> &str {
        &self.preamble_title
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Decide whether `line` is a heading.
    pub fn classify(&self, line: &Line) -> RecognitionResult {
        self.classify_text(&line.text)
    }

    /// Decide whether `text` is a heading.
    ///
    /// The text is trimmed first. Blank text and text longer than
    /// `max_heading_chars` characters are never headings. Otherwise every
    /// rule is searched in order and the first hit wins; its expanded title
    /// is trimmed and falls back to the line itself when empty.
    pub fn classify_text(&self, text: &str) -> RecognitionResult {
        let text = text.trim();
        if text.is_empty() {
            return RecognitionResult::body(Verdict::Blank);
        }
        if text.chars().count() > self.max_heading_chars {
            return RecognitionResult::body(Verdict::TooLong {
                limit: self.max_heading_chars,
            });
        }

        for level in &self.levels {
            for rule in &level.rules {
                let Some(caps) = rule.pattern.captures(text) else {
                    continue;
                };
                let title = non_blank_or(&rule.replacement.expand(&caps), || text.to_string());
                return RecognitionResult {
                    matched_level: Some(level.number),
                    matched_rule: Some(rule.id()),
                    output_title: Some(title),
                    verdict: Verdict::Matched,
                };
            }
        }
        RecognitionResult::body(Verdict::NoRule)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}

fn compile_rule(raw: &str, level: usize, order: usize) -> Result<Rule, PatternFault> {
    let (pattern, replacement) = split_rule(raw);
    let regex = Regex::new(pattern).map_err(|e| PatternFault::Regex(e.to_string()))?;
    let template = match replacement {
        Some(source) => Template::parse(source, &regex).map_err(PatternFault::Template)?,
        None => Template::whole_match(),
    };
    Ok(Rule {
        level,
        order,
        pattern: regex,
        replacement: template,
        raw: raw.to_string(),
    })
}

/// Split `pattern => replacement` on the first arrow. An absent or empty
/// replacement yields `None`.
fn split_rule(raw: &str) -> (&str, Option<&str>) {
    let text = raw.trim();
    match text.split_once("=>") {
        Some((pattern, replacement)) => {
            let replacement = replacement.trim();
            (pattern.trim(), (!replacement.is_empty()).then_some(replacement))
        }
        None => (text, None),
    }
}

fn non_blank_or(value: &str, fallback: impl FnOnce() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

/// Built-in levels: volumes (卷) and chapters (章).
pub fn default_levels() -> Vec<RuleLevel> {
    vec![
        RuleLevel::new(
            "卷",
            [
                r"^第([零〇一二三四五六七八九十百千万两0-9]+)卷[\s:：-]*(.*)$ => 第\1卷 \2",
                r"^卷([零〇一二三四五六七八九十百千万两0-9]+)[\s:：-]*(.*)$ => 第\1卷 \2",
                r"^(?:VOL|Volume)\s+(\d+)[\s:：-]*(.*)$ => 第\1卷 \2",
            ],
        ),
        RuleLevel::new(
            "章",
            [
                r"^第([零〇一二三四五六七八九十百千万两0-9]+)章[\s:：-]*(.*)$ => 第\1章 \2",
                r"^第([零〇一二三四五六七八九十百千万两0-9]+)节[\s:：-]*(.*)$ => 第\1节 \2",
                r"^([零〇一二三四五六七八九十百千万两]+)、\s*(.*)$ => 第\1章 \2",
                r"^(?:Chapter|CHAPTER)\s+([IVXLCDM\d]+)[\s:：-]*(.*)$ => Chapter \1 \2",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_level(rules: &[&str]) -> RuleSet {
        RuleSet::compile(&[RuleLevel::new("章", rules.iter().copied())]).unwrap()
    }

    #[test]
    fn test_default_replacement_is_whole_match() {
        let rules = single_level(&[r"^Chapter (\d+)$"]);
        let result = rules.classify_text("Chapter 7");
        assert_eq!(result.output_title.as_deref(), Some("Chapter 7"));
        assert_eq!(result.matched_level, Some(1));
    }

    #[test]
    fn test_backreference_substitution() {
        let rules = single_level(&[r"^第([0-9一二三四五六七八九十]+)章\s*(.*)$ => 第\1章 \2"]);
        let result = rules.classify_text("第3章   风起");
        assert_eq!(result.output_title.as_deref(), Some("第3章 风起"));
    }

    #[test]
    fn test_first_match_short_circuits() {
        let rules = single_level(&[r"^Chapter (\d+) => A\1", r"^Chapter => B"]);
        let result = rules.classify_text("Chapter 2");
        assert_eq!(result.matched_rule, Some(RuleId { level: 1, position: 1 }));
        assert_eq!(result.output_title.as_deref(), Some("A2"));
    }

    #[test]
    fn test_lower_level_number_wins() {
        let rules = RuleSet::compile(&[
            RuleLevel::new("part", [r"^Part"]),
            RuleLevel::new("chapter", [r"^P"]),
        ])
        .unwrap();
        assert_eq!(rules.classify_text("Part One").matched_level, Some(1));
        assert_eq!(rules.classify_text("Prologue").matched_level, Some(2));
    }

    #[test]
    fn test_blank_and_long_lines_are_body() {
        let rules = single_level(&[r".*"]);
        assert_eq!(rules.classify_text("   ").verdict, Verdict::Blank);

        let long = "长".repeat(DEFAULT_MAX_HEADING_CHARS + 1);
        assert_eq!(
            rules.classify_text(&long).verdict,
            Verdict::TooLong {
                limit: DEFAULT_MAX_HEADING_CHARS
            }
        );
        let exact = "长".repeat(DEFAULT_MAX_HEADING_CHARS);
        assert!(rules.classify_text(&exact).is_heading());
    }

    #[test]
    fn test_leading_indentation_is_ignored() {
        let rules = RuleSet::default();
        let result = rules.classify_text("　　第十二章：归来");
        assert_eq!(result.matched_level, Some(2));
        assert_eq!(result.output_title.as_deref(), Some("第十二章 归来"));
    }

    #[test]
    fn test_empty_title_falls_back_to_line() {
        let rules = single_level(&[r"^\* \* \*$ => \g<0>", r"^(x)?--$ => \1"]);
        assert_eq!(rules.classify_text("--").output_title.as_deref(), Some("--"));
    }

    #[test]
    fn test_no_rule() {
        let result = RuleSet::default().classify_text("他走进了房间。");
        assert_eq!(result.verdict, Verdict::NoRule);
        assert_eq!(result.matched_level, None);
        assert_eq!(result.matched_rule, None);
        assert_eq!(result.output_title, None);
    }

    #[test]
    fn test_default_levels_compile() {
        let rules = RuleSet::compile(&default_levels()).unwrap();
        assert_eq!(rules.levels().len(), 2);
        assert_eq!(rules.level_name(1), Some("卷"));
        assert_eq!(rules.deepest_level(), 2);

        let volume = rules.classify_text("Volume 2: The Return");
        assert_eq!(volume.output_title.as_deref(), Some("第2卷 The Return"));
        let chapter = rules.classify_text("CHAPTER XIV - Storm");
        assert_eq!(chapter.output_title.as_deref(), Some("Chapter XIV Storm"));
        let numbered = rules.classify_text("三、夜行");
        assert_eq!(numbered.output_title.as_deref(), Some("第三章 夜行"));
    }

    #[test]
    fn test_invalid_pattern_reports_level_and_position() {
        let err = RuleSet::compile(&[
            RuleLevel::new("卷", [r"^卷"]),
            RuleLevel::new("章", [r"^第", "", r"^(unclosed"]),
        ])
        .unwrap_err();
        assert_eq!(err.level, 2);
        assert_eq!(err.level_name, "章");
        assert_eq!(err.position, 3);
        assert!(matches!(err.fault, PatternFault::Regex(_)));
    }

    #[test]
    fn test_invalid_replacement_is_a_compile_error() {
        let err = RuleSet::compile(&[RuleLevel::new("章", [r"^(\d+)$ => \2"])]).unwrap_err();
        assert_eq!(err.position, 1);
        assert!(matches!(err.fault, PatternFault::Template(_)));
    }

    #[test]
    fn test_empty_levels_keep_numbering() {
        let rules = RuleSet::compile(&[
            RuleLevel::new("", Vec::<String>::new()),
            RuleLevel::new("", [r"^#"]),
        ])
        .unwrap();
        assert_eq!(rules.levels().len(), 1);
        assert_eq!(rules.levels()[0].number, 2);
        assert_eq!(rules.level_name(2), Some("L2"));
        assert_eq!(rules.classify_text("# x").matched_level, Some(2));
    }

    #[test]
    fn test_split_rule() {
        assert_eq!(split_rule(" a => b "), ("a", Some("b")));
        assert_eq!(split_rule("a =>   "), ("a", None));
        assert_eq!(split_rule("a"), ("a", None));
        assert_eq!(split_rule("a => b => c"), ("a", Some("b => c")));
    }
}
