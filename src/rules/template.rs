//! Replacement templates with `\1` / `\g<name>` group references.
//!
//! The `regex` crate expands `$1`-style templates only, and rules are written
//! with backslash references, so templates are parsed here once at compile
//! time and validated against the pattern's capture groups.

use regex::{Captures, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Group(usize),
    Named(String),
}

/// A parsed replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// The template that reproduces the whole match.
    pub fn whole_match() -> Self {
        Self {
            pieces: vec![Piece::Group(0)],
        }
    }

    /// Parse `source` and check every group reference exists in `regex`.
    ///
    /// Supported syntax: `\1`..`\99`, `\g<n>` (`\g<0>` is the whole match),
    /// `\g<name>`, and the escapes `\n \t \r \f \v \a \b \\`. Any other
    /// backslash-letter is rejected, and so is `\0`; a backslash before
    /// anything else is kept literally.
    pub fn parse(source: &str, regex: &Regex) -> Result<Self, String> {
        let mut pieces = Vec::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '\\' {
                push_literal(&mut pieces, c);
                continue;
            }
            let Some(next) = chars.next() else {
                return Err("bad escape (end of template)".to_string());
            };
            match next {
                'n' => push_literal(&mut pieces, '\n'),
                't' => push_literal(&mut pieces, '\t'),
                'r' => push_literal(&mut pieces, '\r'),
                'f' => push_literal(&mut pieces, '\x0c'),
                'v' => push_literal(&mut pieces, '\x0b'),
                'a' => push_literal(&mut pieces, '\x07'),
                'b' => push_literal(&mut pieces, '\x08'),
                '\\' => push_literal(&mut pieces, '\\'),
                'g' => {
                    if chars.next() != Some('<') {
                        return Err("missing < after \\g".to_string());
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('>') => break,
                            Some(ch) => name.push(ch),
                            None => return Err("missing >, unterminated name".to_string()),
                        }
                    }
                    if name.is_empty() {
                        return Err("missing group name".to_string());
                    }
                    match name.parse::<usize>() {
                        Ok(index) => pieces.push(Piece::Group(index)),
                        Err(_) => pieces.push(Piece::Named(name)),
                    }
                }
                '0' => return Err("bad escape \\0 (use \\g<0> for the whole match)".to_string()),
                d if d.is_ascii_digit() => {
                    let mut index = d as usize - '0' as usize;
                    if let Some(second) = chars.peek().and_then(|ch| ch.to_digit(10)) {
                        index = index * 10 + second as usize;
                        chars.next();
                    }
                    pieces.push(Piece::Group(index));
                }
                other if other.is_ascii_alphabetic() => {
                    return Err(format!("bad escape \\{other}"));
                }
                other => {
                    push_literal(&mut pieces, '\\');
                    push_literal(&mut pieces, other);
                }
            }
        }

        let template = Self { pieces };
        template.check_groups(regex)?;
        Ok(template)
    }

    fn check_groups(&self, regex: &Regex) -> Result<(), String> {
        for piece in &self.pieces {
            match piece {
                Piece::Group(index) if *index >= regex.captures_len() => {
                    return Err(format!("invalid group reference {index}"));
                }
                Piece::Named(name) if !regex.capture_names().flatten().any(|n| n == name.as_str()) => {
                    return Err(format!("unknown group name '{name}'"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Substitute the captured groups. Groups that did not participate in
    /// the match expand to nothing.
    pub fn expand(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(index) => {
                    if let Some(m) = caps.get(*index) {
                        out.push_str(m.as_str());
                    }
                }
                Piece::Named(name) => {
                    if let Some(m) = caps.name(name) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        out
    }
}

fn push_literal(pieces: &mut Vec<Piece>, c: char) {
    if let Some(Piece::Literal(text)) = pieces.last_mut() {
        text.push(c);
    } else {
        pieces.push(Piece::Literal(c.to_string()));
    }
}
