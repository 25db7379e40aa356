//! Rules files.
//!
//! ```toml
//! max_heading_chars = 180
//! preamble_title = "正文"
//!
//! [[levels]]
//! name = "卷"
//! rules = ['^第([0-9]+)卷\s*(.*)$ => 第\1卷 \2']
//!
//! [[levels]]
//! name = "章"
//! rules = ['^Chapter (\d+)$']
//! ```
//!
//! Every key is optional; missing keys take the built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RuleLevel, RuleSet, default_levels};
use crate::error::{InvalidPatternError, Result};

/// Lines longer than this many characters are never headings.
pub const DEFAULT_MAX_HEADING_CHARS: usize = 180;

/// Title of the synthetic node holding text before the first heading.
pub const DEFAULT_PREAMBLE_TITLE: &str = "正文";

/// User-editable rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub max_heading_chars: usize,
    pub preamble_title: String,
    pub levels: Vec<RuleLevel>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_heading_chars: DEFAULT_MAX_HEADING_CHARS,
            preamble_title: DEFAULT_PREAMBLE_TITLE.to_string(),
            levels: default_levels(),
        }
    }
}

impl RuleConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Compile into a fresh [`RuleSet`].
    pub fn compile(&self) -> std::result::Result<RuleSet, InvalidPatternError> {
        RuleSet::compile_with(&self.levels, self.max_heading_chars, &self.preamble_title)
    }
}
