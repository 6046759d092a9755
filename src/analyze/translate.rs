//! English → Chinese headline rewriting.
//!
//! A `Rewriter` is an ordered list of `(pattern, replacement)` rules. Each
//! rule is applied to all occurrences before the next rule runs, so later
//! rules see partially translated text; entity names are listed first in the
//! table for that reason.
//!
//! Table format (TOML, see `config/translation.toml`):
//! ```toml
//! [[rule]]
//! pattern = '(?i)\bFederal Reserve\b'
//! replace = "聯準會"
//!
//! [[rule]]
//! pattern = '(\p{Han}) +(\p{Han})'
//! replace = "${1}${2}"
//! repeat = true   # re-run until the text stops changing
//! ```
//!
//! The result is best effort. Text no rule touches comes back unchanged
//! (after markup stripping); the rewriter never fails at call time.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::normalize::strip_html;

static DEFAULT_TABLE: &str = include_str!("../../config/translation.toml");

/// Pass limit for `repeat` rules.
const MAX_REPEAT_PASSES: usize = 16;

static DEFAULT_REWRITER: Lazy<Rewriter> =
    Lazy::new(|| Rewriter::from_toml_str(DEFAULT_TABLE).expect("valid translation table"));

/// Curated full-sentence translation for the Fed's statement headline; a
/// word-by-word pass reads badly for it.
const FOMC_STATEMENT_PHRASE: &str = "federal reserve issues fomc statement";
const FOMC_STATEMENT_ZH: &str = "聯準會發布 FOMC 利率決策聲明";

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleCfg>,
}

#[derive(Debug, Deserialize)]
struct RuleCfg {
    pattern: String,
    replace: String,
    #[serde(default)]
    repeat: bool,
}

#[derive(Debug, Clone)]
pub struct TranslationRule {
    pub pattern: Regex,
    pub replacement: String,
    /// Re-apply until a fixed point; for patterns whose matches share a
    /// character and so cannot all be found in one non-overlapping pass.
    pub repeat: bool,
}

impl TranslationRule {
    fn apply(&self, text: String) -> String {
        let passes = if self.repeat { MAX_REPEAT_PASSES } else { 1 };
        let mut out = text;
        for _ in 0..passes {
            if !self.pattern.is_match(&out) {
                break;
            }
            let next = self
                .pattern
                .replace_all(&out, self.replacement.as_str())
                .into_owned();
            if next == out {
                break;
            }
            out = next;
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct Rewriter {
    rules: Vec<TranslationRule>,
}

impl Default for Rewriter {
    fn default() -> Self {
        DEFAULT_REWRITER.clone()
    }
}

impl Rewriter {
    pub fn new(rules: Vec<TranslationRule>) -> Self {
        Self { rules }
    }

    /// Compile a rule table. Fails on bad TOML or an invalid pattern; the
    /// error names the offending rule index.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(s).context("parsing translation table")?;
        let mut rules = Vec::with_capacity(file.rules.len());
        for (i, r) in file.rules.into_iter().enumerate() {
            let pattern = Regex::new(&r.pattern)
                .with_context(|| format!("translation rule #{i}: bad pattern {:?}", r.pattern))?;
            rules.push(TranslationRule {
                pattern,
                replacement: r.replace,
                repeat: r.repeat,
            });
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `text`. Empty input yields an empty string.
    pub fn rewrite(&self, text: &str) -> String {
        let clean = strip_html(text);
        if clean.is_empty() {
            return clean;
        }
        if let Some(curated) = exact_override(&clean) {
            return curated.to_string();
        }

        self.rules
            .iter()
            .fold(clean, |out, rule| rule.apply(out))
    }
}

fn exact_override(clean: &str) -> Option<&'static str> {
    let key = clean
        .trim_end_matches(['.', '!', '。'])
        .to_lowercase();
    (key == FOMC_STATEMENT_PHRASE).then_some(FOMC_STATEMENT_ZH)
}

/// Rewrite with the built-in table.
pub fn translate(text: &str) -> String {
    DEFAULT_REWRITER.rewrite(text)
}
