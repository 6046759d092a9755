//! Short-term directional bias from free text.
//!
//! Classification walks an ordered rule table and returns the first label
//! whose pattern matches; `Side` is the fallback. Order:
//! `Muted` (pending/unconfirmed wording) > `Up` > `Down` > `Side`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::strip_html;

/// Display text when no bias text is available ("choppy").
pub const DEFAULT_BIAS_TEXT: &str = "震盪";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Up,
    Down,
    Side,
    Muted,
}

impl Bias {
    /// Short Chinese label used in summaries (`basis` strings etc.).
    pub fn label(self) -> &'static str {
        match self {
            Bias::Up => "偏多",
            Bias::Down => "偏空",
            Bias::Side => "震盪",
            Bias::Muted => "待確認",
        }
    }
}

struct BiasRule {
    label: Bias,
    pattern: Regex,
}

static RULES: Lazy<Vec<BiasRule>> = Lazy::new(|| {
    let table: [(Bias, &str); 4] = [
        (
            Bias::Muted,
            r"(?i)待公布|待公佈|待確認|待判讀|待模型評估|尚未公布|awaiting release|to be confirmed|pending interpretation|awaiting model evaluation",
        ),
        (
            Bias::Up,
            r"(?i)偏漲|偏多|上漲|多頭|看多|利多|bullish|leaning up|rising|long-biased|\bup\b",
        ),
        (
            Bias::Down,
            r"(?i)偏跌|偏空|下跌|空頭|看空|利空|bearish|leaning down|falling|short-biased|\bdown\b",
        ),
        (Bias::Side, r"(?i)震盪|盤整|choppy|range-bound|sideways"),
    ];
    table
        .into_iter()
        .map(|(label, p)| BiasRule {
            label,
            pattern: Regex::new(p).expect("bias rule regex"),
        })
        .collect()
});

/// Classify `text` into exactly one label. Total and deterministic.
pub fn classify(text: &str) -> Bias {
    RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.label)
        .unwrap_or(Bias::Side)
}

/// A classified bias plus the text to display next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasTag {
    pub bias: Bias,
    pub text: String,
}

impl BiasTag {
    /// Strip markup, default empty input to "choppy", classify.
    pub fn from_text(raw: Option<&str>) -> Self {
        Self::with_fallback(raw, DEFAULT_BIAS_TEXT)
    }

    pub fn with_fallback(raw: Option<&str>, fallback: &str) -> Self {
        let cleaned = raw.map(strip_html).unwrap_or_default();
        let text = if cleaned.is_empty() {
            fallback.to_string()
        } else {
            cleaned
        };
        Self {
            bias: classify(&text),
            text,
        }
    }
}

/// A run of text; `bias` is set when the run is itself a bias word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiasSegment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<Bias>,
}

static RE_BIAS_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"偏漲|偏多|上漲|多頭|偏跌|偏空|下跌|空頭|震盪").expect("bias word regex")
});

/// Split stripped `text` into plain runs and bias-word runs so a renderer can
/// colour the words without re-parsing.
pub fn segment(text: &str) -> Vec<BiasSegment> {
    let clean = strip_html(text);
    let mut out = Vec::new();
    let mut last = 0;

    for m in RE_BIAS_WORDS.find_iter(&clean) {
        if m.start() > last {
            out.push(BiasSegment {
                text: clean[last..m.start()].to_string(),
                bias: None,
            });
        }
        out.push(BiasSegment {
            text: m.as_str().to_string(),
            bias: Some(classify(m.as_str())),
        });
        last = m.end();
    }
    if last < clean.len() {
        out.push(BiasSegment {
            text: clean[last..].to_string(),
            bias: None,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_keywords() {
        assert_eq!(classify("偏多"), Bias::Up);
        assert_eq!(classify("偏空"), Bias::Down);
        assert_eq!(classify("待確認"), Bias::Muted);
        assert_eq!(classify(""), Bias::Side);
    }

    #[test]
    fn muted_beats_bullish_words() {
        assert_eq!(classify("待確認，但偏多"), Bias::Muted);
        assert_eq!(classify("Bullish, awaiting release"), Bias::Muted);
    }

    #[test]
    fn english_up_down_are_whole_words() {
        assert_eq!(classify("short-term up"), Bias::Up);
        assert_eq!(classify("DOWN"), Bias::Down);
        assert_eq!(classify("update pending"), Bias::Side);
        assert_eq!(classify("downtime"), Bias::Side);
    }

    #[test]
    fn up_is_checked_before_down() {
        assert_eq!(classify("偏空轉偏多"), Bias::Up);
    }

    #[test]
    fn empty_tag_defaults_to_choppy() {
        let tag = BiasTag::from_text(None);
        assert_eq!(tag.bias, Bias::Side);
        assert_eq!(tag.text, "震盪");
        let tag = BiasTag::from_text(Some("  "));
        assert_eq!(tag.text, "震盪");
    }

    #[test]
    fn segments_mark_bias_words() {
        let segs = segment("<b>短線</b>偏多，長線震盪");
        let marked: Vec<_> = segs.iter().filter_map(|s| s.bias).collect();
        assert_eq!(marked, vec![Bias::Up, Bias::Side]);
        let joined: String = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "短線偏多，長線震盪");
    }
}
