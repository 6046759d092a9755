//! Markup/whitespace stripping for raw text fields.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Strip tags, decode entities, collapse whitespace, trim.
///
/// Unlike the ingest-side cleanup of a news pipeline, punctuation and length
/// are left alone: these strings are displayed as-is.
pub fn strip_html(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let no_tags = re_tags.replace_all(s, "");
    let decoded = html_escape::decode_html_entities(&no_tags);

    // Decoding can produce NBSPs (`&nbsp;`); fold them with the rest.
    let folded = decoded.replace('\u{00A0}', " ");
    re_ws.replace_all(&folded, " ").trim().to_string()
}

/// Stripped text, or `fallback` when the field is missing or strips to empty.
pub fn text_or(raw: Option<&str>, fallback: &str) -> String {
    let cleaned = raw.map(strip_html).unwrap_or_default();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// First non-empty stripped candidate.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(strip_html)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_ws() {
        let s = "  <p>BTC&nbsp;ETF <b>淨流入</b>\n\t$120M</p> ";
        assert_eq!(strip_html(s), "BTC ETF 淨流入 $120M");
    }

    #[test]
    fn keeps_trailing_punctuation() {
        assert_eq!(strip_html("Fed holds."), "Fed holds.");
    }

    #[test]
    fn fallback_applies_to_missing_and_blank() {
        assert_eq!(text_or(None, "震盪"), "震盪");
        assert_eq!(text_or(Some("<br/>  "), "震盪"), "震盪");
        assert_eq!(text_or(Some("偏多"), "震盪"), "偏多");
    }

    #[test]
    fn first_non_empty_skips_blank_candidates() {
        let got = first_non_empty([None, Some("  "), Some("<i>x</i>"), Some("y")]);
        assert_eq!(got.as_deref(), Some("x"));
    }
}
