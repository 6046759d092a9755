//! Monetary amounts from free text.
//!
//! Two notations are recognised, in this order:
//! 1. dollar-prefixed, optional thousands separators and a `K`/`M`/`B`
//!    suffix (`$1,200,000`, `$1.2B`, `$350m`);
//! 2. a decimal followed by a Chinese magnitude word (`3.2 億`, `5000 萬`).
//!
//! If the dollar notation matches anywhere in the text the Chinese notation
//! is not consulted. `None` means "no usable amount" and must never be read
//! as zero by callers.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_DOLLAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\s?(?P<num>\d[\d,]*(?:\.\d+)?)\s*(?P<suffix>[KkMmBb])?").expect("dollar regex")
});

static RE_CJK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<num>\d[\d,]*(?:\.\d+)?)\s*(?P<unit>[億亿萬万])").expect("cjk amount regex")
});

/// Parse the first monetary mention in `text` into a USD value.
pub fn extract_usd(text: &str) -> Option<f64> {
    if let Some(caps) = RE_DOLLAR.captures(text) {
        let num = parse_number(caps.name("num")?.as_str())?;
        let whole = caps.get(0)?;
        let scale = caps
            .name("suffix")
            .filter(|_| !followed_by_letter(text, whole.end()))
            .map(|m| dollar_scale(m.as_str()))
            .unwrap_or(1.0);
        return finite(num * scale);
    }

    let caps = RE_CJK.captures(text)?;
    let num = parse_number(caps.name("num")?.as_str())?;
    let scale = match caps.name("unit")?.as_str() {
        "億" | "亿" => 1e8,
        _ => 1e4,
    };
    finite(num * scale)
}

/// `$10 million` must not read the `m` of "million" as a suffix.
fn followed_by_letter(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
}

fn dollar_scale(suffix: &str) -> f64 {
    match suffix {
        "K" | "k" => 1e3,
        "M" | "m" => 1e6,
        _ => 1e9,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
