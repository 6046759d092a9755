// tests/amount_bias.rs
//
// Amount parsing and bias classification through the public API.

use crypto_signal_desk::analyze::{classify, extract_usd, segment, Bias, BiasTag};

fn approx(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|v| (v - b).abs() <= 1e-6 * b.abs().max(1.0))
}

#[test]
fn amount_notations() {
    assert!(approx(extract_usd("$1,200,000"), 1_200_000.0));
    assert!(approx(extract_usd("$1.2B"), 1.2e9));
    assert!(approx(extract_usd("3.2 億"), 3.2e8));
    assert!(approx(extract_usd("5000 萬"), 5e7));
    assert_eq!(extract_usd("no amount here"), None);
}

#[test]
fn dollar_family_wins_over_cjk() {
    // 億 appears first in the text but the dollar figure still decides.
    assert!(approx(extract_usd("約 3 億美元（$350m）"), 3.5e8));
}

#[test]
fn unsupported_units_are_not_coerced() {
    assert_eq!(extract_usd("€5M"), None);
    assert_eq!(extract_usd("2 兆"), None);
}

#[test]
fn bias_priority() {
    assert_eq!(classify("偏多"), Bias::Up);
    assert_eq!(classify("偏空"), Bias::Down);
    assert_eq!(classify("待確認"), Bias::Muted);
    assert_eq!(classify("待確認，短線偏多"), Bias::Muted);
    assert_eq!(classify(""), Bias::Side);
    assert_eq!(classify("Analysts turn bullish"), Bias::Up);
    assert_eq!(classify("shares go down"), Bias::Down);
    // "up" only as a whole word
    assert_eq!(classify("upbeat"), Bias::Side);
}

#[test]
fn missing_bias_displays_choppy() {
    let tag = BiasTag::from_text(None);
    assert_eq!(tag.bias, Bias::Side);
    assert_eq!(tag.text, "震盪");

    let tag = BiasTag::from_text(Some("  <i></i> "));
    assert_eq!(tag.text, "震盪");
}

#[test]
fn segments_mark_bias_words() {
    let segs = segment("短線<b>偏多</b>，注意震盪");
    let marked: Vec<_> = segs
        .iter()
        .filter_map(|s| s.bias.map(|b| (s.text.as_str(), b)))
        .collect();
    assert_eq!(marked, vec![("偏多", Bias::Up), ("震盪", Bias::Side)]);
    let joined: String = segs.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(joined, "短線偏多，注意震盪");
}
