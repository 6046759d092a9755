//! Input document model.
//!
//! One `DashboardSnapshot` is the whole payload the engine works on. Every
//! field is optional: missing keys, explicit `null`s and unknown enum values
//! all deserialize to defaults, so a partial payload never fails here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::analyze::flow::AggregateFlow;
use crate::timeutil;

/// `null` → `T::default()`; used for lists and nested objects.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Any JSON value → a finite number, or `None`. Numeric strings such as
/// `"62"` or `"62%"` are accepted; everything else is dropped quietly.
fn lenient_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(d)?;
    let n = match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    Ok(n.filter(|n: &f64| n.is_finite()))
}

/// Like [`lenient_f64`], but only whole, non-negative values in `u32` range.
fn lenient_count<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(d)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub market_overview: MarketOverview,
    #[serde(default, deserialize_with = "nullable")]
    pub crypto_signals: Vec<Signal>,
    #[serde(default, deserialize_with = "nullable")]
    pub global_risk_signals: Vec<Signal>,
    #[serde(default, deserialize_with = "nullable")]
    pub policy_signals: Vec<Signal>,
    #[serde(default, deserialize_with = "nullable")]
    pub macro_events: Vec<MacroEvent>,
    #[serde(default, deserialize_with = "nullable")]
    pub key_windows: Vec<KeyWindow>,
    #[serde(default)]
    pub key_windows_note: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub whale_trend: WhaleTrend,
    #[serde(default, deserialize_with = "nullable")]
    pub ai_summary: AiSummary,
    #[serde(default)]
    pub market_intel: Option<serde_json::Value>,
    #[serde(default)]
    pub rates_intel: Option<serde_json::Value>,
    #[serde(default)]
    pub liquidity_intel: Option<serde_json::Value>,
    #[serde(default)]
    pub rate_cut_data: Option<RateCutData>,
    #[serde(default, rename = "cryptoSignalMetrics7d")]
    pub crypto_signal_metrics_7d: Option<Metrics7d>,
}

impl DashboardSnapshot {
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        timeutil::parse_opt(self.generated_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    #[serde(default)]
    pub overall_summary: Option<String>,
    #[serde(default)]
    pub external_risk_bias: Option<String>,
    #[serde(default)]
    pub short_term_trend: Option<String>,
    #[serde(default)]
    pub next_high_impact: Option<MacroEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flow,
    Regulation,
    Risk,
    Macro,
    Market,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Flow => "資金流",
            Category::Regulation => "監管",
            Category::Risk => "風險",
            Category::Macro => "宏觀",
            Category::Market => "市場",
            Category::Other => "其他",
        }
    }
}

/// Severity tier; shared by signal `impact` and macro `importance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Impact {
    pub fn label(self) -> &'static str {
        match self {
            Impact::High => "高",
            Impact::Medium => "中",
            Impact::Low | Impact::Unknown => "低",
        }
    }
}

/// One ingested news/event item. `mergedCount` is set upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub zh_title: Option<String>,
    #[serde(default)]
    pub key_change: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub zh_summary: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Category,
    #[serde(default, deserialize_with = "nullable")]
    pub impact: Impact,
    #[serde(default)]
    pub short_term_bias: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub merged_count: Option<u32>,
    #[serde(default)]
    pub crypto_impact: Option<String>,
    #[serde(default)]
    pub crypto_analysis: Option<String>,
}

impl Signal {
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        timeutil::parse_opt(self.time.as_deref())
    }

    /// Upstream merge count, never below 1.
    pub fn merged_count(&self) -> u32 {
        self.merged_count.unwrap_or(1).max(1)
    }

    /// `title` and `keyChange` joined; the text flow matching runs on.
    pub fn headline_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        let change = self.key_change.as_deref().unwrap_or_default();
        format!("{title} {change}").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "JP")]
    Jp,
    #[default]
    #[serde(other)]
    Other,
}

impl Country {
    pub fn label(self) -> &'static str {
        match self {
            Country::Us => "美國",
            Country::Jp => "日本",
            Country::Other => "其他",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Cpi,
    Nfp,
    CentralBank,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    #[default]
    Recent,
    #[serde(other)]
    Other,
}

impl EventStatus {
    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "未來",
            EventStatus::Recent | EventStatus::Other => "近期 / 已公布",
        }
    }
}

/// A data point as it arrives: either a JSON number or a display string
/// such as `"4.50%"` or `"4.25-4.50"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn is_blank(&self) -> bool {
        match self {
            Reading::Number(_) => false,
            Reading::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Reading::Number(n) => n.to_string(),
            Reading::Text(s) => s.trim().to_string(),
        }
    }

    /// Numeric value of the reading. Percent signs are ignored and a
    /// range (`"4.25-4.50"`) resolves to its upper bound.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(n) if n.is_finite() => Some(*n),
            Reading::Number(_) => None,
            Reading::Text(s) => {
                let cleaned = s.replace(['%', ' '], "");
                let upper = match cleaned.rsplit_once(['-', '~', '–']) {
                    Some((lo, hi)) if !lo.is_empty() => hi,
                    _ => cleaned.as_str(),
                };
                upper.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroResult {
    #[serde(default)]
    pub actual: Option<Reading>,
    #[serde(default)]
    pub previous: Option<Reading>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub crypto_impact: Option<String>,
    #[serde(default)]
    pub short_term_bias: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroEvent {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub country: Country,
    #[serde(default, deserialize_with = "nullable")]
    pub event_type: EventType,
    #[serde(default, deserialize_with = "nullable")]
    pub status: EventStatus,
    #[serde(default, deserialize_with = "nullable")]
    pub importance: Impact,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub result: Option<MacroResult>,
}

impl MacroEvent {
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        timeutil::parse_opt(self.datetime.as_deref())
    }

    /// Published = a result with a non-blank `actual`. A `result` object
    /// without `actual` still counts as "not yet published".
    pub fn published_result(&self) -> Option<&MacroResult> {
        self.result
            .as_ref()
            .filter(|r| r.actual.as_ref().is_some_and(|a| !a.is_blank()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWindow {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
}

impl KeyWindow {
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        timeutil::parse_opt(self.datetime.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleDetail {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub bias: Option<String>,
}

impl WhaleDetail {
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        timeutil::parse_opt(self.time.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleTrend {
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bull: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bear: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub neutral: Option<u32>,
    #[serde(default, deserialize_with = "nullable")]
    pub details: Vec<WhaleDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    #[serde(default, deserialize_with = "nullable")]
    pub key_insights: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlookMode {
    Concrete,
    Model,
}

/// Externally supplied rate-cut outlook (`rateCutData`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCutData {
    #[serde(default)]
    pub mode: Option<OutlookMode>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub probability: Option<f64>,
    #[serde(default)]
    pub month_label: Option<String>,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub basis: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

/// Server-computed 7-day flow aggregates (`cryptoSignalMetrics7d`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics7d {
    #[serde(default, alias = "etf")]
    pub etf_net_flow: Option<AggregateFlow>,
    #[serde(default, alias = "liquidations")]
    pub liquidation_total: Option<AggregateFlow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_is_a_valid_snapshot() {
        let s: DashboardSnapshot = serde_json::from_value(json!({})).unwrap();
        assert!(s.crypto_signals.is_empty());
        assert!(s.rate_cut_data.is_none());
        assert!(s.generated_at().is_none());
    }

    #[test]
    fn nulls_and_unknown_enums_degrade() {
        let s: DashboardSnapshot = serde_json::from_value(json!({
            "cryptoSignals": null,
            "macroEvents": [{ "country": "DE", "eventType": "pmi", "status": "weird", "importance": null }],
            "whaleTrend": null
        }))
        .unwrap();
        assert!(s.crypto_signals.is_empty());
        let ev = &s.macro_events[0];
        assert_eq!(ev.country, Country::Other);
        assert_eq!(ev.event_type, EventType::Other);
        assert_eq!(ev.status, EventStatus::Other);
        assert_eq!(ev.importance, Impact::Unknown);
    }

    #[test]
    fn merged_count_never_below_one() {
        let s: Signal = serde_json::from_value(json!({ "mergedCount": 0 })).unwrap();
        assert_eq!(s.merged_count(), 1);
        let s: Signal = serde_json::from_value(json!({ "mergedCount": 4 })).unwrap();
        assert_eq!(s.merged_count(), 4);
    }

    #[test]
    fn mistyped_counts_are_coerced_or_dropped() {
        let cases = [
            (json!("3"), 3),
            (json!(2.0), 2),
            (json!(-1), 1),
            (json!(2.5), 1),
            (json!(true), 1),
            (json!("many"), 1),
        ];
        for (raw, want) in cases {
            let s: Signal = serde_json::from_value(json!({ "mergedCount": raw })).unwrap();
            assert_eq!(s.merged_count(), want, "mergedCount = {raw}");
        }

        let w: WhaleTrend =
            serde_json::from_value(json!({ "bull": "5", "bear": -2, "neutral": null })).unwrap();
        assert_eq!((w.bull, w.bear, w.neutral), (Some(5), None, None));
    }

    #[test]
    fn probability_accepts_numeric_strings() {
        let r: RateCutData =
            serde_json::from_value(json!({ "mode": "concrete", "probability": "62" })).unwrap();
        assert_eq!(r.probability, Some(62.0));
        let r: RateCutData = serde_json::from_value(json!({ "probability": "62.5%" })).unwrap();
        assert_eq!(r.probability, Some(62.5));
        let r: RateCutData = serde_json::from_value(json!({ "probability": "soon" })).unwrap();
        assert_eq!(r.probability, None);
    }

    #[test]
    fn readings_parse_numbers_percent_and_ranges() {
        assert_eq!(Reading::Number(4.5).as_f64(), Some(4.5));
        assert_eq!(Reading::Text("4.50%".into()).as_f64(), Some(4.5));
        assert_eq!(Reading::Text("4.25-4.50".into()).as_f64(), Some(4.5));
        assert_eq!(Reading::Text("-0.2".into()).as_f64(), Some(-0.2));
        assert_eq!(Reading::Text("n/a".into()).as_f64(), None);
    }

    #[test]
    fn result_without_actual_is_unpublished() {
        let ev: MacroEvent = serde_json::from_value(json!({
            "eventType": "cpi",
            "result": { "previous": "3.1", "analysis": "pending" }
        }))
        .unwrap();
        assert!(ev.result.is_some());
        assert!(ev.published_result().is_none());
    }
}
