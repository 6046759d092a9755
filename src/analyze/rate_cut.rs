//! Rate-cut outlook for the next Fed decision.
//!
//! Two modes:
//! - `concrete`: an externally supplied probability is authoritative and is
//!   passed through (rounded).
//! - `model`: a fixed integer heuristic over the snapshot's macro history:
//!
//! | input                                   | adjustment |
//! |-----------------------------------------|------------|
//! | base                                    | 45         |
//! | latest US rate decision cut / hiked     | +15 / −15  |
//! | latest CPI bias up / down               | +10 / −10  |
//! | latest NFP bias up / down               | +10 / −10  |
//! | risk signals net bullish / bearish      | +5 / −5    |
//!
//! The sum is clamped to `[5, 95]`. Integer arithmetic only, so identical
//! input gives identical output.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::bias::{classify, Bias};
use super::normalize::{strip_html, text_or};
use crate::rank::sort_by_recency;
use crate::snapshot::{
    Country, EventStatus, EventType, MacroEvent, MacroResult, OutlookMode, RateCutData, Signal,
};

pub const BASE_SCORE: i32 = 45;
pub const MIN_PROBABILITY: i32 = 5;
pub const MAX_PROBABILITY: i32 = 95;

pub const UNDETERMINED_MONTH: &str = "未定";
pub const NEXT_MEETING_TITLE: &str = "下一次利率會議";
const DEFAULT_FOMC_TITLE: &str = "FOMC 利率決議";
const NO_DATA: &str = "無資料";

const RATE_STEP: i32 = 15;
const DATA_STEP: i32 = 10;
const RISK_STEP: i32 = 5;

/// One scored input; kept for explainability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub factor: &'static str,
    pub delta: i32,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCutOutlook {
    pub mode: OutlookMode,
    pub probability: u8,
    pub month_label: String,
    pub event_title: String,
    pub basis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<Adjustment>,
}

/// Concrete data wins when it carries a usable probability; otherwise the
/// model runs on `events` and `risk_signals`.
pub fn outlook(
    concrete: Option<&RateCutData>,
    events: &[MacroEvent],
    risk_signals: &[Signal],
    now: DateTime<Utc>,
) -> RateCutOutlook {
    if let Some(o) = concrete.and_then(pass_through) {
        return o;
    }
    model(events, risk_signals, now)
}

fn pass_through(data: &RateCutData) -> Option<RateCutOutlook> {
    if data.mode != Some(OutlookMode::Concrete) {
        return None;
    }
    let Some(p) = data.probability.filter(|p| p.is_finite()) else {
        tracing::warn!(target: "rate_cut", "concrete outlook without probability; using model");
        return None;
    };
    Some(RateCutOutlook {
        mode: OutlookMode::Concrete,
        probability: p.round().clamp(0.0, 100.0) as u8,
        month_label: text_or(data.month_label.as_deref(), UNDETERMINED_MONTH),
        event_title: text_or(data.event_title.as_deref(), NEXT_MEETING_TITLE),
        basis: data.basis.as_deref().map(strip_html).unwrap_or_default(),
        source_name: data
            .source_name
            .as_deref()
            .map(strip_html)
            .filter(|s| !s.is_empty()),
        adjustments: Vec::new(),
    })
}

/// Local heuristic; see module docs for the table.
pub fn model(events: &[MacroEvent], risk_signals: &[Signal], now: DateTime<Utc>) -> RateCutOutlook {
    let adjustments = vec![
        rate_decision_adjustment(events),
        data_release_adjustment(events, EventType::Cpi, "cpi", "CPI"),
        data_release_adjustment(events, EventType::Nfp, "nfp", "非農"),
        risk_adjustment(risk_signals),
    ];

    let score = BASE_SCORE + adjustments.iter().map(|a| a.delta).sum::<i32>();
    let probability = score.clamp(MIN_PROBABILITY, MAX_PROBABILITY) as u8;

    let (month_label, event_title) = match next_decision(events, now) {
        Some((when, ev)) => (
            format!("{}年{}月", when.year(), when.month()),
            text_or(ev.title.as_deref(), DEFAULT_FOMC_TITLE),
        ),
        None => (UNDETERMINED_MONTH.to_string(), NEXT_MEETING_TITLE.to_string()),
    };

    let basis = adjustments
        .iter()
        .map(|a| a.note.as_str())
        .collect::<Vec<_>>()
        .join("｜");

    RateCutOutlook {
        mode: OutlookMode::Model,
        probability,
        month_label,
        event_title,
        basis,
        source_name: None,
        adjustments,
    }
}

/// Most recent published event matching `pred`; ties keep input order.
fn latest_published<'a>(
    events: &'a [MacroEvent],
    pred: impl Fn(&MacroEvent) -> bool,
) -> Option<(&'a MacroEvent, &'a MacroResult)> {
    let published: Vec<&MacroEvent> = events
        .iter()
        .filter(|&e| pred(e) && e.published_result().is_some())
        .collect();
    sort_by_recency(published)
        .into_iter()
        .next()
        .and_then(|e| e.published_result().map(|r| (e, r)))
}

fn rate_decision_adjustment(events: &[MacroEvent]) -> Adjustment {
    let latest = latest_published(events, |e| {
        e.event_type == EventType::CentralBank && e.country == Country::Us
    });
    let rates = latest.and_then(|(_, r)| {
        let actual = r.actual.as_ref()?.as_f64()?;
        let previous = r.previous.as_ref()?.as_f64()?;
        Some((actual, previous))
    });

    let (delta, note) = match rates {
        Some((a, p)) if a < p => (RATE_STEP, format!("利率決議：降息（{p} → {a}）")),
        Some((a, p)) if a > p => (-RATE_STEP, format!("利率決議：升息（{p} → {a}）")),
        Some((a, _)) => (0, format!("利率決議：維持（{a}）")),
        None => (0, format!("利率決議：{NO_DATA}")),
    };
    Adjustment {
        factor: "rate_decision",
        delta,
        note,
    }
}

fn data_release_adjustment(
    events: &[MacroEvent],
    kind: EventType,
    factor: &'static str,
    label: &str,
) -> Adjustment {
    let bias = latest_published(events, |e| e.event_type == kind)
        .map(|(_, r)| classify(r.short_term_bias.as_deref().unwrap_or_default()));

    let (delta, note) = match bias {
        Some(Bias::Up) => (DATA_STEP, format!("{label}：{}", Bias::Up.label())),
        Some(Bias::Down) => (-DATA_STEP, format!("{label}：{}", Bias::Down.label())),
        Some(b) => (0, format!("{label}：{}", b.label())),
        None => (0, format!("{label}：{NO_DATA}")),
    };
    Adjustment {
        factor,
        delta,
        note,
    }
}

fn risk_adjustment(risk_signals: &[Signal]) -> Adjustment {
    let (mut bull, mut bear) = (0usize, 0usize);
    for s in risk_signals {
        match classify(s.short_term_bias.as_deref().unwrap_or_default()) {
            Bias::Up => bull += 1,
            Bias::Down => bear += 1,
            Bias::Side | Bias::Muted => {}
        }
    }
    let (delta, lean) = match bear.cmp(&bull) {
        std::cmp::Ordering::Greater => (-RISK_STEP, Bias::Down.label()),
        std::cmp::Ordering::Less => (RISK_STEP, Bias::Up.label()),
        std::cmp::Ordering::Equal => (0, "中性"),
    };
    Adjustment {
        factor: "external_risk",
        delta,
        note: format!("外部風險：{lean}（多 {bull} / 空 {bear}）"),
    }
}

/// Earliest upcoming US rate decision dated at or after `now`.
fn next_decision(events: &[MacroEvent], now: DateTime<Utc>) -> Option<(DateTime<Utc>, &MacroEvent)> {
    events
        .iter()
        .filter(|e| {
            e.status == EventStatus::Upcoming
                && e.event_type == EventType::CentralBank
                && e.country == Country::Us
        })
        .filter_map(|e| e.parsed_time().filter(|t| *t >= now).map(|t| (t, e)))
        .min_by_key(|(t, _)| *t)
}
