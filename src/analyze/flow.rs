//! 7-day flow aggregates over crypto signals.
//!
//! Two metrics:
//! - **ETF net flow**: signals mentioning "ETF" with an amount ≥ the noise
//!   floor and exactly one of inflow/outflow wording, summed with sign.
//! - **Liquidation total**: signals with a liquidation keyword followed by an
//!   amount within a short span, summed as absolute values.
//!
//! A server-computed figure (`cryptoSignalMetrics7d`) takes precedence over
//! local computation. `contributing_count == 0` means "no data", which is not
//! the same as a net flow of zero.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::amount::extract_usd;
use crate::snapshot::{Metrics7d, Signal};

// ASCII-letter boundary: `\b` is Unicode-aware and would reject "現貨ETF".
static RE_ETF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^a-z])etfs?(?:[^a-z]|$)").expect("etf regex"));
static RE_OUTFLOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)outflow|流出").expect("outflow regex"));
static RE_INFLOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)inflow|流入").expect("inflow regex"));
static RE_LIQUIDATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)liquidat\w*|爆倉|清算").expect("liquidation regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMetric {
    EtfNetFlow,
    LiquidationTotal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateFlow {
    #[serde(default, alias = "totalUsd", alias = "usd")]
    pub net_usd: f64,
    #[serde(default, alias = "count")]
    pub contributing_count: u32,
}

impl AggregateFlow {
    pub fn has_data(&self) -> bool {
        self.contributing_count > 0
    }

    /// "—" without contributors, otherwise a compact USD figure.
    pub fn display(&self, signed: bool) -> String {
        if self.has_data() {
            format_usd_compact(self.net_usd, signed)
        } else {
            "—".to_string()
        }
    }
}

/// Thresholds for local aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    pub window: Duration,
    pub etf_min_usd: f64,
    pub liquidation_min_usd: f64,
    /// Max chars between the liquidation keyword and its amount.
    pub liquidation_span_chars: usize,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window: Duration::days(7),
            etf_min_usd: 5_000_000.0,
            liquidation_min_usd: 1_000_000.0,
            liquidation_span_chars: 60,
        }
    }
}

impl Metrics7d {
    pub fn for_metric(&self, metric: FlowMetric) -> Option<AggregateFlow> {
        match metric {
            FlowMetric::EtfNetFlow => self.etf_net_flow,
            FlowMetric::LiquidationTotal => self.liquidation_total,
        }
    }
}

/// Aggregate `metric`, preferring the precomputed figure when present.
pub fn aggregate(
    signals: &[Signal],
    metric: FlowMetric,
    now: DateTime<Utc>,
    precomputed: Option<&Metrics7d>,
    params: &FlowParams,
) -> AggregateFlow {
    if let Some(pre) = precomputed.and_then(|m| m.for_metric(metric)) {
        return pre;
    }
    let windowed = in_window(signals, now, params.window);
    match metric {
        FlowMetric::EtfNetFlow => etf_net_flow(&windowed, params),
        FlowMetric::LiquidationTotal => liquidation_total(&windowed, params),
    }
}

/// Signals with a parseable time at or after `now - window`. A window
/// reaching past the representable range has no lower bound.
pub fn in_window(signals: &[Signal], now: DateTime<Utc>, window: Duration) -> Vec<&Signal> {
    let cutoff = now.checked_sub_signed(window);
    signals
        .iter()
        .filter(|s| {
            s.parsed_time()
                .is_some_and(|t| cutoff.map_or(true, |c| t >= c))
        })
        .collect()
}

pub fn etf_net_flow(signals: &[&Signal], params: &FlowParams) -> AggregateFlow {
    let mut out = AggregateFlow::default();
    for s in signals {
        let text = s.headline_text();
        if !RE_ETF.is_match(&text) {
            continue;
        }
        let Some(amount) = extract_usd(&text) else {
            discard("etf", "no_amount");
            continue;
        };
        if amount < params.etf_min_usd {
            discard("etf", "below_floor");
            continue;
        }
        let outflow = RE_OUTFLOW.is_match(&text);
        let inflow = RE_INFLOW.is_match(&text);
        if outflow == inflow {
            discard("etf", "ambiguous_direction");
            continue;
        }
        out.net_usd += if outflow { -amount } else { amount };
        out.contributing_count += 1;
    }
    out
}

pub fn liquidation_total(signals: &[&Signal], params: &FlowParams) -> AggregateFlow {
    let mut out = AggregateFlow::default();
    for s in signals {
        let text = s.headline_text();
        if !RE_LIQUIDATION.is_match(&text) {
            continue;
        }
        let Some(amount) = liquidation_amount(&text, params.liquidation_span_chars) else {
            discard("liquidation", "no_amount_near_keyword");
            continue;
        };
        if amount < params.liquidation_min_usd {
            discard("liquidation", "below_floor");
            continue;
        }
        out.net_usd += amount.abs();
        out.contributing_count += 1;
    }
    out
}

/// First amount that follows a liquidation keyword within `span` chars.
pub fn liquidation_amount(text: &str, span: usize) -> Option<f64> {
    RE_LIQUIDATION.find_iter(text).find_map(|m| {
        let tail: String = text[m.end()..].chars().take(span).collect();
        extract_usd(&tail)
    })
}

fn discard(metric: &'static str, reason: &'static str) {
    tracing::trace!(target: "flow", metric, reason, "record discarded");
    counter!("flow_records_discarded_total", "metric" => metric, "reason" => reason).increment(1);
}

/// `$1.23B`, `$12.5M`, `$4.0K`, `$950`; `signed` prefixes `+`/`-`.
pub fn format_usd_compact(v: f64, signed: bool) -> String {
    let sign = match (signed, v.partial_cmp(&0.0)) {
        (true, Some(std::cmp::Ordering::Greater)) => "+",
        (_, Some(std::cmp::Ordering::Less)) => "-",
        _ => "",
    };
    let a = v.abs();
    let body = if a >= 1e9 {
        format!("{:.2}B", a / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", a / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}K", a / 1e3)
    } else {
        format!("{a:.0}")
    };
    format!("{sign}${body}")
}
