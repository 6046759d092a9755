//! # View Engine
//! Pure, testable logic that maps one `DashboardSnapshot` → `DashboardView`.
//! No I/O, suitable for unit tests and offline rendering.
//!
//! Every panel degrades to fixed display defaults when its input is absent,
//! so a partial snapshot always yields a complete view.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::analyze::bias::{segment, BiasSegment, BiasTag};
use crate::analyze::flow::{aggregate, AggregateFlow, FlowMetric};
use crate::analyze::normalize::{first_non_empty, strip_html, text_or};
use crate::analyze::rate_cut::{outlook, RateCutOutlook};
use crate::analyze::translate::translate;
use crate::config::EngineParams;
use crate::rank::{
    drop_near_duplicates, filter_high_impact, macro_visible, sort_by_recency, top_n,
};
use crate::snapshot::{
    Category, DashboardSnapshot, EventStatus, Impact, MacroEvent, Signal, WhaleDetail,
};

const OVERALL_DEFAULT: &str = "目前市場趨勢資料整理中。";
const EXTERNAL_RISK_DEFAULT: &str = "外部風險中性";
const SHORT_TREND_DEFAULT: &str = "短線震盪";
const NEXT_EVENT_DEFAULT: &str = "未來 7 天暫無高影響事件";
const NEXT_EVENT_SUB_DEFAULT: &str = "重點看事件前後 1-2 小時波動";
const HIGH_RISK_DEFAULT: &str = "目前無高風險訊號";
const EXTERNAL_SIGNAL_DEFAULT: &str = "目前外部風險訊號偏少";
const WHALE_TREND_DEFAULT: &str = "中性";
const WHALE_SUMMARY_DEFAULT: &str = "無足夠資料";
const WHALE_PANEL_SUMMARY_DEFAULT: &str = "近期無足夠巨鯨線索";
const WHALE_DETAILS_EMPTY: &str = "近期無可用巨鯨明確紀錄。";
const RISK_EMPTY_HINT: &str = "仍建議持續觀察川普政策、戰爭與制裁消息。";
const KEY_WINDOWS_NOTE_DEFAULT: &str = "未來 7 天暫無高影響窗口。";

const RESULT_PENDING: &str = "尚未公布";
const ANALYSIS_PENDING: &str = "等待公布後更新";
const IMPACT_MISSING: &str = "等待補充";
const IMPACT_PENDING: &str = "待公布後判讀";
const BIAS_PENDING: &str = "待確認";

const SIGNAL_IMPACT_DEFAULT: &str = "市場影響評估中";
const SIGNAL_ANALYSIS_DEFAULT: &str = "等待更多資料補充分析";
const SIGNAL_CHANGE_DEFAULT: &str = "關鍵變化整理中";

/// Caller state for one build.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub now: DateTime<Utc>,
    pub only_high_impact: bool,
}

impl ViewOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            only_high_impact: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub generated_at: Option<DateTime<Utc>>,
    pub overall: OverallTrend,
    pub overview: Vec<OverviewCard>,
    pub ai_insights: Vec<Vec<BiasSegment>>,
    pub key_windows: KeyWindowsPanel,
    pub macro_events: Vec<MacroRow>,
    pub crypto_signals: Vec<SignalCard>,
    pub policy_signals: Vec<SignalCard>,
    pub whale: WhalePanel,
    pub global_risks: RiskPanel,
    pub flows: FlowPanel,
    pub rate_cut: RateCutOutlook,
    pub intel: IntelPanel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallTrend {
    pub summary: Vec<BiasSegment>,
    pub external_risk: BiasTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    ShortTermTrend,
    NextHighImpact,
    HighRisk,
    ExternalRisk,
    Whale,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewCard {
    pub kind: CardKind,
    pub title: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasTag>,
    pub sub: Vec<BiasSegment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWindowRow {
    pub at: Option<DateTime<Utc>>,
    pub title: String,
    pub country: String,
    pub why: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWindowsPanel {
    pub items: Vec<KeyWindowRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroRow {
    pub at: Option<DateTime<Utc>>,
    pub title: String,
    pub country: &'static str,
    pub importance: Impact,
    pub importance_label: &'static str,
    pub status: EventStatus,
    pub status_label: &'static str,
    pub published: bool,
    pub result_text: String,
    pub analysis: String,
    pub crypto_impact: String,
    pub bias: BiasTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCard {
    pub at: Option<DateTime<Utc>>,
    pub title: String,
    pub summary: String,
    pub category: Category,
    pub category_label: &'static str,
    pub impact: Impact,
    pub impact_label: &'static str,
    pub bias: BiasTag,
    pub key_change: String,
    pub crypto_impact: String,
    pub analysis: Vec<BiasSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub merged_count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleRow {
    pub at: Option<DateTime<Utc>>,
    pub actor: String,
    pub action: String,
    pub bias: BiasTag,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhalePanel {
    pub trend: BiasTag,
    pub summary: String,
    pub bull: u32,
    pub bear: u32,
    pub neutral: u32,
    pub details: Vec<WhaleRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_note: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCard {
    pub at: Option<DateTime<Utc>>,
    pub title: String,
    pub key_change: String,
    pub crypto_impact: String,
    pub bias: BiasTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPanel {
    pub items: Vec<RiskCard>,
    /// Set when there is nothing to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowFigure {
    pub metric: FlowMetric,
    pub net_usd: f64,
    pub contributing_count: u32,
    pub display: String,
    pub precomputed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPanel {
    pub etf_net_flow: FlowFigure,
    pub liquidation_total: FlowFigure,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelPanel {
    pub market: Option<serde_json::Value>,
    pub rates: Option<serde_json::Value>,
    pub liquidity: Option<serde_json::Value>,
}

/// Build the whole view. Total: never fails, never reads the clock.
pub fn build_view(
    snap: &DashboardSnapshot,
    opts: &ViewOptions,
    params: &EngineParams,
) -> DashboardView {
    let now = opts.now;

    // 1) Display lists: recency sort, the toggle, then near-duplicate drop.
    // A low-impact near-copy must not hide a high-impact record.
    let crypto = sort_by_recency(snap.crypto_signals.iter().collect::<Vec<_>>());
    let crypto_visible = drop_near_duplicates(
        filter_high_impact(crypto.clone(), opts.only_high_impact),
        params.duplicate_similarity,
    );
    let policy = drop_near_duplicates(
        sort_by_recency(snap.policy_signals.iter().collect()),
        params.duplicate_similarity,
    );
    let risks = top_n(
        drop_near_duplicates(
            sort_by_recency(snap.global_risk_signals.iter().collect()),
            params.duplicate_similarity,
        ),
        params.risk_top_n,
    );
    let macros = sort_by_recency(macro_visible(
        &snap.macro_events,
        now,
        params.macro_window(),
    ));

    // 2) Aggregates run on the raw lists, not the display lists
    let flow_params = params.flow_params();
    let pre = snap.crypto_signal_metrics_7d.as_ref();
    let etf = aggregate(&snap.crypto_signals, FlowMetric::EtfNetFlow, now, pre, &flow_params);
    let liq = aggregate(
        &snap.crypto_signals,
        FlowMetric::LiquidationTotal,
        now,
        pre,
        &flow_params,
    );
    let rate_cut = outlook(
        snap.rate_cut_data.as_ref(),
        &snap.macro_events,
        &snap.global_risk_signals,
        now,
    );

    let view = DashboardView {
        generated_at: snap.generated_at(),
        overall: overall_trend(snap),
        overview: overview_cards(snap, &crypto, &risks),
        ai_insights: snap
            .ai_summary
            .key_insights
            .iter()
            .map(|s| segment(s))
            .filter(|segs| !segs.is_empty())
            .collect(),
        key_windows: key_windows(snap),
        macro_events: macros.into_iter().map(macro_row).collect(),
        crypto_signals: crypto_visible.into_iter().map(signal_card).collect(),
        policy_signals: policy.into_iter().map(signal_card).collect(),
        whale: whale_panel(snap),
        global_risks: risk_panel(&risks),
        flows: FlowPanel {
            etf_net_flow: flow_figure(FlowMetric::EtfNetFlow, etf, pre),
            liquidation_total: flow_figure(FlowMetric::LiquidationTotal, liq, pre),
        },
        rate_cut,
        intel: IntelPanel {
            market: snap.market_intel.clone(),
            rates: snap.rates_intel.clone(),
            liquidity: snap.liquidity_intel.clone(),
        },
    };

    counter!("dashboard_builds_total").increment(1);
    tracing::debug!(
        target: "engine",
        crypto = view.crypto_signals.len(),
        policy = view.policy_signals.len(),
        risks = view.global_risks.items.len(),
        macro_rows = view.macro_events.len(),
        etf_count = etf.contributing_count,
        liq_count = liq.contributing_count,
        mode = ?view.rate_cut.mode,
        high_impact_only = opts.only_high_impact,
        "view built"
    );
    view
}

fn overall_trend(snap: &DashboardSnapshot) -> OverallTrend {
    let mo = &snap.market_overview;
    OverallTrend {
        summary: segment(&text_or(mo.overall_summary.as_deref(), OVERALL_DEFAULT)),
        external_risk: BiasTag::with_fallback(
            mo.external_risk_bias.as_deref(),
            EXTERNAL_RISK_DEFAULT,
        ),
    }
}

fn overview_cards(
    snap: &DashboardSnapshot,
    crypto_sorted: &[&Signal],
    risks_sorted: &[&Signal],
) -> Vec<OverviewCard> {
    let mo = &snap.market_overview;

    let trend = BiasTag::with_fallback(mo.short_term_trend.as_deref(), SHORT_TREND_DEFAULT);
    let trend_card = OverviewCard {
        kind: CardKind::ShortTermTrend,
        title: "短線總趨勢",
        value: trend.text.clone(),
        at: None,
        bias: Some(trend),
        sub: Vec::new(),
    };

    let next_card = match &mo.next_high_impact {
        Some(ev) => OverviewCard {
            kind: CardKind::NextHighImpact,
            title: "下一個高影響事件",
            value: text_or(ev.title.as_deref(), NEXT_EVENT_DEFAULT),
            at: ev.parsed_time(),
            bias: None,
            sub: segment(&text_or(
                ev.result.as_ref().and_then(|r| r.crypto_impact.as_deref()),
                NEXT_EVENT_SUB_DEFAULT,
            )),
        },
        None => OverviewCard {
            kind: CardKind::NextHighImpact,
            title: "下一個高影響事件",
            value: NEXT_EVENT_DEFAULT.to_string(),
            at: None,
            bias: None,
            sub: segment(NEXT_EVENT_SUB_DEFAULT),
        },
    };

    let high_risk = crypto_sorted.iter().find(|s| s.impact == Impact::High);
    let high_card = OverviewCard {
        kind: CardKind::HighRisk,
        title: "高風險重點",
        value: high_risk
            .and_then(|s| {
                first_non_empty([
                    s.key_change.as_deref(),
                    s.zh_title.as_deref(),
                    s.title.as_deref(),
                ])
            })
            .unwrap_or_else(|| HIGH_RISK_DEFAULT.to_string()),
        at: high_risk.and_then(|s| s.parsed_time()),
        bias: None,
        sub: high_risk
            .map(|s| {
                let tag = BiasTag::from_text(s.short_term_bias.as_deref());
                segment(&format!("短線：{}", tag.text))
            })
            .unwrap_or_default(),
    };

    let external = risks_sorted.first();
    let external_card = OverviewCard {
        kind: CardKind::ExternalRisk,
        title: "外部風險重點",
        value: external
            .and_then(|s| first_non_empty([s.key_change.as_deref(), s.title.as_deref()]))
            .unwrap_or_else(|| EXTERNAL_SIGNAL_DEFAULT.to_string()),
        at: external.and_then(|s| s.parsed_time()),
        bias: None,
        sub: external
            .map(|s| {
                let tag = BiasTag::from_text(s.short_term_bias.as_deref());
                segment(&format!("方向：{}", tag.text))
            })
            .unwrap_or_default(),
    };

    let wt = &snap.whale_trend;
    let whale = BiasTag::with_fallback(wt.trend.as_deref(), WHALE_TREND_DEFAULT);
    let whale_card = OverviewCard {
        kind: CardKind::Whale,
        title: "巨鯨風向",
        value: whale.text.clone(),
        at: None,
        bias: Some(whale),
        sub: segment(&text_or(wt.summary.as_deref(), WHALE_SUMMARY_DEFAULT)),
    };

    vec![trend_card, next_card, high_card, external_card, whale_card]
}

fn key_windows(snap: &DashboardSnapshot) -> KeyWindowsPanel {
    let items: Vec<KeyWindowRow> = snap
        .key_windows
        .iter()
        .map(|w| KeyWindowRow {
            at: w.parsed_time(),
            title: text_or(w.title.as_deref(), ""),
            country: text_or(w.country.as_deref(), ""),
            why: text_or(w.why.as_deref(), ""),
        })
        .collect();
    let note = items
        .is_empty()
        .then(|| text_or(snap.key_windows_note.as_deref(), KEY_WINDOWS_NOTE_DEFAULT));
    KeyWindowsPanel { items, note }
}

fn macro_row(ev: &MacroEvent) -> MacroRow {
    let published = ev.published_result();
    let (result_text, analysis, crypto_impact, bias) = match published {
        Some(r) => {
            let actual = r.actual.as_ref().map(|a| a.display()).unwrap_or_default();
            let unit = r.unit.as_deref().map(strip_html).unwrap_or_default();
            let result_text = if unit.is_empty() || unit == "-" {
                actual
            } else {
                format!("{actual} {unit}")
            };
            (
                result_text,
                r.analysis.as_deref().map(strip_html).unwrap_or_default(),
                text_or(r.crypto_impact.as_deref(), IMPACT_MISSING),
                BiasTag::from_text(r.short_term_bias.as_deref()),
            )
        }
        None => (
            RESULT_PENDING.to_string(),
            ANALYSIS_PENDING.to_string(),
            IMPACT_PENDING.to_string(),
            BiasTag::from_text(Some(BIAS_PENDING)),
        ),
    };

    MacroRow {
        at: ev.parsed_time(),
        title: text_or(ev.title.as_deref(), ""),
        country: ev.country.label(),
        importance: ev.importance,
        importance_label: ev.importance.label(),
        status: ev.status,
        status_label: ev.status.label(),
        published: published.is_some(),
        result_text,
        analysis,
        crypto_impact,
        bias,
        source: ev.source.clone().filter(|s| !s.trim().is_empty()),
    }
}

fn signal_card(s: &Signal) -> SignalCard {
    let title = match s.zh_title.as_deref().map(strip_html) {
        Some(zh) if !zh.is_empty() => zh,
        _ => translate(s.title.as_deref().unwrap_or_default()),
    };
    let summary = match s.zh_summary.as_deref().map(strip_html) {
        Some(zh) if !zh.is_empty() => zh,
        _ => translate(s.summary.as_deref().unwrap_or_default()),
    };

    SignalCard {
        at: s.parsed_time(),
        title,
        summary,
        category: s.category,
        category_label: s.category.label(),
        impact: s.impact,
        impact_label: s.impact.label(),
        bias: BiasTag::from_text(s.short_term_bias.as_deref()),
        key_change: text_or(s.key_change.as_deref(), SIGNAL_CHANGE_DEFAULT),
        crypto_impact: text_or(s.crypto_impact.as_deref(), SIGNAL_IMPACT_DEFAULT),
        analysis: segment(&text_or(
            s.crypto_analysis.as_deref(),
            SIGNAL_ANALYSIS_DEFAULT,
        )),
        source: s.source.clone().filter(|u| !u.trim().is_empty()),
        merged_count: s.merged_count(),
    }
}

fn whale_panel(snap: &DashboardSnapshot) -> WhalePanel {
    let wt = &snap.whale_trend;
    let details: Vec<&WhaleDetail> = sort_by_recency(wt.details.iter().collect());
    let details_note = details.is_empty().then_some(WHALE_DETAILS_EMPTY);
    WhalePanel {
        trend: BiasTag::with_fallback(wt.trend.as_deref(), WHALE_TREND_DEFAULT),
        summary: text_or(wt.summary.as_deref(), WHALE_PANEL_SUMMARY_DEFAULT),
        bull: wt.bull.unwrap_or(0),
        bear: wt.bear.unwrap_or(0),
        neutral: wt.neutral.unwrap_or(0),
        details: details
            .into_iter()
            .map(|d| WhaleRow {
                at: d.parsed_time(),
                actor: text_or(d.actor.as_deref(), ""),
                action: text_or(d.action.as_deref(), ""),
                bias: BiasTag::from_text(d.bias.as_deref()),
            })
            .collect(),
        details_note,
    }
}

fn risk_panel(risks: &[&Signal]) -> RiskPanel {
    let items: Vec<RiskCard> = risks
        .iter()
        .map(|s| RiskCard {
            at: s.parsed_time(),
            title: match s.zh_title.as_deref().map(strip_html) {
                Some(zh) if !zh.is_empty() => zh,
                _ => translate(s.title.as_deref().unwrap_or_default()),
            },
            key_change: text_or(s.key_change.as_deref(), SIGNAL_CHANGE_DEFAULT),
            crypto_impact: text_or(s.crypto_impact.as_deref(), SIGNAL_IMPACT_DEFAULT),
            bias: BiasTag::from_text(s.short_term_bias.as_deref()),
            source: s.source.clone().filter(|u| !u.trim().is_empty()),
        })
        .collect();
    let empty = items.is_empty();
    RiskPanel {
        items,
        placeholder: empty.then_some(EXTERNAL_SIGNAL_DEFAULT),
        hint: empty.then_some(RISK_EMPTY_HINT),
    }
}

fn flow_figure(
    metric: FlowMetric,
    agg: AggregateFlow,
    pre: Option<&crate::snapshot::Metrics7d>,
) -> FlowFigure {
    let signed = metric == FlowMetric::EtfNetFlow;
    FlowFigure {
        metric,
        net_usd: agg.net_usd,
        contributing_count: agg.contributing_count,
        display: agg.display(signed),
        precomputed: pre.and_then(|m| m.for_metric(metric)).is_some(),
    }
}
