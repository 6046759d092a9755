// tests/rate_cut_model.rs
//
// Model-mode rate-cut outlook: bounds, reproducibility and the
// "cut + bullish CPI + bullish NFP" scenario.

use chrono::{DateTime, Utc};
use crypto_signal_desk::analyze::rate_cut::{model, outlook};
use crypto_signal_desk::snapshot::{
    Country, EventStatus, EventType, MacroEvent, MacroResult, OutlookMode, RateCutData, Reading,
    Signal,
};
use crypto_signal_desk::timeutil::parse_ts;

fn now() -> DateTime<Utc> {
    parse_ts("2026-10-18T00:00:00Z").unwrap()
}

fn published(kind: EventType, when: &str, bias: &str) -> MacroEvent {
    MacroEvent {
        datetime: Some(when.into()),
        country: Country::Us,
        event_type: kind,
        status: EventStatus::Recent,
        result: Some(MacroResult {
            actual: Some(Reading::Text("1".into())),
            short_term_bias: Some(bias.into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn rate_decision(when: &str, actual: &str, previous: &str) -> MacroEvent {
    MacroEvent {
        datetime: Some(when.into()),
        country: Country::Us,
        event_type: EventType::CentralBank,
        status: EventStatus::Recent,
        result: Some(MacroResult {
            actual: Some(Reading::Text(actual.into())),
            previous: Some(Reading::Text(previous.into())),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn upcoming_fomc(when: &str) -> MacroEvent {
    MacroEvent {
        datetime: Some(when.into()),
        title: Some("FOMC Rate Decision".into()),
        country: Country::Us,
        event_type: EventType::CentralBank,
        status: EventStatus::Upcoming,
        ..Default::default()
    }
}

fn risk(bias: &str) -> Signal {
    Signal {
        short_term_bias: Some(bias.into()),
        ..Default::default()
    }
}

#[test]
fn cut_plus_bullish_data_scores_eighty() {
    let events = vec![
        published(EventType::Cpi, "2026-10-15T12:30:00Z", "偏多"),
        published(EventType::Nfp, "2026-10-03T12:30:00Z", "偏多"),
        rate_decision("2026-09-17T18:00:00Z", "4.00-4.25", "4.25-4.50"),
        upcoming_fomc("2026-12-10T19:00:00Z"),
    ];
    let risks = vec![risk("偏空"), risk("偏多")];
    let o = model(&events, &risks, now());
    assert_eq!(o.probability, 80);
    assert_eq!(o.month_label, "2026年12月");
    assert_eq!(o.event_title, "FOMC Rate Decision");
    for part in ["降息", "CPI：偏多", "非農：偏多", "外部風險：中性"] {
        assert!(o.basis.contains(part), "basis missing {part}: {}", o.basis);
    }
}

#[test]
fn hike_and_bearish_everything_stays_in_bounds() {
    let events = vec![
        published(EventType::Cpi, "2026-10-15T12:30:00Z", "偏空"),
        published(EventType::Nfp, "2026-10-03T12:30:00Z", "偏空"),
        rate_decision("2026-09-17T18:00:00Z", "5.50", "5.25"),
    ];
    let risks = vec![risk("偏空")];
    let o = model(&events, &risks, now());
    // 45 - 15 - 10 - 10 - 5
    assert_eq!(o.probability, 5);
}

#[test]
fn unpublished_events_do_not_count() {
    let mut cpi = published(EventType::Cpi, "2026-10-15T12:30:00Z", "偏多");
    cpi.result = None;
    let mut nfp = published(EventType::Nfp, "2026-10-03T12:30:00Z", "偏多");
    nfp.result = Some(MacroResult {
        actual: Some(Reading::Text("  ".into())),
        short_term_bias: Some("偏多".into()),
        ..Default::default()
    });
    assert_eq!(model(&[cpi, nfp], &[], now()).probability, 45);
}

#[test]
fn non_us_rate_decisions_are_ignored() {
    let mut boj = rate_decision("2026-09-17T18:00:00Z", "0.25", "0.50");
    boj.country = Country::Jp;
    assert_eq!(model(&[boj], &[], now()).probability, 45);
}

#[test]
fn past_upcoming_meeting_is_not_next() {
    let o = model(&[upcoming_fomc("2026-10-01T18:00:00Z")], &[], now());
    assert_eq!(o.month_label, "未定");
    assert_eq!(o.event_title, "下一次利率會議");
}

#[test]
fn identical_input_identical_output() {
    let events = vec![
        published(EventType::Cpi, "2026-10-15T12:30:00Z", "偏多"),
        rate_decision("2026-09-17T18:00:00Z", "4.25", "4.25"),
        upcoming_fomc("2026-10-29T18:00:00Z"),
    ];
    let a = model(&events, &[risk("偏空")], now());
    let b = model(&events, &[risk("偏空")], now());
    assert_eq!(a, b);
    assert_eq!(a.probability, 50);
}

#[test]
fn concrete_outlook_is_authoritative() {
    let data = RateCutData {
        mode: Some(OutlookMode::Concrete),
        probability: Some(12.4),
        ..Default::default()
    };
    let events = vec![rate_decision("2026-09-17T18:00:00Z", "4.00", "4.25")];
    let o = outlook(Some(&data), &events, &[], now());
    assert_eq!(o.mode, OutlookMode::Concrete);
    assert_eq!(o.probability, 12);
    assert_eq!(o.month_label, "未定");
}
