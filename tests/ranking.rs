// tests/ranking.rs
//
// Recency ordering, visibility window and truncation.

use crypto_signal_desk::rank::{
    drop_near_duplicates, filter_high_impact, macro_visible, sort_by_recency, top_n, MacroWindow,
};
use crypto_signal_desk::snapshot::{Impact, MacroEvent, Signal};
use crypto_signal_desk::timeutil::parse_ts;

fn sig(time: &str, title: &str) -> Signal {
    Signal {
        time: Some(time.into()),
        title: Some(title.into()),
        ..Default::default()
    }
}

fn titles(v: &[&Signal]) -> Vec<String> {
    v.iter().map(|s| s.title.clone().unwrap_or_default()).collect()
}

fn mixed() -> Vec<Signal> {
    vec![
        sig("???", "bad-1"),
        sig("2026-10-10T00:00:00Z", "a"),
        sig("", "bad-2"),
        sig("2026-10-12 08:00", "b"),
        sig("2026-10-10T00:00:00Z", "c"),
        sig("2026-10-11", "d"),
    ]
}

#[test]
fn invalid_timestamps_always_last() {
    let input = mixed();
    let sorted = sort_by_recency(input.iter().collect());
    assert_eq!(titles(&sorted), vec!["b", "d", "a", "c", "bad-1", "bad-2"]);
}

#[test]
fn sorting_twice_is_idempotent() {
    let input = mixed();
    let once = sort_by_recency(input.iter().collect());
    let twice = sort_by_recency(once.clone());
    assert_eq!(titles(&once), titles(&twice));
}

#[test]
fn sort_leaves_input_untouched() {
    let input = mixed();
    let before = titles(&input.iter().collect::<Vec<_>>());
    let _ = sort_by_recency(input.iter().collect());
    assert_eq!(titles(&input.iter().collect::<Vec<_>>()), before);
}

#[test]
fn high_impact_filter_then_top_n() {
    let mut input = mixed();
    input[1].impact = Impact::High;
    input[3].impact = Impact::High;
    let sorted = sort_by_recency(input.iter().collect());
    let high = filter_high_impact(sorted.clone(), true);
    assert_eq!(titles(&high), vec!["b", "a"]);
    assert_eq!(titles(&top_n(sorted, 2)), vec!["b", "d"]);
}

#[test]
fn macro_window_is_display_only() {
    let now = parse_ts("2026-10-18T00:00:00Z").unwrap();
    let ev = |d: &str| MacroEvent {
        datetime: Some(d.into()),
        ..Default::default()
    };
    let events = vec![
        ev("2026-07-20T00:00:00Z"), // exactly 90 days back
        ev("2026-07-19T23:59:59Z"),
        ev("2027-10-18T00:00:00Z"), // exactly 365 days ahead
        ev("2027-10-18T00:00:01Z"),
    ];
    let visible = macro_visible(&events, now, MacroWindow::default());
    assert_eq!(visible.len(), 2);
    assert_eq!(events.len(), 4);
}

#[test]
fn near_duplicate_titles_collapse_to_newest() {
    let input = vec![
        sig("2026-10-16T00:00:00Z", "SEC delays Solana ETF decision"),
        sig("2026-10-17T00:00:00Z", "SEC delays Solana ETF decision."),
        sig("2026-10-15T00:00:00Z", "Bitcoin hashrate hits record"),
    ];
    let kept = drop_near_duplicates(sort_by_recency(input.iter().collect()), 0.92);
    assert_eq!(
        titles(&kept),
        vec!["SEC delays Solana ETF decision.", "Bitcoin hashrate hits record"]
    );
}
