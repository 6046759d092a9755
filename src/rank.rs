//! Ordering and visibility filters for display lists.
//!
//! Every function here is pure and takes its inputs by value or reference;
//! the "only high impact" toggle is a parameter, not state.
//!
//! Recency sort is stable (ties keep input order) and puts records with an
//! unparseable timestamp after every record with a valid one.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, Utc};
use strsim::normalized_levenshtein;

use crate::analyze::normalize::strip_html;
use crate::snapshot::{Impact, KeyWindow, MacroEvent, Signal, WhaleDetail};
use crate::timeutil::sort_key;

/// Anything that can be placed on a timeline.
pub trait Timestamped {
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for Signal {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.parsed_time()
    }
}

impl Timestamped for MacroEvent {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.parsed_time()
    }
}

impl Timestamped for WhaleDetail {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.parsed_time()
    }
}

impl Timestamped for KeyWindow {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.parsed_time()
    }
}

impl<T: Timestamped + ?Sized> Timestamped for &T {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        (**self).timestamp()
    }
}

/// Newest first; invalid timestamps last; stable.
pub fn sort_by_recency<T: Timestamped>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by_key(|it| Reverse(sort_key(it.timestamp())));
    items
}

/// Keep only `impact == high` when `only_high` is set; otherwise pass through.
pub fn filter_high_impact<'a>(signals: Vec<&'a Signal>, only_high: bool) -> Vec<&'a Signal> {
    if !only_high {
        return signals;
    }
    signals
        .into_iter()
        .filter(|s| s.impact == Impact::High)
        .collect()
}

/// Display window for macro events around `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroWindow {
    pub past: Duration,
    pub future: Duration,
}

impl Default for MacroWindow {
    fn default() -> Self {
        Self {
            past: Duration::days(90),
            future: Duration::days(365),
        }
    }
}

/// Events dated within `[now - past, now + future]`. Undated events are kept
/// (they sort last); the window only hides events it can place.
pub fn macro_visible<'a>(
    events: &'a [MacroEvent],
    now: DateTime<Utc>,
    window: MacroWindow,
) -> Vec<&'a MacroEvent> {
    // Overflowing bounds are open.
    let lo = now.checked_sub_signed(window.past);
    let hi = now.checked_add_signed(window.future);
    events
        .iter()
        .filter(|e| {
            e.parsed_time().map_or(true, |t| {
                lo.map_or(true, |lo| t >= lo) && hi.map_or(true, |hi| t <= hi)
            })
        })
        .collect()
}

/// First `n` items.
pub fn top_n<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    items.truncate(n);
    items
}

/// Drop signals whose title is a near-duplicate of an earlier kept one.
/// Expects recency-sorted input so the newest copy survives.
pub fn drop_near_duplicates<'a>(signals: Vec<&'a Signal>, threshold: f64) -> Vec<&'a Signal> {
    let mut kept: Vec<&Signal> = Vec::with_capacity(signals.len());
    let mut kept_titles: Vec<String> = Vec::with_capacity(signals.len());

    for s in signals {
        let title = title_key(s);
        let dup = !title.is_empty()
            && kept_titles
                .iter()
                .any(|k| !k.is_empty() && normalized_levenshtein(k, &title) >= threshold);
        if dup {
            tracing::trace!(target: "rank", "near-duplicate signal dropped");
            continue;
        }
        kept_titles.push(title);
        kept.push(s);
    }
    kept
}

fn title_key(s: &Signal) -> String {
    let raw = s
        .title
        .as_deref()
        .or(s.zh_title.as_deref())
        .unwrap_or_default();
    strip_html(raw).to_lowercase()
}
