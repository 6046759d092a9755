// src/analyze/mod.rs
//! Text interpretation and aggregate scoring: amounts, bias, translation,
//! 7-day flows and the rate-cut outlook.

pub mod amount;
pub mod bias;
pub mod flow;
pub mod normalize;
pub mod rate_cut;
pub mod translate;

// Re-export convenient types.
pub use crate::analyze::amount::extract_usd;
pub use crate::analyze::bias::{classify, segment, Bias, BiasSegment, BiasTag};
pub use crate::analyze::flow::{aggregate, AggregateFlow, FlowMetric, FlowParams};
pub use crate::analyze::normalize::strip_html;
pub use crate::analyze::rate_cut::{outlook, RateCutOutlook};
pub use crate::analyze::translate::{translate, Rewriter};
