//! Raw API payloads → derived records. The `summarize_*` functions are pure;
//! `derive` wrappers do the fetching and hand the payloads over.

pub mod head_to_head;
pub mod team_stats;

/// Round to two decimals for stored averages.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
