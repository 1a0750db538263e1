//! Ranker
//!
//! Order: final score desc, contributing source count desc, canonical label asc.
//! Scores arrive rounded to reported precision (see `aggregator::round_score`).

use crate::types::AggregatedTrope;
use std::cmp::Ordering;

/// Ranking comparator
pub fn compare(a: &AggregatedTrope, b: &AggregatedTrope) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.source_count().cmp(&a.source_count()))
        .then_with(|| a.canonical_label.cmp(&b.canonical_label))
}

/// Sort and keep at most `top_n` tropes
pub fn rank(mut tropes: Vec<AggregatedTrope>, top_n: usize) -> Vec<AggregatedTrope> {
    tropes.sort_by(compare);
    tropes.truncate(top_n);
    tropes
}
