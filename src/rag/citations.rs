//! Citation Assembler.
//!
//! Turns a ranked passage list into displayable citations. Ordering
//! fidelity is a contract: the output order equals the input order, with
//! no deduplication — consumers that want a deduplicated display list
//! dedupe by `source_name` themselves.

use super::models::{Citation, RetrievedPassage};

pub fn build_citations(passages: &[RetrievedPassage]) -> Vec<Citation> {
    passages
        .iter()
        .map(|p| Citation {
            source_name: p.chunk.source_name.clone(),
            chunk_text: p.chunk.text.clone(),
            chunk_index: p.chunk.chunk_index,
            relevance_score: relevance_score(p.distance),
        })
        .collect()
}

/// `clamp(1 - distance, 0, 1)` rounded to 4 decimal places. Assumes a
/// cosine-style distance roughly bounded in [0, 1]; distances above 1
/// clamp to 0 rather than going negative.
fn relevance_score(distance: f64) -> f64 {
    ((1.0 - distance).clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}
