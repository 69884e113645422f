//! Candidate ranking.
//!
//! Every candidate gets a score from its pattern weight, its distance to an
//! anchoring keyword and its position on the receipt. Fields that compete for
//! the same text form a claim group; within a group candidates are taken
//! best-first and a candidate whose span was already claimed by another
//! field's winner is penalized out of contention. Exactly one winner per
//! field, or none.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::candidate::Candidate;
use crate::normalize::Span;
use crate::types::{ClaimGroup, Field, PositionBias};

/// Largest bonus for a value sitting right after its keyword.
pub const KEYWORD_BONUS: f32 = 0.20;
/// Keyword distance (in chars) at which the bonus reaches zero.
pub const KEYWORD_REACH: usize = 20;
/// Subtracted from a candidate whose span another field already won. Larger
/// than any attainable score, so a penalized candidate never wins.
pub const OVERLAP_PENALTY: f32 = 1.0;

/// A candidate with its final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f32,
    /// Lost because another field's winner already holds its span.
    pub overlapped: bool,
}

/// Outcome of ranking one run's candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub winners: BTreeMap<Field, ScoredCandidate>,
    pub losers: BTreeMap<Field, Vec<ScoredCandidate>>,
}

impl Ranking {
    pub fn winner(&self, field: Field) -> Option<&ScoredCandidate> {
        self.winners.get(&field)
    }

    pub fn losers(&self, field: Field) -> &[ScoredCandidate] {
        self.losers.get(&field).map_or(&[], Vec::as_slice)
    }
}

/// Score before any overlap penalty.
pub fn base_score(candidate: &Candidate, line_count: usize) -> f32 {
    let keyword = candidate.keyword_distance.map_or(0.0, |d| {
        KEYWORD_BONUS * (1.0 - d.min(KEYWORD_REACH) as f32 / KEYWORD_REACH as f32)
    });
    candidate.weight + keyword + position_bonus(candidate, line_count)
}

fn position_bonus(candidate: &Candidate, line_count: usize) -> f32 {
    let rel = if line_count > 1 {
        candidate.line.min(line_count - 1) as f32 / (line_count - 1) as f32
    } else {
        0.0
    };
    let weight = candidate.field.position_weight();
    match candidate.field.position_bias() {
        PositionBias::Top => weight * (1.0 - rel),
        PositionBias::Bottom => weight * rel,
        PositionBias::Neutral => 0.0,
    }
}

struct Entry {
    seq: usize,
    score: f32,
    candidate: Candidate,
}

/// Best first: score, then keyword-anchored, then more specific pattern,
/// then earlier in the text, then earlier extractor output.
fn precedence(a: &Entry, b: &Entry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| {
            b.candidate
                .pattern
                .is_keyword_anchored()
                .cmp(&a.candidate.pattern.is_keyword_anchored())
        })
        .then_with(|| b.candidate.pattern.specificity().cmp(&a.candidate.pattern.specificity()))
        .then_with(|| a.candidate.span.start.cmp(&b.candidate.span.start))
        .then_with(|| a.seq.cmp(&b.seq))
        .then_with(|| a.candidate.field.ranking_cmp(b.candidate.field))
}

/// Rank `candidates`, given in extractor output order, over a text of
/// `line_count` kept lines.
pub fn rank(candidates: Vec<Candidate>, line_count: usize) -> Ranking {
    let mut groups: BTreeMap<ClaimGroup, Vec<Entry>> = BTreeMap::new();
    for (seq, candidate) in candidates.into_iter().enumerate() {
        let score = base_score(&candidate, line_count);
        groups
            .entry(candidate.field.claim_group())
            .or_default()
            .push(Entry { seq, score, candidate });
    }

    let mut ranking = Ranking::default();
    for (_, mut entries) in groups {
        entries.sort_by(precedence);
        let mut claimed: HashMap<Field, Span> = HashMap::new();
        for Entry { score, candidate, .. } in entries {
            let field = candidate.field;
            let overlapped = claimed
                .iter()
                .any(|(&owner, &span)| owner != field && span.overlaps(candidate.span));
            if !overlapped && !claimed.contains_key(&field) {
                claimed.insert(field, candidate.span);
                ranking.winners.insert(field, ScoredCandidate { candidate, score, overlapped: false });
                continue;
            }
            let score = if overlapped { score - OVERLAP_PENALTY } else { score };
            ranking
                .losers
                .entry(field)
                .or_default()
                .push(ScoredCandidate { candidate, score, overlapped });
        }
    }
    ranking
}
