use crate::ml::Embedding;
use crate::models::{Alternative, BookRecord};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::cmp::Ordering;
use tracing::warn;

pub const STRONG_MATCH_THRESHOLD: f32 = 0.7;
pub const PARTIAL_MATCH_THRESHOLD: f32 = 0.4;

/// Cosine similarity of two unit vectors, clamped to `[0, 1]`.
///
/// Opposing vectors score 0 rather than negative. Mismatched dimensions also
/// score 0 and are logged.
pub fn similarity(a: &Embedding, b: &Embedding) -> f32 {
    match a.dot(b) {
        Some(cosine) if cosine.is_finite() => cosine.clamp(0.0, 1.0),
        Some(_) => 0.0,
        None => {
            warn!(
                "Comparing embeddings of different dimensions ({} vs {})",
                a.dim(),
                b.dim()
            );
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    StrongMatch,
    PartialMatch,
    NotAMatch,
}

impl Verdict {
    /// Boundary scores belong to the higher bucket.
    pub fn from_score(score: f32) -> Self {
        if score >= STRONG_MATCH_THRESHOLD {
            Verdict::StrongMatch
        } else if score >= PARTIAL_MATCH_THRESHOLD {
            Verdict::PartialMatch
        } else {
            Verdict::NotAMatch
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::StrongMatch => "Strong match",
            Verdict::PartialMatch => "Partial match",
            Verdict::NotAMatch => "Not a match",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Verdict::StrongMatch => "✅",
            Verdict::PartialMatch => "🤔",
            Verdict::NotAMatch => "❌",
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Verdict", 2)?;
        state.serialize_field("label", self.label())?;
        state.serialize_field("symbol", self.symbol())?;
        state.end()
    }
}

/// `(label, symbol)` for a score.
pub fn verdict(score: f32) -> (&'static str, &'static str) {
    let verdict = Verdict::from_score(score);
    (verdict.label(), verdict.symbol())
}

/// Scores every candidate carrying an embedding against `target` and returns
/// the best `top_k`, highest first. Candidates without an embedding are
/// skipped; equal scores keep their input order.
pub fn rank_similar(
    target: &Embedding,
    candidates: &[BookRecord],
    top_k: usize,
) -> Vec<Alternative> {
    let mut scored: Vec<Alternative> = candidates
        .iter()
        .filter_map(|book| {
            book.embedding.as_ref().map(|embedding| Alternative {
                book: book.clone(),
                score: similarity(target, embedding),
            })
        })
        .collect();

    // stable sort
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
