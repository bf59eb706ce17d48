use std::collections::HashSet;

use crate::error::RankError;

/// A document competing in a ranking run.
///
/// The judge only sees `title` and `summary`. The remaining fields ride along
/// untouched so whoever consumes the ranking gets the full record back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// Caller-provided identifier. Must be unique within a run.
    pub id: String,
    pub title: String,
    /// Abstract or summary text shown to the judge.
    pub summary: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub authors: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub published: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub url: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Candidate {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            authors: Vec::new(),
            published: None,
            url: None,
        }
    }
}

/// Outcome of a single pairwise judgement. `A` is the first candidate passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Winner {
    A,
    B,
}

/// A judgement as seen by the scheduler: who won, and whether the winner was
/// picked by coin flip because the judge failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub winner: Winner,
    pub fallback: bool,
}

/// A candidate in the final ordering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedCandidate {
    /// 1-based position.
    pub rank: usize,
    pub candidate: Candidate,
    /// Normalized Bradley-Terry strength. `None` when no tournament ran.
    pub score: Option<f64>,
}

/// Result of a ranking run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedResult {
    /// Ranked candidates, strongest first.
    pub entries: Vec<RankedCandidate>,
    pub total_candidates: usize,
    /// Number of pairwise comparisons performed.
    pub comparisons: usize,
    /// Comparisons resolved by coin flip after a judge failure.
    pub fallbacks: usize,
    /// False when the candidate list was too small to bother comparing.
    pub tournament: bool,
}

/// Internal indexed pair (`i < j`).
pub type Pair = (usize, usize);

/// Reject empty input and duplicate ids before any work is scheduled.
pub(crate) fn validate_candidates(candidates: &[Candidate]) -> Result<(), RankError> {
    if candidates.is_empty() {
        return Err(RankError::NoCandidates);
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if !seen.insert(c.id.as_str()) {
            return Err(RankError::DuplicateCandidate(c.id.clone()));
        }
    }
    Ok(())
}
