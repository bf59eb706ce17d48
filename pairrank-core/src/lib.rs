/// pairrank-core: Relevance ranking from pairwise judgements.
///
/// Candidates + query → every pair judged once → Bradley-Terry scores → top K.
/// No HTTP here: the judge is a trait. Bring your own LLM.
///
/// A failed judge call never aborts a run: the comparator flips a coin instead.
/// The only hard failures are "no candidates" and cancellation/timeout.
///
/// # Quick start
///
/// ```rust
/// use async_trait::async_trait;
/// use pairrank_core::{
///     Candidate, ComparatorClient, Judge, JudgeError, RankingConfig, RankingEngine, Winner,
/// };
///
/// struct ShorterTitleWins;
///
/// #[async_trait]
/// impl Judge for ShorterTitleWins {
///     async fn judge(&self, a: &Candidate, b: &Candidate, _query: &str) -> Result<Winner, JudgeError> {
///         Ok(if a.title.len() <= b.title.len() { Winner::A } else { Winner::B })
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), pairrank_core::RankError> {
/// let candidates = vec![
///     Candidate::new("1", "Short", "..."),
///     Candidate::new("2", "A much longer title", "..."),
///     Candidate::new("3", "Medium title", "..."),
///     Candidate::new("4", "Tiny", "..."),
/// ];
///
/// let engine = RankingEngine::new(
///     ComparatorClient::with_seed(ShorterTitleWins, 7),
///     RankingConfig::new(8)?,
/// )?;
/// let result = engine.rank(&candidates, "which title is shortest?").await?;
///
/// for r in &result.entries {
///     println!("#{} {}: {:.4}", r.rank, r.candidate.title, r.score.unwrap_or(0.0));
/// }
/// # Ok(())
/// # }
/// ```

pub mod bradley_terry;
pub mod comparator;
pub mod constants;
pub mod engine;
pub mod error;
pub mod pairing;
pub mod scheduler;
pub mod selector;
pub mod types;
pub mod win_matrix;

// Re-export primary public API at crate root.
pub use bradley_terry::{fit_scores, BradleyTerry, SolverOptions};
pub use comparator::{ComparatorClient, Judge};
pub use engine::{rank_from_matrix, RankingConfig, RankingEngine};
pub use error::{JudgeError, RankError};
pub use pairing::{all_pairs, pair_count};
pub use scheduler::{ComparisonScheduler, SchedulerConfig, TournamentOutcome};
pub use selector::{ranked_order, select_top_k};
pub use types::{Candidate, Pair, RankedCandidate, RankedResult, Verdict, Winner};
pub use win_matrix::WinMatrix;
