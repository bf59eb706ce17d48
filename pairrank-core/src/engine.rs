/// Ranking engine orchestrator.
///
/// candidates + query -> scheduler -> win matrix -> Bradley-Terry -> top K.
/// Every call is independent; nothing is carried over between runs.
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::bradley_terry::{fit_scores, SolverOptions};
use crate::comparator::{ComparatorClient, Judge};
use crate::constants::DEFAULT_TOP_K;
use crate::error::RankError;
use crate::scheduler::{ComparisonScheduler, SchedulerConfig, TournamentOutcome};
use crate::selector::select_top_k;
use crate::types::{validate_candidates, Candidate, RankedCandidate, RankedResult};
use crate::win_matrix::WinMatrix;

/// Configuration for a ranking run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankingConfig {
    /// Maximum judge calls in flight. Required: the judge is paid and rate limited.
    pub concurrency_limit: NonZeroUsize,
    /// How many candidates to return.
    pub top_k: usize,
    pub solver: SolverOptions,
    /// Fail the whole run if it takes longer than this.
    pub timeout: Option<Duration>,
}

impl RankingConfig {
    pub fn new(concurrency_limit: usize) -> Result<Self, RankError> {
        let concurrency_limit = NonZeroUsize::new(concurrency_limit).ok_or_else(|| {
            RankError::InvalidConfig("concurrency limit must be at least 1".into())
        })?;
        Ok(RankingConfig {
            concurrency_limit,
            top_k: DEFAULT_TOP_K,
            solver: SolverOptions::default(),
            timeout: None,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    pub fn validate(&self) -> Result<(), RankError> {
        if self.top_k == 0 {
            return Err(RankError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.solver.tolerance.is_some_and(|t| t.is_nan() || t <= 0.0) {
            return Err(RankError::InvalidConfig("solver tolerance must be positive".into()));
        }
        Ok(())
    }

    fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.concurrency_limit)
    }
}

pub struct RankingEngine<J> {
    scheduler: ComparisonScheduler<J>,
    config: RankingConfig,
}

impl<J: Judge + 'static> RankingEngine<J> {
    pub fn new(comparator: ComparatorClient<J>, config: RankingConfig) -> Result<Self, RankError> {
        config.validate()?;
        let scheduler = ComparisonScheduler::new(Arc::new(comparator), config.scheduler_config());
        Ok(RankingEngine { scheduler, config })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn comparator(&self) -> &ComparatorClient<J> {
        self.scheduler.comparator()
    }

    /// Rank `candidates` by relevance to `query`.
    pub async fn rank(&self, candidates: &[Candidate], query: &str) -> Result<RankedResult, RankError> {
        self.rank_with_cancel(candidates, query, std::future::pending()).await
    }

    /// Rank, giving up with [`RankError::Cancelled`] once `cancel` resolves.
    pub async fn rank_with_cancel<F>(
        &self,
        candidates: &[Candidate],
        query: &str,
        cancel: F,
    ) -> Result<RankedResult, RankError>
    where
        F: Future<Output = ()>,
    {
        validate_candidates(candidates)?;

        let run = self.scheduler.run_with_cancel(candidates, query, cancel);
        let outcome = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(outcome) => outcome?,
                Err(_) => return Err(RankError::TimedOut(limit)),
            },
            None => run.await?,
        };

        match outcome {
            TournamentOutcome::Skipped => Ok(RankedResult {
                entries: unranked(candidates),
                total_candidates: candidates.len(),
                comparisons: 0,
                fallbacks: 0,
                tournament: false,
            }),
            TournamentOutcome::Completed { matrix, fallbacks } => {
                let entries = rank_from_matrix(candidates, &matrix, &self.config)?;
                info!(
                    candidates = candidates.len(),
                    selected = entries.len(),
                    fallbacks,
                    "ranking complete"
                );
                Ok(RankedResult {
                    entries,
                    total_candidates: candidates.len(),
                    comparisons: matrix.total() as usize,
                    fallbacks,
                    tournament: true,
                })
            }
        }
    }
}

/// Fit `matrix` and select the top K. Reproducible for a fixed matrix.
pub fn rank_from_matrix(
    candidates: &[Candidate],
    matrix: &WinMatrix,
    config: &RankingConfig,
) -> Result<Vec<RankedCandidate>, RankError> {
    validate_candidates(candidates)?;
    if matrix.size() != candidates.len() {
        return Err(RankError::LengthMismatch {
            candidates: candidates.len(),
            scores: matrix.size(),
        });
    }

    let scores = fit_scores(matrix, &config.solver)?;
    select_top_k(candidates, &scores, config.top_k)
}

/// Every candidate, in input order, without scores.
fn unranked(candidates: &[Candidate]) -> Vec<RankedCandidate> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| RankedCandidate {
            rank: i + 1,
            candidate: c.clone(),
            score: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NORMALIZATION_TOLERANCE;
    use crate::error::JudgeError;
    use crate::types::Winner;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Judges by a hidden relevance number stored in the summary.
    #[derive(Default)]
    struct OracleJudge {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Judge for OracleJudge {
        async fn judge(&self, a: &Candidate, b: &Candidate, _query: &str) -> Result<Winner, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let relevance = |c: &Candidate| c.summary.parse::<u32>().unwrap_or(0);
            Ok(if relevance(a) >= relevance(b) { Winner::A } else { Winner::B })
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Judge for AlwaysFails {
        async fn judge(&self, _a: &Candidate, _b: &Candidate, _query: &str) -> Result<Winner, JudgeError> {
            Err(JudgeError::Unparseable("no idea".into()))
        }
    }

    struct Slow;

    #[async_trait]
    impl Judge for Slow {
        async fn judge(&self, _a: &Candidate, _b: &Candidate, _query: &str) -> Result<Winner, JudgeError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Winner::A)
        }
    }

    /// Sleeps, then counts the calls that got to answer.
    #[derive(Default)]
    struct SlowCounting {
        finished: AtomicUsize,
    }

    #[async_trait]
    impl Judge for SlowCounting {
        async fn judge(&self, _a: &Candidate, _b: &Candidate, _query: &str) -> Result<Winner, JudgeError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Winner::A)
        }
    }

    fn with_relevance(values: &[u32]) -> Vec<Candidate> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Candidate::new(format!("p{i}"), format!("Paper {i}"), v.to_string()))
            .collect()
    }

    fn engine<J: Judge + 'static>(judge: J) -> RankingEngine<J> {
        RankingEngine::new(ComparatorClient::with_seed(judge, 5), RankingConfig::new(4).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_rank_picks_most_relevant() {
        let e = engine(OracleJudge::default());
        let cands = with_relevance(&[3, 9, 1, 7, 5, 2]);
        let result = e.rank(&cands, "which is relevant?").await.unwrap();

        assert!(result.tournament);
        assert_eq!(result.comparisons, 15);
        assert_eq!(result.fallbacks, 0);
        assert_eq!(result.total_candidates, 6);
        assert_eq!(e.comparator().judge_ref().calls.load(Ordering::SeqCst), 15);

        let ids: Vec<&str> = result.entries.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3", "p4"]);
        let ranks: Vec<usize> = result.entries.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_small_input_returns_everything_unscored() {
        let e = engine(OracleJudge::default());
        let cands = with_relevance(&[1, 2, 3]);
        let result = e.rank(&cands, "q").await.unwrap();

        assert!(!result.tournament);
        assert_eq!(result.comparisons, 0);
        assert_eq!(result.entries.len(), 3);
        assert!(result.entries.iter().all(|r| r.score.is_none()));
        assert_eq!(e.comparator().judge_ref().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_circuit_does_not_follow_top_k() {
        let config = RankingConfig::new(2).unwrap().with_top_k(1);
        let e = RankingEngine::new(ComparatorClient::with_seed(OracleJudge::default(), 3), config).unwrap();
        let result = e.rank(&with_relevance(&[1, 2, 3]), "q").await.unwrap();
        assert!(!result.tournament);
        assert_eq!(result.entries.len(), 3);
        assert!(result.entries.iter().all(|r| r.score.is_none()));
        assert_eq!(e.comparator().judge_ref().calls.load(Ordering::SeqCst), 0);

        let config = RankingConfig::new(2).unwrap().with_top_k(5);
        let e = RankingEngine::new(ComparatorClient::with_seed(OracleJudge::default(), 3), config).unwrap();
        let result = e.rank(&with_relevance(&[4, 1, 3, 2]), "q").await.unwrap();
        assert!(result.tournament);
        assert_eq!(result.comparisons, 6);
        assert_eq!(e.comparator().judge_ref().calls.load(Ordering::SeqCst), 6);
        assert_eq!(result.entries.len(), 4);
        assert!(result.entries.iter().all(|r| r.score.is_some()));
        let ids: Vec<&str> = result.entries.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p2", "p3", "p1"]);
    }

    #[tokio::test]
    async fn test_no_candidates_fails_fast() {
        let e = engine(OracleJudge::default());
        assert!(matches!(e.rank(&[], "q").await, Err(RankError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let e = engine(OracleJudge::default());
        let mut cands = with_relevance(&[1, 2, 3, 4]);
        cands[3].id = "p0".into();
        assert!(matches!(
            e.rank(&cands, "q").await,
            Err(RankError::DuplicateCandidate(id)) if id == "p0"
        ));
    }

    #[tokio::test]
    async fn test_failing_judge_still_produces_valid_scores() {
        let e = engine(AlwaysFails);
        let result = e.rank(&with_relevance(&[1, 2, 3, 4, 5, 6, 7]), "q").await.unwrap();
        assert_eq!(result.comparisons, 21);
        assert_eq!(result.fallbacks, 21);
        assert_eq!(result.entries.len(), 3);
        for r in &result.entries {
            let s = r.score.unwrap();
            assert!(s.is_finite() && s >= 0.0);
        }
    }

    #[tokio::test]
    async fn test_timeout_fails_the_run() {
        let config = RankingConfig::new(2)
            .unwrap()
            .with_timeout(Duration::from_millis(20));
        let e = RankingEngine::new(ComparatorClient::with_seed(Slow, 1), config).unwrap();
        let result = e.rank(&with_relevance(&[1, 2, 3, 4]), "q").await;
        assert!(matches!(result, Err(RankError::TimedOut(d)) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_timeout_stops_in_flight_calls() {
        let config = RankingConfig::new(4)
            .unwrap()
            .with_timeout(Duration::from_millis(10));
        let e = RankingEngine::new(ComparatorClient::with_seed(SlowCounting::default(), 1), config).unwrap();
        let result = e.rank(&with_relevance(&[1, 2, 3, 4, 5]), "q").await;
        assert!(matches!(result, Err(RankError::TimedOut(_))));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(e.comparator().judge_ref().finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_stops_in_flight_calls() {
        let e = engine(SlowCounting::default());
        let cancel = tokio::time::sleep(Duration::from_millis(10));
        let result = e.rank_with_cancel(&with_relevance(&[1, 2, 3, 4, 5]), "q", cancel).await;
        assert!(matches!(result, Err(RankError::Cancelled)));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(e.comparator().judge_ref().finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_fails_the_run() {
        let e = engine(Slow);
        let cancel = tokio::time::sleep(Duration::from_millis(20));
        let result = e.rank_with_cancel(&with_relevance(&[1, 2, 3, 4]), "q", cancel).await;
        assert!(matches!(result, Err(RankError::Cancelled)));
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(RankingConfig::new(0), Err(RankError::InvalidConfig(_))));
        let zero_k = RankingConfig::new(1).unwrap().with_top_k(0);
        assert!(matches!(zero_k.validate(), Err(RankError::InvalidConfig(_))));
        let bad_tol = RankingConfig::new(1).unwrap().with_solver(SolverOptions {
            iterations: 10,
            tolerance: Some(0.0),
        });
        assert!(bad_tol.validate().is_err());
    }

    #[test]
    fn test_rank_from_matrix_concrete_scenario() {
        // A beats B, C, D; B beats C; C beats D; D beats B.
        let cands = vec![
            Candidate::new("A", "A", ""),
            Candidate::new("B", "B", ""),
            Candidate::new("C", "C", ""),
            Candidate::new("D", "D", ""),
        ];
        let matrix = WinMatrix::from_rows(&[
            vec![0, 1, 1, 1],
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
            vec![0, 1, 0, 0],
        ]).unwrap();
        let config = RankingConfig::new(1).unwrap().with_top_k(4);

        let first = rank_from_matrix(&cands, &matrix, &config).unwrap();
        let second = rank_from_matrix(&cands, &matrix, &config).unwrap();
        assert_eq!(first, second);

        let ids: Vec<&str> = first.iter().map(|r| r.candidate.id.as_str()).collect();
        // B, C and D tie exactly; ties resolve by input position.
        assert_eq!(ids, vec!["A", "B", "C", "D"]);

        let total: f64 = first.iter().filter_map(|r| r.score).sum();
        assert!((total - 1.0).abs() < NORMALIZATION_TOLERANCE);
    }

    #[test]
    fn test_rank_from_matrix_size_mismatch() {
        let cands = with_relevance(&[1, 2]);
        let config = RankingConfig::new(1).unwrap();
        let err = rank_from_matrix(&cands, &WinMatrix::new(3), &config).unwrap_err();
        assert!(matches!(err, RankError::LengthMismatch { .. }));
    }
}
