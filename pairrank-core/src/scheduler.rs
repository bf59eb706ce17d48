/// Comparison scheduler: every pair judged once, under a concurrency cap.
///
/// One task per pair is spawned into a `JoinSet`. Each task holds a semaphore
/// permit while it talks to the judge, so at most `concurrency_limit` judge
/// calls are ever in flight. Results flow back to a single aggregator loop,
/// which is the only writer of the win matrix.
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::comparator::{ComparatorClient, Judge};
use crate::constants::SHORT_CIRCUIT_THRESHOLD;
use crate::error::RankError;
use crate::pairing::{all_pairs, pair_count};
use crate::types::Candidate;
use crate::win_matrix::WinMatrix;

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum judge calls in flight at once.
    pub concurrency_limit: NonZeroUsize,
    /// With this many candidates or fewer, no tournament is run.
    pub short_circuit_threshold: usize,
}

impl SchedulerConfig {
    pub fn new(concurrency_limit: NonZeroUsize) -> Self {
        SchedulerConfig {
            concurrency_limit,
            short_circuit_threshold: SHORT_CIRCUIT_THRESHOLD,
        }
    }
}

/// What a scheduler run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TournamentOutcome {
    /// Too few candidates to compare; nothing was judged.
    Skipped,
    /// Every pair was judged exactly once.
    Completed {
        matrix: WinMatrix,
        /// Pairs resolved by coin flip after a judge failure.
        fallbacks: usize,
    },
}

pub struct ComparisonScheduler<J> {
    comparator: Arc<ComparatorClient<J>>,
    config: SchedulerConfig,
}

impl<J: Judge + 'static> ComparisonScheduler<J> {
    pub fn new(comparator: Arc<ComparatorClient<J>>, config: SchedulerConfig) -> Self {
        ComparisonScheduler { comparator, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn comparator(&self) -> &ComparatorClient<J> {
        &self.comparator
    }

    /// Judge every pair of `candidates` against `query`.
    pub async fn run(&self, candidates: &[Candidate], query: &str) -> Result<TournamentOutcome, RankError> {
        self.run_with_cancel(candidates, query, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but gives up as soon as `cancel` resolves.
    ///
    /// On cancellation every in-flight comparison is aborted and no matrix is
    /// returned: a matrix with holes would silently skew the fit.
    pub async fn run_with_cancel<F>(
        &self,
        candidates: &[Candidate],
        query: &str,
        cancel: F,
    ) -> Result<TournamentOutcome, RankError>
    where
        F: Future<Output = ()>,
    {
        let num_items = candidates.len();
        if num_items == 0 {
            return Err(RankError::NoCandidates);
        }
        if num_items <= self.config.short_circuit_threshold {
            debug!(num_items, "too few candidates for a tournament, skipping comparisons");
            return Ok(TournamentOutcome::Skipped);
        }

        let total = pair_count(num_items);
        let limit = self.config.concurrency_limit.get();
        debug!(num_items, total, limit, "dispatching pairwise comparisons");

        let shared: Arc<[Candidate]> = Arc::from(candidates);
        let query: Arc<str> = Arc::from(query);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();

        for (i, j) in all_pairs(num_items) {
            let sem = semaphore.clone();
            let comparator = self.comparator.clone();
            let candidates = shared.clone();
            let query = query.clone();

            tasks.spawn(async move {
                // Only fails if the semaphore was closed, which happens on cancel.
                let _permit = sem.acquire_owned().await.map_err(|_| RankError::Cancelled)?;
                let verdict = comparator
                    .judge_pair(&candidates[i], &candidates[j], &query)
                    .await;
                Ok::<_, RankError>((i, j, verdict))
            });
        }

        let mut matrix = WinMatrix::new(num_items);
        let mut fallbacks = 0usize;
        let mut completed = 0usize;

        tokio::pin!(cancel);
        loop {
            tokio::select! {
                biased;

                () = &mut cancel => {
                    semaphore.close();
                    tasks.abort_all();
                    warn!(completed, total, "ranking run cancelled, aborting in-flight comparisons");
                    return Err(RankError::Cancelled);
                }

                joined = tasks.join_next() => match joined {
                    Some(Ok(Ok((i, j, verdict)))) => {
                        matrix.record(i, j, verdict.winner);
                        if verdict.fallback {
                            fallbacks += 1;
                        }
                        completed += 1;
                        debug!(i, j, winner = ?verdict.winner, completed, total, "comparison complete");
                    }
                    Some(Ok(Err(err))) => {
                        tasks.abort_all();
                        return Err(err);
                    }
                    Some(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    Some(Err(_)) => {
                        tasks.abort_all();
                        return Err(RankError::Cancelled);
                    }
                    None => break,
                },
            }
        }

        debug_assert!(matrix.is_complete(), "every pair must be resolved exactly once");
        info!(num_items, comparisons = completed, fallbacks, "tournament complete");

        Ok(TournamentOutcome::Completed { matrix, fallbacks })
    }
}
