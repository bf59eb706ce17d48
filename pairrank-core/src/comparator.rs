/// Pairwise comparator: one judge call per pair, never fails.
///
/// The external judge is fallible and slow. A failed call must not sink a whole
/// tournament, so [`ComparatorClient`] resolves any judge failure with an unbiased
/// coin flip drawn from an injectable random source.
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::warn;

use crate::error::JudgeError;
use crate::types::{Candidate, Verdict, Winner};

/// The external relevance-judging capability.
///
/// Given two candidates and a query, decide which candidate is more relevant.
/// `Winner::A` means `a`.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, a: &Candidate, b: &Candidate, query: &str) -> Result<Winner, JudgeError>;
}

#[async_trait]
impl<J: Judge + ?Sized> Judge for Arc<J> {
    async fn judge(&self, a: &Candidate, b: &Candidate, query: &str) -> Result<Winner, JudgeError> {
        (**self).judge(a, b, query).await
    }
}

#[async_trait]
impl<J: Judge + ?Sized> Judge for Box<J> {
    async fn judge(&self, a: &Candidate, b: &Candidate, query: &str) -> Result<Winner, JudgeError> {
        (**self).judge(a, b, query).await
    }
}

pub struct ComparatorClient<J> {
    judge: J,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl<J: Judge> ComparatorClient<J> {
    /// Comparator with an OS-seeded fallback source.
    pub fn new(judge: J) -> Self {
        Self::with_rng(judge, StdRng::from_os_rng())
    }

    /// Comparator whose coin flips replay deterministically from `seed`.
    pub fn with_seed(judge: J, seed: u64) -> Self {
        Self::with_rng(judge, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: RngCore + Send + 'static>(judge: J, rng: R) -> Self {
        ComparatorClient {
            judge,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    pub fn judge_ref(&self) -> &J {
        &self.judge
    }

    /// Which of `a` and `b` is more relevant to `query`.
    pub async fn compare(&self, a: &Candidate, b: &Candidate, query: &str) -> Winner {
        self.judge_pair(a, b, query).await.winner
    }

    /// Like [`compare`](Self::compare), but also reports whether the winner came
    /// from the fallback coin flip.
    pub async fn judge_pair(&self, a: &Candidate, b: &Candidate, query: &str) -> Verdict {
        let outcome = AssertUnwindSafe(self.judge.judge(a, b, query))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(winner)) => Verdict {
                winner,
                fallback: false,
            },
            Ok(Err(err)) => {
                let winner = self.coin_flip();
                warn!(a = %a.id, b = %b.id, error = %err, ?winner, "judge failed, winner picked at random");
                Verdict {
                    winner,
                    fallback: true,
                }
            }
            Err(_) => {
                let winner = self.coin_flip();
                warn!(a = %a.id, b = %b.id, ?winner, "judge panicked, winner picked at random");
                Verdict {
                    winner,
                    fallback: true,
                }
            }
        }
    }

    fn coin_flip(&self) -> Winner {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.random_bool(0.5) {
            Winner::A
        } else {
            Winner::B
        }
    }
}
