/// Iterative Bradley-Terry fit over a dense win matrix.
///
/// Classical Zermelo/Newman majorization-minimization update, applied to all
/// candidates simultaneously, for a fixed number of sweeps. Scores are
/// normalized to sum to one at the end.
use crate::constants::{BRADLEY_TERRY_ITERATIONS, INITIAL_BRADLEY_TERRY_RATING};
use crate::error::RankError;
use crate::win_matrix::WinMatrix;

/// Options for a Bradley-Terry fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverOptions {
    /// Number of MM sweeps.
    pub iterations: usize,
    /// Stop early once no normalized score moves by more than this. `None` = always run
    /// every iteration.
    pub tolerance: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            iterations: BRADLEY_TERRY_ITERATIONS,
            tolerance: None,
        }
    }
}

pub struct BradleyTerry<'a> {
    matrix: &'a WinMatrix,
    /// Total wins per candidate (precomputed, constant across sweeps).
    total_wins: Vec<f64>,
    /// Current unnormalized strengths.
    scores: Vec<f64>,
    iterations_run: usize,
}

impl<'a> BradleyTerry<'a> {
    pub fn new(matrix: &'a WinMatrix) -> Self {
        let n = matrix.size();
        let total_wins = (0..n).map(|i| f64::from(matrix.wins(i))).collect();

        BradleyTerry {
            matrix,
            total_wins,
            scores: vec![INITIAL_BRADLEY_TERRY_RATING; n],
            iterations_run: 0,
        }
    }

    fn run_iteration(&mut self) {
        let n = self.matrix.size();
        let mut new_scores = vec![0.0; n];

        for i in 0..n {
            let score_i = self.scores[i];
            let mut denominator = 0.0;

            for j in 0..n {
                if j == i {
                    continue;
                }
                let games = f64::from(self.matrix.resolved(i, j));
                let pair_strength = score_i + self.scores[j];
                if games > 0.0 && pair_strength > 0.0 {
                    denominator += games / pair_strength;
                }
            }

            // Zero denominator: nothing to learn this sweep, keep the old score.
            new_scores[i] = if denominator > 0.0 {
                self.total_wins[i] / denominator
            } else {
                score_i
            };
        }

        self.scores = new_scores;
    }

    /// Run up to `options.iterations` sweeps.
    pub fn calculate_scores(&mut self, options: &SolverOptions) {
        let mut previous = self.normalized();

        for _ in 0..options.iterations {
            self.run_iteration();
            self.iterations_run += 1;

            if let Some(tolerance) = options.tolerance {
                let current = self.normalized();
                let max_change = current
                    .iter()
                    .zip(previous.iter())
                    .map(|(new, old)| (new - old).abs())
                    .fold(0.0_f64, f64::max);
                if max_change < tolerance {
                    break;
                }
                previous = current;
            }
        }
    }

    /// Scores divided by their sum.
    pub fn normalized(&self) -> Vec<f64> {
        let total: f64 = self.scores.iter().sum();
        if total > 0.0 {
            self.scores.iter().map(|s| s / total).collect()
        } else {
            self.scores.clone()
        }
    }

    /// Raw strengths before normalization.
    pub fn raw_scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }
}

/// Fit a win matrix and return the normalized score vector.
pub fn fit_scores(matrix: &WinMatrix, options: &SolverOptions) -> Result<Vec<f64>, RankError> {
    if matrix.size() == 0 {
        return Err(RankError::NoCandidates);
    }

    let mut bt = BradleyTerry::new(matrix);
    bt.calculate_scores(options);
    Ok(bt.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NORMALIZATION_TOLERANCE;

    fn assert_normalized(scores: &[f64]) {
        assert!(scores.iter().all(|&s| s >= 0.0), "negative score in {scores:?}");
        let sum: f64 = scores.iter().sum();
        assert!((sum - 1.0).abs() < NORMALIZATION_TOLERANCE, "scores sum to {sum}");
    }

    #[test]
    fn test_dominant_candidate_ranks_first() {
        // 0 beats everyone; 1 -> 2 -> 3 -> 1 is a cycle.
        let m = WinMatrix::from_rows(&[
            vec![0, 1, 1, 1],
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
            vec![0, 1, 0, 0],
        ]).unwrap();
        let scores = fit_scores(&m, &SolverOptions::default()).unwrap();
        assert_normalized(&scores);
        for j in 1..4 {
            assert!(scores[0] > scores[j], "score[0] = {} not above score[{j}] = {}", scores[0], scores[j]);
        }
    }

    #[test]
    fn test_strict_order_is_preserved() {
        // Transitive tournament 0 > 1 > 2 > 3 > 4.
        let n = 5;
        let rows: Vec<Vec<u32>> = (0..n)
            .map(|i| (0..n).map(|j| u32::from(j > i)).collect())
            .collect();
        let scores = fit_scores(&WinMatrix::from_rows(&rows).unwrap(), &SolverOptions::default()).unwrap();
        assert_normalized(&scores);
        for i in 0..n - 1 {
            assert!(scores[i] >= scores[i + 1], "scores not descending: {scores:?}");
        }
        assert!(scores[0] > scores[1]);
        // The candidate that never wins is driven to zero.
        assert_eq!(scores[n - 1], 0.0);
    }

    #[test]
    fn test_symmetric_matrix_gives_equal_scores() {
        let n = 6;
        let rows: Vec<Vec<u32>> = (0..n)
            .map(|i| (0..n).map(|j| u32::from(i != j)).collect())
            .collect();
        let scores = fit_scores(&WinMatrix::from_rows(&rows).unwrap(), &SolverOptions::default()).unwrap();
        assert_normalized(&scores);
        let expected = 1.0 / n as f64;
        for s in &scores {
            assert!((s - expected).abs() < 0.05, "score {s} not near {expected}");
        }
    }

    #[test]
    fn test_all_zero_matrix_keeps_initial_scores() {
        let m = WinMatrix::new(4);
        let scores = fit_scores(&m, &SolverOptions::default()).unwrap();
        assert_normalized(&scores);
        for s in &scores {
            assert!((s - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_uncompared_candidate_keeps_its_score() {
        // Candidate 2 has no games at all: zero denominator every sweep.
        let m = WinMatrix::from_rows(&[vec![0, 1, 0], vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        let mut bt = BradleyTerry::new(&m);
        bt.calculate_scores(&SolverOptions::default());
        assert_eq!(bt.raw_scores()[2], INITIAL_BRADLEY_TERRY_RATING);
        assert_normalized(&bt.normalized());
    }

    #[test]
    fn test_concrete_four_candidate_scenario() {
        // A beats B, C, D; B beats C; C beats D; D beats B.
        let m = WinMatrix::from_rows(&[
            vec![0, 1, 1, 1],
            vec![0, 0, 1, 0],
            vec![0, 0, 0, 1],
            vec![0, 1, 0, 0],
        ]).unwrap();
        let scores = fit_scores(&m, &SolverOptions::default()).unwrap();
        assert!((scores[0] - 0.875).abs() < 1e-9, "A scored {}", scores[0]);
        for s in &scores[1..] {
            assert!((s - 0.125 / 3.0).abs() < 1e-9, "cycle member scored {s}");
        }

        let again = fit_scores(&m, &SolverOptions::default()).unwrap();
        assert_eq!(scores, again);
    }

    #[test]
    fn test_fixed_iteration_count() {
        let m = WinMatrix::from_rows(&[vec![0, 1], vec![0, 0]]).unwrap();
        let mut bt = BradleyTerry::new(&m);
        bt.calculate_scores(&SolverOptions::default());
        assert_eq!(bt.iterations_run(), BRADLEY_TERRY_ITERATIONS);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let n = 5;
        let rows: Vec<Vec<u32>> = (0..n)
            .map(|i| (0..n).map(|j| u32::from(i != j)).collect())
            .collect();
        let m = WinMatrix::from_rows(&rows).unwrap();
        let mut bt = BradleyTerry::new(&m);
        bt.calculate_scores(&SolverOptions {
            iterations: 100,
            tolerance: Some(1e-6),
        });
        // Already at the fixed point: the first sweep changes nothing.
        assert_eq!(bt.iterations_run(), 1);
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        let m = WinMatrix::new(0);
        assert!(matches!(
            fit_scores(&m, &SolverOptions::default()),
            Err(RankError::NoCandidates)
        ));
    }
}
