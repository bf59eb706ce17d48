/// Dense win-count matrix for a single ranking run.
use crate::error::RankError;
use crate::pairing::all_pairs;
use crate::types::Winner;

/// `wins[i][j]` = number of times candidate `i` was judged more relevant than `j`.
///
/// Stored row-major in a flat vector. The diagonal is never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinMatrix {
    size: usize,
    wins: Vec<u32>,
}

impl WinMatrix {
    /// Zero-filled `size`×`size` matrix.
    pub fn new(size: usize) -> Self {
        WinMatrix {
            size,
            wins: vec![0; size * size],
        }
    }

    /// Build from explicit rows. The rows must be square with a zero diagonal.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, RankError> {
        let size = rows.len();
        let mut matrix = WinMatrix::new(size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(RankError::InvalidConfig(format!(
                    "win matrix row {i} has {} columns, expected {size}",
                    row.len()
                )));
            }
            if row[i] != 0 {
                return Err(RankError::InvalidConfig(format!(
                    "win matrix diagonal entry ({i}, {i}) must be zero"
                )));
            }
            matrix.wins[i * size..(i + 1) * size].copy_from_slice(row);
        }
        Ok(matrix)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Times `i` beat `j`.
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.wins[i * self.size + j]
    }

    /// Count one win for `winner` over `loser`.
    pub fn add_win(&mut self, winner: usize, loser: usize) {
        assert!(winner != loser, "candidate {winner} cannot beat itself");
        self.wins[winner * self.size + loser] += 1;
    }

    /// Record the outcome of comparing pair `(i, j)`, where `A` is `i`.
    pub fn record(&mut self, i: usize, j: usize, winner: Winner) {
        match winner {
            Winner::A => self.add_win(i, j),
            Winner::B => self.add_win(j, i),
        }
    }

    /// Total outcomes recorded between `i` and `j` in either direction.
    pub fn resolved(&self, i: usize, j: usize) -> u32 {
        self.get(i, j) + self.get(j, i)
    }

    /// Total wins of candidate `i` across all opponents.
    pub fn wins(&self, i: usize) -> u32 {
        self.row(i).iter().sum()
    }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.wins[i * self.size..(i + 1) * self.size]
    }

    /// Total outcomes recorded in the whole matrix.
    pub fn total(&self) -> u32 {
        self.wins.iter().sum()
    }

    /// True when every unordered pair has exactly one recorded outcome.
    pub fn is_complete(&self) -> bool {
        all_pairs(self.size)
            .into_iter()
            .all(|(i, j)| self.resolved(i, j) == 1)
    }
}
