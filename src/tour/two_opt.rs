//! Default tour-search engine: nearest-neighbor construction followed by 2-opt.

use super::{TourOutcome, TourSearch};
use crate::deadline::Deadline;

/// Nearest-neighbor tour improved by first-improvement 2-opt.
#[derive(Debug, Clone, Default)]
pub struct TwoOptTourSearch {
    /// Moves applied during the last search.
    pub moves: usize,
}

impl TwoOptTourSearch {
    pub fn new() -> Self {
        TwoOptTourSearch::default()
    }

    fn nearest_neighbor(weights: &[Vec<f64>]) -> Vec<usize> {
        let n = weights.len();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut current = 0;
        visited[0] = true;
        order.push(0);

        while order.len() < n {
            let next = (0..n)
                .filter(|&c| !visited[c])
                .min_by(|&a, &b| weights[current][a].total_cmp(&weights[current][b]));
            let Some(next) = next else { break };
            visited[next] = true;
            order.push(next);
            current = next;
        }
        order
    }

    /// Gain of reversing `order[i + 1..=j]`; negative values improve.
    fn evaluate_two_opt(weights: &[Vec<f64>], order: &[usize], i: usize, j: usize) -> f64 {
        let n = order.len();
        let (a, b) = (order[i], order[i + 1]);
        let (c, d) = (order[j], order[(j + 1) % n]);
        weights[a][c] + weights[b][d] - weights[a][b] - weights[c][d]
    }

    /// One first-improvement sweep. Returns `None` if the deadline hit.
    fn improve_once(
        &mut self,
        weights: &[Vec<f64>],
        order: &mut [usize],
        deadline: Deadline,
    ) -> Option<bool> {
        let n = order.len();
        for i in 0..n - 1 {
            if deadline.expired() {
                return None;
            }
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if Self::evaluate_two_opt(weights, order, i, j) < -1e-9 {
                    order[i + 1..=j].reverse();
                    self.moves += 1;
                    return Some(true);
                }
            }
        }
        Some(false)
    }
}

impl TourSearch for TwoOptTourSearch {
    fn search(&mut self, weights: &[Vec<f64>], deadline: Deadline) -> TourOutcome {
        self.moves = 0;
        let n = weights.len();
        if n <= 3 {
            return TourOutcome::Found {
                order: (0..n).collect(),
                optimal: true,
            };
        }
        if deadline.expired() {
            return TourOutcome::TimedOut;
        }

        let mut order = Self::nearest_neighbor(weights);
        loop {
            match self.improve_once(weights, &mut order, deadline) {
                Some(true) => continue,
                Some(false) | None => break,
            }
        }
        log::debug!("2-opt tour search applied {} moves", self.moves);

        TourOutcome::Found {
            order,
            optimal: false,
        }
    }
}
