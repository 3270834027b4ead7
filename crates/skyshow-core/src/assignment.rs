//! Exact minimum-cost bipartite matching.
//!
//! Shortest augmenting path with dual potentials (the Jonker-Volgenant
//! formulation of the Hungarian method). Runs in O(n² · m) for an n × m
//! matrix with n ≤ m, which is O(n³) for square inputs.
//!
//! Rectangular inputs are oriented so that rows ≤ columns before solving.
//! This is equivalent to padding the short side with zero-cost dummy rows:
//! every real row is matched, surplus columns stay free, and the matching
//! restricted to real rows/columns is unaffected.
//!
//! The search scans columns in input order and only replaces a candidate on a
//! strictly smaller reduced cost, so ties always resolve towards the lowest
//! row/column index and identical input yields an identical matching.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Matching produced by [`solve`]: `(row, column)` pairs sorted by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub pairs: Vec<(usize, usize)>,
    pub total_cost: f64,
}

impl Assignment {
    pub fn empty() -> Self {
        Self {
            pairs: Vec::new(),
            total_cost: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Solve the assignment problem for an R × C cost matrix given as rows.
///
/// Returns `min(R, C)` pairs with minimum total cost. Fails with
/// `InvalidCostMatrix` for ragged rows or costs that are negative, NaN or
/// infinite.
pub fn solve(costs: &[Vec<f64>]) -> Result<Assignment> {
    let (rows, cols) = validate(costs)?;
    if rows == 0 || cols == 0 {
        return Ok(Assignment::empty());
    }

    let mut pairs: Vec<(usize, usize)> = if rows <= cols {
        solve_wide(costs, rows, cols)
            .into_iter()
            .enumerate()
            .collect()
    } else {
        let transposed: Vec<Vec<f64>> = (0..cols)
            .map(|c| (0..rows).map(|r| costs[r][c]).collect())
            .collect();
        solve_wide(&transposed, cols, rows)
            .into_iter()
            .enumerate()
            .map(|(c, r)| (r, c))
            .collect()
    };
    pairs.sort_unstable();

    let total_cost = pairs.iter().map(|&(r, c)| costs[r][c]).sum();
    Ok(Assignment { pairs, total_cost })
}

fn validate(costs: &[Vec<f64>]) -> Result<(usize, usize)> {
    let rows = costs.len();
    let cols = costs.first().map(Vec::len).unwrap_or(0);

    for (r, row) in costs.iter().enumerate() {
        if row.len() != cols {
            return Err(EngineError::InvalidCostMatrix(format!(
                "row {} has {} columns, expected {}",
                r,
                row.len(),
                cols
            )));
        }
        for (c, &cost) in row.iter().enumerate() {
            if !cost.is_finite() || cost < 0.0 {
                return Err(EngineError::InvalidCostMatrix(format!(
                    "cell ({}, {}) has cost {}",
                    r, c, cost
                )));
            }
        }
    }

    Ok((rows, cols))
}

/// Core solver for `n <= m`. Returns the column matched to each row.
///
/// Indices are 1-based internally; index 0 is the virtual column the
/// augmenting path starts from.
fn solve_wide(costs: &[Vec<f64>], n: usize, m: usize) -> Vec<usize> {
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; m + 1];
    // p[j]: row currently matched to column j (0 = free)
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = costs[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            // n <= m guarantees a free column is always reachable.
            debug_assert!(j1 != 0, "no augmenting column found");
            if j1 == 0 {
                break;
            }

            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the virtual column.
        while j0 != 0 {
            let prev = way[j0];
            p[j0] = p[prev];
            j0 = prev;
        }
    }

    let mut row_to_col = vec![0usize; n];
    for j in 1..=m {
        if p[j] != 0 {
            row_to_col[p[j] - 1] = j - 1;
        }
    }
    row_to_col
}
