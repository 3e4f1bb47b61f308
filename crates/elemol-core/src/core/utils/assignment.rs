//! Minimum-cost bipartite matching (the assignment problem).
//!
//! The Hungarian solver drives atom-correspondence searches during
//! alignment; the bounded alternative-matching enumerator backs it up when
//! symmetric structures make the optimum degenerate.

use nalgebra::DMatrix;

/// Solves the square assignment problem by the Kuhn-Munkres (Hungarian)
/// algorithm with potentials, O(n^3).
///
/// Returns `perm` with `perm[row] = col` for the minimum-total-cost perfect
/// matching.
pub fn linear_sum_assignment(cost: &DMatrix<f64>) -> Vec<usize> {
    let n = cost.nrows();
    debug_assert_eq!(n, cost.ncols());
    if n == 0 {
        return Vec::new();
    }

    // 1-indexed potentials; p[j] is the row matched to column j, 0 = free.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=n {
                if !used[j] {
                    let cur = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }
            }
            for j in 0..=n {
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

        // Unwind the augmenting path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut perm = vec![0usize; n];
    for j in 1..=n {
        perm[p[j] - 1] = j - 1;
    }
    perm
}

/// Total cost of a row-to-column matching.
pub fn matching_cost(cost: &DMatrix<f64>, perm: &[usize]) -> f64 {
    perm.iter()
        .enumerate()
        .map(|(row, &col)| cost[(row, col)])
        .sum()
}

/// Enumerates perfect matchings whose total cost is within `cutoff` of the
/// optimum, up to `limit` of them, optimum first.
///
/// Degenerate point sets (symmetric rings, equivalent ligands) admit many
/// equal-cost correspondences and the Hungarian solver surfaces only one;
/// downstream refinement may need the others. Enumeration is bounded
/// backtracking with an admissible per-row lower bound, so the `limit`
/// guard matters only for pathologically symmetric inputs.
pub fn assignment_alternatives(
    cost: &DMatrix<f64>,
    cutoff: f64,
    limit: usize,
) -> Vec<Vec<usize>> {
    let n = cost.nrows();
    let best = linear_sum_assignment(cost);
    let budget = matching_cost(cost, &best) + cutoff;

    // Admissible remaining-cost bound: the sum of unconditional row minima.
    let row_min: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| cost[(i, j)])
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    let mut suffix_min = vec![0.0; n + 1];
    for i in (0..n).rev() {
        suffix_min[i] = suffix_min[i + 1] + row_min[i];
    }

    let mut found: Vec<Vec<usize>> = vec![best.clone()];
    let mut partial = vec![usize::MAX; n];
    let mut used_cols = vec![false; n];

    fn recurse(
        cost: &DMatrix<f64>,
        suffix_min: &[f64],
        budget: f64,
        best: &[usize],
        row: usize,
        acc: f64,
        partial: &mut Vec<usize>,
        used_cols: &mut Vec<bool>,
        found: &mut Vec<Vec<usize>>,
        limit: usize,
    ) {
        if found.len() >= limit {
            return;
        }
        let n = partial.len();
        if row == n {
            if partial != best {
                found.push(partial.clone());
            }
            return;
        }
        for col in 0..n {
            if used_cols[col] {
                continue;
            }
            let next = acc + cost[(row, col)];
            if next + suffix_min[row + 1] > budget + 1.0e-12 {
                continue;
            }
            partial[row] = col;
            used_cols[col] = true;
            recurse(
                cost, suffix_min, budget, best, row + 1, next, partial, used_cols, found, limit,
            );
            used_cols[col] = false;
            partial[row] = usize::MAX;
        }
    }

    recurse(
        cost,
        &suffix_min,
        budget,
        &best,
        0,
        0.0,
        &mut partial,
        &mut used_cols,
        &mut found,
        limit,
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_classic_cost_matrix() {
        let cost = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0]);
        let perm = linear_sum_assignment(&cost);
        assert_eq!(perm, vec![1, 0, 2]);
        assert!((matching_cost(&cost, &perm) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn identity_is_optimal_for_diagonal_dominance() {
        let cost = DMatrix::from_row_slice(3, 3, &[0.0, 9.0, 9.0, 9.0, 0.0, 9.0, 9.0, 9.0, 0.0]);
        assert_eq!(linear_sum_assignment(&cost), vec![0, 1, 2]);
    }

    #[test]
    fn empty_problem_yields_empty_matching() {
        let cost = DMatrix::<f64>::zeros(0, 0);
        assert!(linear_sum_assignment(&cost).is_empty());
    }

    #[test]
    fn degenerate_costs_enumerate_all_optima() {
        // Two equivalent columns: both matchings cost the same.
        let cost = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let all = assignment_alternatives(&cost, 1e-9, 16);
        assert_eq!(all.len(), 2);
        assert!(all.contains(&vec![0, 1]));
        assert!(all.contains(&vec![1, 0]));
    }

    #[test]
    fn enumeration_respects_the_limit() {
        let cost = DMatrix::from_element(4, 4, 1.0);
        let all = assignment_alternatives(&cost, 1e-9, 5);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn unique_optimum_enumerates_once() {
        let cost = DMatrix::from_row_slice(2, 2, &[0.0, 10.0, 10.0, 0.0]);
        let all = assignment_alternatives(&cost, 1e-6, 16);
        assert_eq!(all, vec![vec![0, 1]]);
    }
}
