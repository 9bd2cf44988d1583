//! Fast non-dominated sorting and crowding distance.
//!
//! Both functions work on plain minimization vectors so they can be tested
//! and benchmarked independently of the population types.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II",
//!   IEEE Transactions on Evolutionary Computation, 6(2), 182-197

use std::cmp::Ordering;

/// Result of non-dominated sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedFronts {
    /// Pareto rank of each input point (0 = non-dominated).
    pub ranks: Vec<usize>,
    /// Input indices grouped by rank, each group in ascending index order.
    pub fronts: Vec<Vec<usize>>,
}

/// Pairwise dominance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    Left,
    Right,
    Neither,
}

/// Compares two minimization vectors.
pub fn dominance(a: &[f64], b: &[f64]) -> Dominance {
    let mut a_better = false;
    let mut b_better = false;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va < vb {
            a_better = true;
        } else if vb < va {
            b_better = true;
        }
        if a_better && b_better {
            return Dominance::Neither;
        }
    }
    match (a_better, b_better) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    }
}

/// Fast non-dominated sort (all objectives minimized).
///
/// For each point, counts how many points dominate it and records which
/// points it dominates. Points with count 0 form front 0; peeling a front
/// decrements the counts of everything it dominates, and points reaching 0
/// form the next front.
///
/// O(M·N²) for N points and M objectives.
///
/// ```
/// use u_nas::pareto::non_dominated_sort;
///
/// let points = vec![
///     [1.0, 5.0],
///     [3.0, 3.0],
///     [5.0, 1.0],
///     [4.0, 4.0], // dominated by [3, 3]
/// ];
/// let sorted = non_dominated_sort(&points);
/// assert_eq!(sorted.ranks, vec![0, 0, 0, 1]);
/// assert_eq!(sorted.fronts, vec![vec![0, 1, 2], vec![3]]);
/// ```
pub fn non_dominated_sort<P: AsRef<[f64]>>(points: &[P]) -> SortedFronts {
    let n = points.len();
    if n == 0 {
        return SortedFronts::default();
    }

    let mut dominated_by_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            match dominance(points[i].as_ref(), points[j].as_ref()) {
                Dominance::Left => {
                    dominates[i].push(j);
                    dominated_by_count[j] += 1;
                }
                Dominance::Right => {
                    dominates[j].push(i);
                    dominated_by_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }
    }

    let mut ranks = vec![0usize; n];
    let mut current: Vec<usize> = (0..n).filter(|&i| dominated_by_count[i] == 0).collect();
    let mut fronts = Vec::new();

    while !current.is_empty() {
        let rank = fronts.len();
        let mut next = Vec::new();
        for &i in &current {
            ranks[i] = rank;
            for &j in &dominates[i] {
                dominated_by_count[j] -= 1;
                if dominated_by_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }

    SortedFronts { ranks, fronts }
}

/// Crowding distance of each point within one front.
///
/// For every objective the front is sorted by that objective; the two
/// boundary points get `f64::INFINITY` and each interior point accumulates
/// `(next - prev) / (max - min)`. Objectives with zero range contribute
/// nothing. Fronts of one or two points are all boundary.
///
/// Sorting is stable over the input order, so equal values resolve the
/// same way on every run.
pub fn crowding_distance<P: AsRef<[f64]>>(points: &[P]) -> Vec<f64> {
    let n = points.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = points[0].as_ref().len();
    let mut distances = vec![0.0f64; n];

    for k in 0..m {
        let value = |i: usize| points[i].as_ref()[k];
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal));

        let first = order[0];
        let last = order[n - 1];
        distances[first] = f64::INFINITY;
        distances[last] = f64::INFINITY;

        let range = value(last) - value(first);
        if range <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            let (prev, mid, next) = (w[0], w[1], w[2]);
            distances[mid] += (value(next) - value(prev)) / range;
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let points: Vec<[f64; 2]> = vec![];
        assert_eq!(non_dominated_sort(&points), SortedFronts::default());
        assert!(crowding_distance(&points).is_empty());
    }

    #[test]
    fn test_chain_of_fronts() {
        let points = vec![[3.0, 3.0], [1.0, 1.0], [2.0, 2.0]];
        let sorted = non_dominated_sort(&points);
        assert_eq!(sorted.ranks, vec![2, 0, 1]);
        assert_eq!(sorted.fronts, vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_identical_points_share_a_front() {
        let points = vec![[2.0, 2.0]; 4];
        let sorted = non_dominated_sort(&points);
        assert!(sorted.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_four_objectives() {
        let points = vec![
            [-0.9, 100.0, 2.0, 10.0],
            [-0.8, 50.0, 1.0, 5.0],
            [-0.8, 120.0, 3.0, 12.0], // dominated by 0
        ];
        let sorted = non_dominated_sort(&points);
        assert_eq!(sorted.ranks, vec![0, 0, 1]);
    }

    #[test]
    fn test_dominance_cmp() {
        assert_eq!(dominance(&[1.0, 1.0], &[2.0, 2.0]), Dominance::Left);
        assert_eq!(dominance(&[2.0, 2.0], &[1.0, 2.0]), Dominance::Right);
        assert_eq!(dominance(&[1.0, 3.0], &[3.0, 1.0]), Dominance::Neither);
        assert_eq!(dominance(&[1.0, 1.0], &[1.0, 1.0]), Dominance::Neither);
    }

    #[test]
    fn test_crowding_boundaries_and_interior() {
        let points = vec![[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]];
        let d = crowding_distance(&points);
        assert!(d[0].is_infinite() && d[4].is_infinite());
        for &x in &d[1..4] {
            assert!((x - 1.0).abs() < 1e-12, "expected 2 * (2/4) = 1, got {x}");
        }
    }

    #[test]
    fn test_crowding_isolated_point_ranks_higher() {
        let points = vec![[0.0, 10.0], [1.0, 9.0], [1.5, 8.5], [6.0, 4.0], [10.0, 0.0]];
        let d = crowding_distance(&points);
        assert!(d[3] > d[2], "isolated point should be less crowded: {d:?}");
    }

    #[test]
    fn test_crowding_zero_range() {
        let points = vec![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let d = crowding_distance(&points);
        assert!(d[1].is_finite());
        assert!((d[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_fronts_all_boundary() {
        assert!(crowding_distance(&[[1.0, 2.0]])[0].is_infinite());
        assert!(crowding_distance(&[[1.0, 2.0], [2.0, 1.0]])
            .iter()
            .all(|d| d.is_infinite()));
    }
}
