//! Parent selection policies.
//!
//! Selection only ever draws from viable individuals; the caller passes
//! their indices as `candidates`. Every comparison ends in an id tie-break,
//! so a seeded run selects the same parents every time.
//!
//! # References
//!
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"
//! - Deb et al. (2002), crowded-comparison operator of NSGA-II

use crate::pareto::crowded_cmp;
use crate::population::Individual;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Strategy for choosing parents.
///
/// ```
/// use u_nas::search::SelectionPolicy;
///
/// // Binary crowded tournament, the NSGA-II default.
/// assert_eq!(SelectionPolicy::default(), SelectionPolicy::Crowded(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Pick `k` candidates at random; the highest scalar fitness wins.
    Tournament(usize),

    /// Pick `k` candidates at random; lower front wins, then higher
    /// crowding distance.
    Crowded(usize),

    /// Linear ranking over the crowded-comparison order: the i-th best of
    /// `n` candidates is drawn with weight `n - i`.
    Rank,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Crowded(2)
    }
}

impl SelectionPolicy {
    pub fn tournament_size(&self) -> Option<usize> {
        match self {
            SelectionPolicy::Tournament(k) | SelectionPolicy::Crowded(k) => Some(*k),
            SelectionPolicy::Rank => None,
        }
    }

    /// Selects one parent; returns an index into `population`.
    ///
    /// Returns `None` when `candidates` is empty.
    pub fn select<R: Rng>(
        &self,
        population: &[Individual],
        candidates: &[usize],
        rng: &mut R,
    ) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let picked = match self {
            SelectionPolicy::Tournament(k) => {
                tournament(population, candidates, *k, rng, fitness_cmp)
            }
            SelectionPolicy::Crowded(k) => tournament(population, candidates, *k, rng, crowded_cmp),
            SelectionPolicy::Rank => rank(population, candidates, rng),
        };
        Some(picked)
    }
}

/// Higher fitness first, then lower id.
fn fitness_cmp(a: &Individual, b: &Individual) -> Ordering {
    let f = |i: &Individual| i.fitness.unwrap_or(f64::NEG_INFINITY);
    f(b).total_cmp(&f(a)).then(a.id.cmp(&b.id))
}

/// `better(a, b) == Less` means `a` wins.
fn tournament<R: Rng>(
    population: &[Individual],
    candidates: &[usize],
    k: usize,
    rng: &mut R,
    better: fn(&Individual, &Individual) -> Ordering,
) -> usize {
    let n = candidates.len();
    let mut best = candidates[rng.random_range(0..n)];
    for _ in 1..k.max(1) {
        let idx = candidates[rng.random_range(0..n)];
        if better(&population[idx], &population[best]) == Ordering::Less {
            best = idx;
        }
    }
    best
}

fn rank<R: Rng>(population: &[Individual], candidates: &[usize], rng: &mut R) -> usize {
    let mut order = candidates.to_vec();
    order.sort_by(|&a, &b| crowded_cmp(&population[a], &population[b]));

    let n = order.len();
    let total = n * (n + 1) / 2;
    let mut ticket = rng.random_range(0..total);
    for (i, &idx) in order.iter().enumerate() {
        let weight = n - i;
        if ticket < weight {
            return idx;
        }
        ticket -= weight;
    }
    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Genome, GenomeId, ObjectiveVector, Operation};
    use crate::population::IndividualId;
    use crate::random::create_rng;

    fn population() -> Vec<Individual> {
        let genome = Genome::new(GenomeId(0), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Skip);
        (0..5u64)
            .map(|i| {
                let mut ind = Individual::evaluated(
                    IndividualId(i),
                    genome.clone(),
                    ObjectiveVector::new(0.5, 10.0, 1.0, 1.0),
                    i as f64 / 10.0,
                );
                ind.front_rank = Some(4 - i as usize);
                ind.crowding_distance = Some(1.0);
                ind
            })
            .collect()
    }

    #[test]
    fn test_empty_candidates() {
        let pop = population();
        let mut rng = create_rng(1);
        assert_eq!(SelectionPolicy::Rank.select(&pop, &[], &mut rng), None);
    }

    #[test]
    fn test_full_tournament_picks_best() {
        let pop = population();
        let all: Vec<usize> = (0..pop.len()).collect();
        let mut rng = create_rng(42);
        let mut wins = [0usize; 5];
        for _ in 0..200 {
            let i = SelectionPolicy::Tournament(50).select(&pop, &all, &mut rng).unwrap();
            wins[i] += 1;
        }
        assert!(wins[4] > 190, "large tournaments should almost always pick the fittest: {wins:?}");
    }

    #[test]
    fn test_crowded_prefers_lower_front() {
        let pop = population();
        let all: Vec<usize> = (0..pop.len()).collect();
        let mut rng = create_rng(42);
        let mut wins = [0usize; 5];
        for _ in 0..1000 {
            wins[SelectionPolicy::Crowded(2).select(&pop, &all, &mut rng).unwrap()] += 1;
        }
        // Index 4 has front 0.
        assert!(wins[4] > wins[0], "{wins:?}");
    }

    #[test]
    fn test_rank_selection_bias_and_restriction() {
        let pop = population();
        let candidates = [1, 3];
        let mut rng = create_rng(7);
        let mut wins = [0usize; 5];
        for _ in 0..900 {
            wins[SelectionPolicy::Rank.select(&pop, &candidates, &mut rng).unwrap()] += 1;
        }
        assert_eq!(wins[0] + wins[2] + wins[4], 0);
        // Weights 2:1 in favour of index 3 (front 1).
        assert!(wins[3] > wins[1], "{wins:?}");
    }

    #[test]
    fn test_deterministic() {
        let pop = population();
        let all: Vec<usize> = (0..pop.len()).collect();
        let draw = |seed| {
            let mut rng = create_rng(seed);
            (0..20)
                .map(|_| SelectionPolicy::Crowded(2).select(&pop, &all, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }
}
