//! Population ranking: fronts, crowding and selection order.

use super::dominance::{crowding_distance, non_dominated_sort};
use crate::genome::{Constraints, OBJECTIVE_COUNT};
use crate::population::{Individual, IndividualId, Viability};
use std::cmp::Ordering;

/// A generation cannot be ranked because its data is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankingError {
    #[error("individual {0} has no objective vector")]
    MissingObjectives(IndividualId),
    #[error("individual {0} has a non-finite objective vector")]
    NonFiniteObjectives(IndividualId),
}

/// One member of a front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontMember {
    /// Position of the individual in the slice passed to [`ParetoRanker::rank`].
    pub index: usize,
    pub id: IndividualId,
    pub crowding_distance: f64,
}

/// Individuals sharing one non-domination rank.
///
/// Members are ordered best-first: higher crowding distance, then lower id.
#[derive(Debug, Clone, PartialEq)]
pub struct Front {
    pub rank: usize,
    pub members: Vec<FrontMember>,
}

impl Front {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = IndividualId> + '_ {
        self.members.iter().map(|m| m.id)
    }
}

/// NSGA-II ranking with a hard-constraint policy.
///
/// Ranking rules:
///
/// 1. Non-viable individuals are skipped; they belong to no front.
/// 2. Pending individuals, or viable ones with missing or non-finite
///    objectives, make the whole ranking fail with [`RankingError`].
/// 3. Feasible individuals (within all [`Constraints`]) are sorted into
///    fronts `0..k`.
/// 4. Infeasible individuals are sorted among themselves and their fronts
///    are appended after the feasible ones. They never share front 0 with
///    a feasible individual. If nothing is feasible, front 0 is returned
///    empty and infeasible fronts start at rank 1.
///
/// ```
/// use u_nas::genome::{Constraints, Genome, GenomeId, ObjectiveVector, Operation};
/// use u_nas::pareto::ParetoRanker;
/// use u_nas::population::{Individual, IndividualId};
///
/// let g = Genome::new(GenomeId(0), 2, Operation::DEFAULT_CATALOG.to_vec())
///     .connect(0, 1, Operation::Conv3x3);
/// let pop = vec![
///     Individual::evaluated(IndividualId(1), g.clone(), ObjectiveVector::new(0.90, 100.0, 2.0, 10.0), 0.0),
///     Individual::evaluated(IndividualId(2), g.clone(), ObjectiveVector::new(0.95, 400.0, 8.0, 30.0), 0.0),
///     Individual::evaluated(IndividualId(3), g, ObjectiveVector::new(0.85, 150.0, 3.0, 12.0), 0.0),
/// ];
///
/// let fronts = ParetoRanker::new(Constraints::none()).rank(&pop).unwrap();
/// assert_eq!(fronts[0].len(), 2);
/// assert_eq!(fronts[1].ids().collect::<Vec<_>>(), vec![IndividualId(3)]);
///
/// // Capping params at 5M pushes individual 2 out of front 0.
/// let capped = ParetoRanker::new(Constraints::none().with_max_params(5.0));
/// let fronts = capped.rank(&pop).unwrap();
/// assert!(fronts[0].ids().all(|id| id != IndividualId(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParetoRanker {
    constraints: Constraints,
}

impl ParetoRanker {
    pub fn new(constraints: Constraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Computes fronts and crowding distances.
    pub fn rank(&self, individuals: &[Individual]) -> Result<Vec<Front>, RankingError> {
        let mut feasible = Vec::new();
        let mut infeasible = Vec::new();

        for (index, ind) in individuals.iter().enumerate() {
            match ind.viability {
                Viability::NonViable { .. } => continue,
                Viability::Pending => return Err(RankingError::MissingObjectives(ind.id)),
                Viability::Viable => {}
            }
            let objectives = ind
                .objectives
                .ok_or(RankingError::MissingObjectives(ind.id))?;
            if !objectives.is_finite() {
                return Err(RankingError::NonFiniteObjectives(ind.id));
            }
            let entry = (index, objectives.as_minimization());
            if self.constraints.is_satisfied_by(&objectives) {
                feasible.push(entry);
            } else {
                infeasible.push(entry);
            }
        }

        let mut fronts = sort_group(individuals, &feasible, 0);
        if !infeasible.is_empty() {
            if fronts.is_empty() {
                fronts.push(Front {
                    rank: 0,
                    members: Vec::new(),
                });
            }
            let offset = fronts.len();
            fronts.extend(sort_group(individuals, &infeasible, offset));
        }
        Ok(fronts)
    }

    /// Ranks `individuals` and writes front rank and crowding distance back
    /// into them. Unranked (non-viable) individuals are cleared.
    pub fn rank_in_place(&self, individuals: &mut [Individual]) -> Result<Vec<Front>, RankingError> {
        let fronts = self.rank(individuals)?;
        assign_fronts(individuals, &fronts);
        Ok(fronts)
    }
}

type Entry = (usize, [f64; OBJECTIVE_COUNT]);

fn sort_group(individuals: &[Individual], group: &[Entry], rank_offset: usize) -> Vec<Front> {
    if group.is_empty() {
        return Vec::new();
    }

    let points: Vec<[f64; OBJECTIVE_COUNT]> = group.iter().map(|&(_, p)| p).collect();

    let sorted = non_dominated_sort(&points);
    sorted
        .fronts
        .iter()
        .enumerate()
        .map(|(r, local)| {
            let front_points: Vec<[f64; OBJECTIVE_COUNT]> =
                local.iter().map(|&j| points[j]).collect();
            let distances = crowding_distance(&front_points);
            let mut members: Vec<FrontMember> = local
                .iter()
                .zip(distances)
                .map(|(&j, crowding_distance)| {
                    let index = group[j].0;
                    FrontMember {
                        index,
                        id: individuals[index].id,
                        crowding_distance,
                    }
                })
                .collect();
            members.sort_by(|a, b| {
                b.crowding_distance
                    .partial_cmp(&a.crowding_distance)
                    .unwrap_or(Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
            Front {
                rank: rank_offset + r,
                members,
            }
        })
        .collect()
}

/// Writes the ranking in `fronts` into `individuals`.
pub fn assign_fronts(individuals: &mut [Individual], fronts: &[Front]) {
    for ind in individuals.iter_mut() {
        ind.clear_ranking();
    }
    for front in fronts {
        for m in &front.members {
            let ind = &mut individuals[m.index];
            ind.front_rank = Some(front.rank);
            ind.crowding_distance = Some(m.crowding_distance);
        }
    }
}

/// Crowded-comparison order; `Less` means `a` is preferred.
///
/// Lower front rank wins, then higher crowding distance, then lower id.
/// Unranked individuals sort after every ranked one.
pub fn crowded_cmp(a: &Individual, b: &Individual) -> Ordering {
    let rank = |i: &Individual| i.front_rank.unwrap_or(usize::MAX);
    let crowd = |i: &Individual| i.crowding_distance.unwrap_or(f64::NEG_INFINITY);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| crowd(b).partial_cmp(&crowd(a)).unwrap_or(Ordering::Equal))
        .then(a.id.cmp(&b.id))
}
