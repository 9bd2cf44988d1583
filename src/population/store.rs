//! Versioned population storage with per-generation snapshots.

use super::individual::{Individual, IndividualId};
use crate::genome::GenomeId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable view of one committed generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSnapshot {
    pub generation: usize,
    /// Monotonic commit counter across the whole run.
    pub version: u64,
    pub individuals: Vec<Individual>,
}

impl GenerationSnapshot {
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.iter().find(|ind| ind.id == id)
    }

    /// Members of front `rank`, in no particular order.
    pub fn front(&self, rank: usize) -> impl Iterator<Item = &Individual> {
        self.individuals
            .iter()
            .filter(move |ind| ind.front_rank == Some(rank))
    }

    pub fn pareto_front(&self) -> impl Iterator<Item = &Individual> {
        self.front(0)
    }

    /// Highest-fitness member of front 0; ties go to the lower id.
    pub fn best(&self) -> Option<&Individual> {
        self.pareto_front()
            .filter_map(|ind| ind.fitness.map(|f| (ind, f)))
            .max_by(|(a, fa), (b, fb)| fa.total_cmp(fb).then(b.id.cmp(&a.id)))
            .map(|(ind, _)| ind)
    }

    pub fn viable_count(&self) -> usize {
        self.individuals.iter().filter(|ind| ind.is_viable()).count()
    }
}

/// What the store remembers about an individual after it leaves the live set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageRecord {
    pub id: IndividualId,
    pub genome_id: GenomeId,
    pub generation: usize,
    pub parents: Vec<IndividualId>,
    pub viable: bool,
}

impl LineageRecord {
    fn of(ind: &Individual) -> Self {
        Self {
            id: ind.id,
            genome_id: ind.genome.id(),
            generation: ind.generation,
            parents: ind.parents.clone(),
            viable: ind.is_viable(),
        }
    }
}

/// Authoritative owner of the live population.
///
/// Only the evolution controller commits to the store, and only whole
/// generations. Readers get `Arc` snapshots and never observe a partial
/// commit.
#[derive(Debug)]
pub struct PopulationStore {
    current: Arc<GenerationSnapshot>,
    history: Vec<Arc<GenerationSnapshot>>,
    lineage: BTreeMap<IndividualId, LineageRecord>,
    published: Arc<RwLock<Arc<GenerationSnapshot>>>,
}

impl Default for PopulationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PopulationStore {
    pub fn new() -> Self {
        let empty = Arc::new(GenerationSnapshot::default());
        Self {
            current: Arc::clone(&empty),
            history: Vec::new(),
            lineage: BTreeMap::new(),
            published: Arc::new(RwLock::new(empty)),
        }
    }

    /// Discards everything and commits `individuals` as generation 0.
    pub fn reset(&mut self, individuals: Vec<Individual>) {
        self.history.clear();
        self.lineage.clear();
        let version = self.current.version + 1;
        self.commit(GenerationSnapshot {
            generation: 0,
            version,
            individuals,
        });
    }

    /// Re-commits the current generation after evaluation or ranking.
    pub fn refresh(&mut self, individuals: Vec<Individual>) {
        let generation = self.current.generation;
        let version = self.current.version + 1;
        self.history.pop();
        self.commit(GenerationSnapshot {
            generation,
            version,
            individuals,
        });
    }

    /// Replaces the live set wholesale and advances the generation counter.
    pub fn replace(&mut self, individuals: Vec<Individual>) {
        let generation = self.current.generation + 1;
        let version = self.current.version + 1;
        self.commit(GenerationSnapshot {
            generation,
            version,
            individuals,
        });
    }

    fn commit(&mut self, snapshot: GenerationSnapshot) {
        for ind in &snapshot.individuals {
            self.lineage.insert(ind.id, LineageRecord::of(ind));
        }
        let snapshot = Arc::new(snapshot);
        self.history.push(Arc::clone(&snapshot));
        self.current = Arc::clone(&snapshot);
        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn current(&self) -> Arc<GenerationSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn generation(&self) -> usize {
        self.current.generation
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Snapshot of a past generation, if it was committed in this run.
    pub fn snapshot(&self, generation: usize) -> Option<Arc<GenerationSnapshot>> {
        self.history
            .iter()
            .find(|s| s.generation == generation)
            .cloned()
    }

    pub fn history(&self) -> &[Arc<GenerationSnapshot>] {
        &self.history
    }

    pub fn lineage(&self, id: IndividualId) -> Option<&LineageRecord> {
        self.lineage.get(&id)
    }

    /// Every known ancestor of `id`, nearest first, each listed once.
    ///
    /// Returns an empty list for unknown ids and for generation-0 individuals.
    pub fn ancestry(&self, id: IndividualId) -> Vec<&LineageRecord> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<IndividualId> = match self.lineage.get(&id) {
            Some(record) => record.parents.iter().copied().collect(),
            None => return out,
        };
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(record) = self.lineage.get(&next) {
                queue.extend(record.parents.iter().copied());
                out.push(record);
            }
        }
        out
    }

    /// Handle that always sees the latest committed generation.
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            published: Arc::clone(&self.published),
        }
    }
}

/// Read-only, thread-safe view of a [`PopulationStore`].
#[derive(Debug, Clone)]
pub struct StoreReader {
    published: Arc<RwLock<Arc<GenerationSnapshot>>>,
}

impl StoreReader {
    pub fn latest(&self) -> Arc<GenerationSnapshot> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Genome, Operation, ObjectiveVector};

    fn ind(id: u64, generation: usize, parents: &[u64]) -> Individual {
        let genome = Genome::new(GenomeId(id), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Skip);
        Individual::new(
            IndividualId(id),
            genome,
            generation,
            parents.iter().map(|&p| IndividualId(p)).collect(),
        )
    }

    #[test]
    fn test_generation_counter() {
        let mut store = PopulationStore::new();
        assert!(store.is_empty());
        store.reset(vec![ind(1, 0, &[]), ind(2, 0, &[])]);
        assert_eq!(store.generation(), 0);
        store.refresh(store.current().individuals.clone());
        assert_eq!(store.generation(), 0);
        assert_eq!(store.history().len(), 1);
        store.replace(vec![ind(3, 1, &[1, 2]), ind(4, 1, &[2])]);
        assert_eq!(store.generation(), 1);
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_reader_sees_latest_commit() {
        let mut store = PopulationStore::new();
        let reader = store.reader();
        store.reset(vec![ind(1, 0, &[])]);
        let before = reader.latest();
        store.replace(vec![ind(2, 1, &[1])]);
        assert_eq!(before.generation, 0);
        assert_eq!(reader.latest().generation, 1);
        assert!(reader.latest().get(IndividualId(2)).is_some());
    }

    #[test]
    fn test_ancestry_survives_replacement() {
        let mut store = PopulationStore::new();
        store.reset(vec![ind(1, 0, &[]), ind(2, 0, &[])]);
        store.replace(vec![ind(3, 1, &[1, 2]), ind(4, 1, &[2])]);
        store.replace(vec![ind(5, 2, &[3, 4])]);

        let ids: Vec<u64> = store
            .ancestry(IndividualId(5))
            .iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
        assert!(store.ancestry(IndividualId(1)).is_empty());
        assert!(store.ancestry(IndividualId(99)).is_empty());
    }

    #[test]
    fn test_best_prefers_front_zero() {
        let mut a = ind(1, 0, &[]);
        a.record(ObjectiveVector::new(0.9, 10.0, 1.0, 1.0), 0.5);
        a.front_rank = Some(0);
        let mut b = ind(2, 0, &[]);
        b.record(ObjectiveVector::new(0.8, 5.0, 1.0, 1.0), 0.9);
        b.front_rank = Some(1);
        let snap = GenerationSnapshot {
            generation: 0,
            version: 1,
            individuals: vec![a, b],
        };
        assert_eq!(snap.best().map(|i| i.id), Some(IndividualId(1)));
    }
}
