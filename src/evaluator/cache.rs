//! Memoizing evaluator wrapper.

use super::types::{EvaluationError, FitnessEvaluator};
use crate::genome::{Genome, ObjectiveVector, StructureKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Caches successful evaluations by [`Genome::structure_key`].
///
/// Offspring that reproduce an already-seen architecture (clones without
/// mutation, converged populations) skip the backend. Failures are not
/// cached, so a transient backend error is retried next time.
///
/// Entries are never evicted: the map holds one entry per distinct
/// architecture evaluated since construction or the last [`clear`](Self::clear).
///
/// The lock is not held while the inner evaluator runs; two workers racing
/// on the same new architecture may both evaluate it.
#[derive(Debug)]
pub struct CachedEvaluator<E> {
    inner: E,
    cache: Mutex<HashMap<StructureKey, ObjectiveVector>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<E: FitnessEvaluator> CachedEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of cached architectures.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<E: FitnessEvaluator> FitnessEvaluator for CachedEvaluator<E> {
    fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
        let key = genome.structure_key();
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.evaluate(genome)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result);
        Ok(result)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ProxyEvaluator;
    use crate::genome::{GenomeId, Operation};
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        calls: AtomicUsize,
    }

    impl FitnessEvaluator for Counting {
        fn evaluate(&self, genome: &Genome) -> Result<ObjectiveVector, EvaluationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProxyEvaluator.evaluate(genome)
        }
    }

    fn genome(id: u64) -> Genome {
        Genome::new(GenomeId(id), 2, Operation::DEFAULT_CATALOG.to_vec())
            .connect(0, 1, Operation::Conv3x3)
    }

    #[test]
    fn test_same_structure_hits_cache() {
        let cached = CachedEvaluator::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let a = cached.evaluate(&genome(1)).unwrap();
        let b = cached.evaluate(&genome(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.hits(), 1);
        assert_eq!(cached.misses(), 1);
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn test_distinct_structures_do_not_share_entries() {
        let cached = CachedEvaluator::new(ProxyEvaluator);
        let narrow = cached.evaluate(&genome(1)).unwrap();
        let mut wide_genome = genome(2);
        wide_genome.channels = 128;
        let wide = cached.evaluate(&wide_genome).unwrap();
        assert_ne!(narrow, wide);
        assert_eq!(cached.hits(), 0);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cached = CachedEvaluator::new(ProxyEvaluator);
        let broken = genome(1).connect(1, 5, Operation::Conv3x3);
        assert!(cached.evaluate(&broken).is_err());
        assert!(cached.evaluate(&broken).is_err());
        assert!(cached.is_empty());
        assert_eq!(cached.misses(), 2);
    }

    #[test]
    fn test_clear() {
        let cached = CachedEvaluator::new(ProxyEvaluator);
        cached.evaluate(&genome(1)).unwrap();
        cached.clear();
        assert!(cached.is_empty());
    }
}
