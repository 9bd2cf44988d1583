//! The generation loop.
//!
//! [`EvolutionController`] owns the run: configuration, random source,
//! worker pool, population store and run statistics. Each generation goes
//! through evaluation → ranking → selection → variation → replacement.

use super::config::{ConfigurationError, SearchConfig};
use super::state::SearchState;
use crate::evaluator::{check_objectives, EvaluationError, FitnessEvaluator, SearchObjective};
use crate::genome::operators::{crossover, mutate, random_genome};
use crate::genome::{validate, Genome, GenomeId, ObjectiveVector, SearchSpace};
use crate::pareto::{ParetoRanker, RankingError};
use crate::population::{
    GenerationSnapshot, Individual, IndividualId, PopulationStore, StoreReader,
};
use crate::random::{create_rng, SearchRng};
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fatal failure of a controller operation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SearchState,
    },
    #[error("every individual in generation {generation} is non-viable")]
    PopulationCollapse { generation: usize },
    #[error("ranking inconsistency: {0}")]
    RankingInconsistency(#[from] RankingError),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Progress event emitted at every generation boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub generation: usize,
    /// Best fitness in front 0 (over all viable individuals when front 0 is empty).
    pub best_fitness: f64,
    /// Mean fitness over viable individuals.
    pub mean_fitness: f64,
    pub front0_size: usize,
    pub viable: usize,
    pub non_viable: usize,
}

impl GenerationStats {
    fn of(snapshot: &GenerationSnapshot) -> Self {
        let fitness: Vec<f64> = snapshot
            .individuals
            .iter()
            .filter(|ind| ind.is_viable())
            .filter_map(|ind| ind.fitness)
            .collect();
        let front0: Vec<f64> = snapshot.pareto_front().filter_map(|ind| ind.fitness).collect();
        let pool = if front0.is_empty() { &fitness } else { &front0 };
        let best_fitness = pool.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_fitness = if fitness.is_empty() {
            0.0
        } else {
            fitness.iter().sum::<f64>() / fitness.len() as f64
        };
        Self {
            generation: snapshot.generation,
            best_fitness,
            mean_fitness,
            front0_size: front0.len(),
            viable: fitness.len(),
            non_viable: snapshot.len() - fitness.len(),
        }
    }
}

/// Outcome of [`EvolutionController::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Seed of the run; replaying it reproduces every generation.
    pub seed: u64,
    pub start_generation: usize,
    pub final_generation: usize,
    pub cancelled: bool,
    pub best: Option<IndividualId>,
    pub best_fitness: Option<f64>,
}

type Observer = Box<dyn Fn(&GenerationStats) + Send + Sync>;

/// Per-run state created by `initialize`.
struct RunContext {
    config: SearchConfig,
    space: SearchSpace,
    ranker: ParetoRanker,
    seed: u64,
    rng: SearchRng,
    pool: ThreadPool,
    next_id: u64,
}

impl RunContext {
    fn next_ids(&mut self) -> (IndividualId, GenomeId) {
        let id = self.next_id;
        self.next_id += 1;
        (IndividualId(id), GenomeId(id))
    }
}

/// Drives an evolutionary architecture search.
///
/// # Usage
///
/// ```
/// use u_nas::evaluator::ProxyEvaluator;
/// use u_nas::search::{EvolutionController, SearchConfig, SearchState};
///
/// let mut controller = EvolutionController::new(ProxyEvaluator::new());
/// controller
///     .initialize(SearchConfig::default().with_population_size(12).with_seed(42))
///     .unwrap();
///
/// let summary = controller.run(3).unwrap();
/// assert_eq!(summary.final_generation, 3);
/// assert_eq!(controller.state(), SearchState::Completed);
///
/// let snapshot = controller.snapshot();
/// assert_eq!(snapshot.len(), 12);
/// assert!(snapshot.pareto_front().count() >= 1);
/// ```
pub struct EvolutionController<E: FitnessEvaluator> {
    evaluator: E,
    state: SearchState,
    run: Option<RunContext>,
    store: PopulationStore,
    history: Vec<GenerationStats>,
    last_run: Option<RunSummary>,
    observer: Option<Observer>,
}

fn transition(state: &mut SearchState, next: SearchState) {
    debug!("search state {} -> {}", state, next);
    *state = next;
}

impl<E: FitnessEvaluator> EvolutionController<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            state: SearchState::Uninitialized,
            run: None,
            store: PopulationStore::new(),
            history: Vec::new(),
            last_run: None,
            observer: None,
        }
    }

    /// Registers a callback invoked with every [`GenerationStats`].
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&GenerationStats) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn generation(&self) -> usize {
        self.store.generation()
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn config(&self) -> Option<&SearchConfig> {
        self.run.as_ref().map(|ctx| &ctx.config)
    }

    /// Seed of the current run.
    pub fn seed(&self) -> Option<u64> {
        self.run.as_ref().map(|ctx| ctx.seed)
    }

    pub fn store(&self) -> &PopulationStore {
        &self.store
    }

    /// Latest committed generation.
    pub fn snapshot(&self) -> Arc<GenerationSnapshot> {
        self.store.current()
    }

    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }

    /// Statistics of every completed generation of the current run.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn last_run(&self) -> Option<&RunSummary> {
        self.last_run.as_ref()
    }

    /// Starts a new run with a random, valid population.
    ///
    /// The configuration is validated before anything changes; on error the
    /// controller keeps its previous state and population.
    pub fn initialize(&mut self, config: SearchConfig) -> Result<(), SearchError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.unwrap_or(0))
            .build()
            .map_err(|e| SearchError::WorkerPool(e.to_string()))?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let space = config.effective_search_space();
        let ranker = ParetoRanker::new(config.effective_constraints());

        let mut ctx = RunContext {
            rng: create_rng(seed),
            config,
            space,
            ranker,
            seed,
            pool,
            next_id: 0,
        };

        let population: Vec<Individual> = (0..ctx.config.population_size)
            .map(|_| {
                let (id, genome_id) = ctx.next_ids();
                let genome = random_genome(genome_id, &ctx.space, &mut ctx.rng);
                Individual::new(id, genome, 0, Vec::new())
            })
            .collect();

        info!(
            "search initialized: population={}, seed={}, workers={}",
            population.len(),
            seed,
            ctx.pool.current_num_threads()
        );

        self.store.reset(population);
        self.history.clear();
        self.last_run = None;
        self.run = Some(ctx);
        transition(&mut self.state, SearchState::Initialized);
        Ok(())
    }

    /// Advances the population by one generation.
    ///
    /// The store is committed only after the next generation is fully
    /// evaluated and ranked. A fatal error moves the controller to
    /// [`SearchState::Failed`].
    pub fn step_generation(&mut self) -> Result<GenerationStats, SearchError> {
        if !self.state.can_step() {
            return Err(SearchError::InvalidState {
                operation: "step a generation",
                state: self.state,
            });
        }
        match self.advance() {
            Ok(stats) => Ok(stats),
            Err(e) => {
                warn!("generation {} failed: {e}", self.store.generation());
                transition(&mut self.state, SearchState::Failed);
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<GenerationStats, SearchError> {
        let ctx = self.run.as_mut().ok_or(SearchError::InvalidState {
            operation: "step a generation",
            state: SearchState::Uninitialized,
        })?;
        let generation = self.store.generation();
        let objective = ctx.config.objective;

        // Evaluate whatever the current generation still lacks.
        transition(&mut self.state, SearchState::Evaluating);
        let mut population = self.store.current().individuals.clone();
        let evaluated = evaluate_pending(&ctx.pool, &self.evaluator, objective, &mut population);
        ensure_viable(&population, generation)?;

        transition(&mut self.state, SearchState::Ranking);
        ctx.ranker.rank_in_place(&mut population)?;
        if evaluated > 0 {
            // First boundary of a fresh run: generation 0 is now complete.
            self.store.refresh(population.clone());
            report(&self.store.current(), self.observer.as_ref(), &mut self.history);
        }

        transition(&mut self.state, SearchState::Selecting);
        let population_size = ctx.config.population_size;
        let mut next: Vec<Individual> = elites(&population, ctx.config.elite_count)
            .into_iter()
            .map(|ind| {
                let mut elite = ind.clone();
                elite.clear_ranking();
                elite
            })
            .collect();
        let candidates: Vec<usize> = (0..population.len())
            .filter(|&i| population[i].is_viable())
            .collect();

        transition(&mut self.state, SearchState::Varying);
        while next.len() < population_size {
            let (id, genome_id) = ctx.next_ids();
            let (mut genome, parents) = breed(ctx, &population, &candidates, genome_id);
            if ctx.rng.random_bool(ctx.config.mutation_rate) {
                mutate(&mut genome, &ctx.space, &mut ctx.rng);
            }
            next.push(Individual::new(id, genome, generation + 1, parents));
        }

        transition(&mut self.state, SearchState::Evaluating);
        evaluate_pending(&ctx.pool, &self.evaluator, objective, &mut next);
        ensure_viable(&next, generation + 1)?;

        transition(&mut self.state, SearchState::Ranking);
        ctx.ranker.rank_in_place(&mut next)?;

        self.store.replace(next);
        let stats = report(&self.store.current(), self.observer.as_ref(), &mut self.history);
        transition(&mut self.state, SearchState::Replaced);
        Ok(stats)
    }

    /// Steps until the generation counter reaches `generations`.
    pub fn run(&mut self, generations: usize) -> Result<RunSummary, SearchError> {
        self.run_with_cancel(generations, None)
    }

    /// Runs up to the generation target from the configuration.
    pub fn run_configured(&mut self) -> Result<RunSummary, SearchError> {
        let target = self
            .config()
            .map(|c| c.generations)
            .ok_or(SearchError::InvalidState {
                operation: "run",
                state: self.state,
            })?;
        self.run(target)
    }

    /// Runs with an optional cancellation token.
    ///
    /// `generations` is the absolute value the generation counter should
    /// reach; a completed run can be extended with a larger target. The
    /// flag is checked between generations. On cancellation the store holds
    /// the last fully replaced generation and the controller can resume.
    pub fn run_with_cancel(
        &mut self,
        generations: usize,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RunSummary, SearchError> {
        if generations == 0 {
            return Err(ConfigurationError::ZeroGenerations.into());
        }
        if !self.state.can_run() {
            return Err(SearchError::InvalidState {
                operation: "run",
                state: self.state,
            });
        }
        if self.state == SearchState::Completed {
            transition(&mut self.state, SearchState::Replaced);
        }

        let start_generation = self.store.generation();
        let mut cancelled = false;
        while self.store.generation() < generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            self.step_generation()?;
        }

        let snapshot = self.store.current();
        let best = snapshot.best();
        let summary = RunSummary {
            seed: self.seed().unwrap_or_default(),
            start_generation,
            final_generation: snapshot.generation,
            cancelled,
            best: best.map(|ind| ind.id),
            best_fitness: best.and_then(|ind| ind.fitness),
        };
        if cancelled {
            info!("search cancelled at generation {}", summary.final_generation);
        } else {
            info!("search completed at generation {}", summary.final_generation);
            transition(&mut self.state, SearchState::Completed);
        }
        self.last_run = Some(summary.clone());
        Ok(summary)
    }
}

/// Validates and evaluates every pending individual on the worker pool.
///
/// Failures mark the individual non-viable. Returns how many were pending.
fn evaluate_pending<E: FitnessEvaluator>(
    pool: &ThreadPool,
    evaluator: &E,
    objective: SearchObjective,
    population: &mut [Individual],
) -> usize {
    let pending = population.iter().filter(|ind| ind.is_pending()).count();
    if pending == 0 {
        return 0;
    }
    pool.install(|| {
        population
            .par_iter_mut()
            .filter(|ind| ind.is_pending())
            .for_each(|ind| match evaluate_one(evaluator, &ind.genome) {
                Ok(objectives) => {
                    let fitness = objective.score(&objectives);
                    ind.record(objectives, fitness);
                }
                Err(e) => {
                    warn!("{} ({}) is non-viable: {e}", ind.id, ind.genome.id());
                    ind.mark_non_viable(e.to_string());
                }
            });
    });
    pending
}

/// Logs a committed generation and hands its stats to the observer.
fn report(
    snapshot: &GenerationSnapshot,
    observer: Option<&Observer>,
    history: &mut Vec<GenerationStats>,
) -> GenerationStats {
    let stats = GenerationStats::of(snapshot);
    info!(
        "generation {}: best={:.4} mean={:.4} front0={} non_viable={}",
        stats.generation, stats.best_fitness, stats.mean_fitness, stats.front0_size, stats.non_viable
    );
    if let Some(observer) = observer {
        observer(&stats);
    }
    history.push(stats.clone());
    stats
}

/// Validates and evaluates one genome. A panicking backend is reported as
/// a backend failure of that genome only.
pub(crate) fn evaluate_one<E: FitnessEvaluator>(
    evaluator: &E,
    genome: &Genome,
) -> Result<ObjectiveVector, EvaluationError> {
    validate(genome)?;
    let objectives = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(genome)))
        .map_err(|payload| EvaluationError::Backend(panic_message(payload.as_ref())))??;
    check_objectives(&objectives)?;
    Ok(objectives)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("evaluator panicked: {detail}")
}

fn ensure_viable(population: &[Individual], generation: usize) -> Result<(), SearchError> {
    if population.iter().any(Individual::is_viable) {
        Ok(())
    } else {
        Err(SearchError::PopulationCollapse { generation })
    }
}

/// The best `k` members of front 0: fitness descending, then crowding
/// distance descending, then id.
fn elites(population: &[Individual], k: usize) -> Vec<&Individual> {
    let mut front0: Vec<&Individual> = population.iter().filter(|i| i.is_pareto_optimal()).collect();
    front0.sort_by(|a, b| {
        let f = |i: &Individual| i.fitness.unwrap_or(f64::NEG_INFINITY);
        let c = |i: &Individual| i.crowding_distance.unwrap_or(0.0);
        f(b).total_cmp(&f(a))
            .then_with(|| c(b).partial_cmp(&c(a)).unwrap_or(CmpOrdering::Equal))
            .then(a.id.cmp(&b.id))
    });
    front0.truncate(k);
    front0
}

/// Selects parents and produces one child genome.
fn breed(
    ctx: &mut RunContext,
    population: &[Individual],
    candidates: &[usize],
    genome_id: GenomeId,
) -> (Genome, Vec<IndividualId>) {
    let selection = ctx.config.selection;
    // `candidates` is non-empty after `ensure_viable`.
    let first = selection
        .select(population, candidates, &mut ctx.rng)
        .unwrap_or_default();
    let second = selection
        .select(population, candidates, &mut ctx.rng)
        .unwrap_or(first);
    let (a, b) = (&population[first], &population[second]);

    if ctx.rng.random_bool(ctx.config.crossover_rate) {
        let child = crossover(genome_id, &a.genome, &b.genome, &mut ctx.rng);
        let mut parents = vec![a.id];
        if b.id != a.id {
            parents.push(b.id);
        }
        (child, parents)
    } else {
        (a.genome.clone_as(genome_id), vec![a.id])
    }
}
