use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::grid::GridMap;
use crate::instruction::Instruction;
use crate::interpreter::{self, DEFAULT_MAX_STEPS, Outcome, RunConfig};
use crate::metrics::SearchStats;
use crate::program::Program;

/// Configuration for a brute-force program search.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Random subroutine draws per permutation of the vocabulary.
    pub trials_per_permutation: usize,
    /// Instructions per subroutine body.
    pub body_len: usize,
    /// Step budget for every candidate.
    pub max_steps: usize,
    /// Seed for the body sampler.
    pub seed: u64,
    /// Worker threads (`None` lets rayon decide).
    pub threads: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            trials_per_permutation: 10,
            body_len: 3,
            max_steps: DEFAULT_MAX_STEPS,
            seed: 0,
            threads: None,
        }
    }
}

/// A candidate that reached the goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Success {
    pub main: Vec<Instruction>,
    pub sub1: Vec<Instruction>,
    pub sub2: Vec<Instruction>,
    pub steps: usize,
}

/// Everything a search produced: the successes in candidate order and
/// tallies over all candidates.
#[derive(Debug)]
pub struct SearchResult {
    pub successes: Vec<Success>,
    pub stats: SearchStats,
}

/// All orderings of `items`, in lexicographic order of their positions.
pub fn permutations<T: Copy>(items: &[T]) -> Vec<Vec<T>> {
    let n = items.len();
    let mut idx: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());

        // Next lexicographic arrangement of `idx`.
        let Some(pivot) = (1..n).rev().find(|&i| idx[i - 1] < idx[i]).map(|i| i - 1) else {
            break;
        };
        let Some(succ) = (pivot + 1..n).rev().find(|&j| idx[j] > idx[pivot]) else {
            break;
        };
        idx.swap(pivot, succ);
        idx[pivot + 1..].reverse();
    }
    out
}

/// Draw `amount` distinct positions of `perm` and return their
/// instructions in the permutation's order.
pub fn sample_ordered<T: Copy, R: Rng + ?Sized>(
    perm: &[T],
    amount: usize,
    rng: &mut R,
) -> Vec<T> {
    let amount = amount.min(perm.len());
    let mut picks = rand::seq::index::sample(rng, perm.len(), amount).into_vec();
    picks.sort_unstable();
    picks.into_iter().map(|i| perm[i]).collect()
}

/// Build every candidate program. `main` is always a single call to `sub1`.
///
/// Generation is sequential and driven by one seeded RNG, so the same
/// config always yields the same candidates in the same order.
pub fn generate_candidates(config: &SearchConfig) -> Vec<Program> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let perms = permutations(&Instruction::VOCABULARY);
    let mut candidates = Vec::with_capacity(perms.len() * config.trials_per_permutation);
    for perm in &perms {
        for _ in 0..config.trials_per_permutation {
            let sub1 = sample_ordered(perm, config.body_len, &mut rng);
            let sub2 = sample_ordered(perm, config.body_len, &mut rng);
            candidates.push(Program::new(vec![Instruction::CallSub1], sub1, sub2));
        }
    }
    candidates
}

/// Run every candidate with the fixed start and goal. Outcomes line up
/// with `candidates`.
pub fn evaluate(candidates: &[Program], grid: &GridMap, max_steps: usize) -> Vec<Outcome> {
    let config = RunConfig {
        max_steps,
        ..Default::default()
    };
    candidates
        .par_iter()
        .map(|program| interpreter::run(program, grid, config))
        .collect()
}

/// Generate, evaluate and keep the candidates that reached the goal.
pub fn search(
    grid: &GridMap,
    config: &SearchConfig,
) -> Result<SearchResult, rayon::ThreadPoolBuildError> {
    let candidates = generate_candidates(config);
    debug!(candidates = candidates.len(), seed = config.seed, "generated candidates");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()?;
    let outcomes = pool.install(|| evaluate(&candidates, grid, config.max_steps));
    debug!(threads = pool.current_num_threads(), "evaluated candidates");

    let stats = SearchStats::from_outcomes(&candidates, &outcomes);
    info!(
        candidates = stats.candidates,
        successes = stats.successes,
        unique = stats.unique_successes,
        "search finished"
    );

    let successes = candidates
        .into_iter()
        .zip(outcomes)
        .filter_map(|(program, outcome)| match outcome {
            Outcome::Success { steps } => Some(Success {
                main: program.main,
                sub1: program.sub1,
                sub2: program.sub2,
                steps,
            }),
            Outcome::BudgetExceeded | Outcome::Exhausted => None,
        })
        .collect();

    Ok(SearchResult { successes, stats })
}
