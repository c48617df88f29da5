use std::collections::HashSet;

use serde::Serialize;

use crate::interpreter::Outcome;
use crate::program::Program;

/// Outcome tallies over one search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub candidates: usize,
    pub successes: usize,
    pub exhausted: usize,
    pub budget_exceeded: usize,
    /// Distinct programs among the successes. The sampler repeats itself,
    /// so this is usually smaller than `successes`.
    pub unique_successes: usize,
    /// Shortest successful run, if any.
    pub fewest_steps: Option<usize>,
}

impl SearchStats {
    /// Tally `outcomes`, which must line up with `candidates`.
    pub fn from_outcomes(candidates: &[Program], outcomes: &[Outcome]) -> Self {
        debug_assert_eq!(candidates.len(), outcomes.len());
        let mut stats = Self {
            candidates: outcomes.len(),
            ..Default::default()
        };
        let mut unique: HashSet<&Program> = HashSet::new();
        for (program, outcome) in candidates.iter().zip(outcomes) {
            match *outcome {
                Outcome::Success { steps } => {
                    stats.successes += 1;
                    unique.insert(program);
                    stats.fewest_steps = Some(stats.fewest_steps.map_or(steps, |s| s.min(steps)));
                }
                Outcome::Exhausted => stats.exhausted += 1,
                Outcome::BudgetExceeded => stats.budget_exceeded += 1,
            }
        }
        stats.unique_successes = unique.len();
        stats
    }

    /// Fraction of candidates that reached the goal.
    pub fn success_rate(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.successes as f64 / self.candidates as f64
    }
}
