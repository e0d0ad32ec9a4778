//! Statistics hooks.
//!
//! Engines call a [`Statistics`] implementation at fixed points of every
//! generation. Collecting or writing run statistics is left to the
//! implementor; [`NoStatistics`] ignores everything and [`History`] keeps the
//! per-generation summaries in memory.

use super::individual::Individual;
use super::runner::GpResult;
use crate::tree::Primitive;

/// Population averages at the end of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationSummary {
    pub generation: usize,
    /// Cumulative evaluations in the run.
    pub evaluations: u64,
    /// Best fitness seen in the run so far.
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub avg_size: f64,
    pub avg_depth: f64,
    pub population: usize,
}

impl GenerationSummary {
    /// Summarises the given individuals.
    pub fn from_population<'a, P, I>(
        generation: usize,
        evaluations: u64,
        best_fitness: f64,
        individuals: I,
    ) -> Self
    where
        P: Primitive,
        I: IntoIterator<Item = &'a Individual<P>>,
    {
        let mut summary = Self {
            generation,
            evaluations,
            best_fitness,
            ..Self::default()
        };
        for ind in individuals {
            summary.population += 1;
            summary.avg_fitness += ind.fitness();
            summary.avg_size += ind.size() as f64;
            summary.avg_depth += ind.depth() as f64;
        }
        if summary.population > 0 {
            let n = summary.population as f64;
            summary.avg_fitness /= n;
            summary.avg_size /= n;
            summary.avg_depth /= n;
        }
        summary
    }
}

/// Per-generation observer.
///
/// All methods default to no-ops.
pub trait Statistics<P: Primitive> {
    /// Before a generation is bred.
    fn pre_generation(&mut self, _generation: usize) {}

    /// After the generation's individuals were evaluated.
    fn post_evaluation(&mut self, _summary: &GenerationSummary) {}

    /// After survivor selection completed the generation.
    fn post_generation(&mut self, _summary: &GenerationSummary) {}

    /// Once, after the run stopped.
    fn post_evolution(&mut self, _result: &GpResult<P>) {}
}

/// Ignores every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatistics;

impl<P: Primitive> Statistics<P> for NoStatistics {}

/// Records the summary of every completed generation.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub generations: Vec<GenerationSummary>,
    pub finished: bool,
}

impl<P: Primitive> Statistics<P> for History {
    fn post_generation(&mut self, summary: &GenerationSummary) {
        self.generations.push(*summary);
    }

    fn post_evolution(&mut self, _result: &GpResult<P>) {
        self.finished = true;
    }
}
