//! Generational GP loop.
//!
//! [`GenerationalGp`] replaces the whole population every generation:
//! initialization → evaluation → selection → crossover/replication →
//! mutation → elitism → evaluation → repeat.

use super::breeder::{elites, Breeder};
use super::config::GpConfig;
use super::individual::Individual;
use super::stats::Statistics;
use super::types::Problem;
use crate::engine::Engine;
use crate::error::GpError;
use crate::tree::Primitive;
use std::collections::HashSet;

/// Result of a GP run.
#[derive(Debug, Clone)]
pub struct GpResult<P> {
    /// Fittest individual seen during the run.
    pub best: Individual<P>,

    /// Same as `best.fitness()`.
    pub best_fitness: f64,

    /// Generations executed, the initial one included.
    pub generations: usize,

    /// Individuals evaluated.
    pub evaluations: u64,

    /// Whether the optimum was reached.
    pub found_optimal: bool,

    /// Generation that produced `best`.
    pub last_improvement_generation: usize,

    /// Best-so-far fitness at the end of each generation.
    pub fitness_history: Vec<f64>,
}

/// Plain generational replacement with optional elitism.
///
/// # Usage
///
/// ```ignore
/// let problem = Parity::new(5);
/// let config = GpConfig::default().with_seed(42);
/// let mut engine = GenerationalGp::new(&problem, &config)?;
/// let result = engine.evolve(&mut NoStatistics)?;
/// println!("best: {} ({})", result.best, result.best_fitness);
/// ```
pub struct GenerationalGp<'a, Pr: Problem> {
    breeder: Breeder<'a, Pr>,
    population: Vec<Individual<Pr::Primitive>>,
    generation: usize,
    fitness_history: Vec<f64>,
}

impl<'a, Pr: Problem> GenerationalGp<'a, Pr> {
    /// Creates the engine.
    ///
    /// # Errors
    /// [`GpError::InvalidConfig`] if `config` does not validate.
    pub fn new(problem: &'a Pr, config: &'a GpConfig) -> Result<Self, GpError> {
        Ok(Self {
            breeder: Breeder::new(problem, config, "generational")?,
            population: Vec::new(),
            generation: 0,
            fitness_history: Vec::new(),
        })
    }

    pub fn population(&self) -> &[Individual<Pr::Primitive>] {
        &self.population
    }

    fn record(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        let summary = self.breeder.summary(self.generation, &self.population)?;
        self.fitness_history.push(summary.best_fitness);
        stats.post_evaluation(&summary);
        stats.post_generation(&summary);
        self.breeder.log_progress(&summary);
        Ok(())
    }

    fn breed(&mut self) -> Result<Vec<Individual<Pr::Primitive>>, GpError> {
        let config = self.breeder.config;
        let target = config.population_size - config.elite_count;
        let pool: Vec<&Individual<Pr::Primitive>> = self.population.iter().collect();

        let (mut next, _) = self
            .breeder
            .fill(&pool, &config.selection, target, self.generation)?;
        next.extend(elites(&self.population, config.elite_count));
        Ok(next)
    }
}

impl<Pr: Problem> Engine<Pr::Primitive> for GenerationalGp<'_, Pr> {
    fn name(&self) -> &'static str {
        "generational"
    }

    fn initialize(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        self.generation = 0;
        self.fitness_history.clear();
        let size = self.breeder.config.population_size;
        self.population = self.breeder.ramped(size, 0, &mut HashSet::new())?;
        self.breeder.evaluate(&mut self.population, 0)?;
        self.record(stats)
    }

    fn step(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        stats.pre_generation(self.generation + 1);
        self.generation += 1;
        let mut next = self.breed()?;
        self.breeder.evaluate(&mut next, self.generation)?;
        self.population = next;
        self.record(stats)
    }

    fn is_done(&self) -> Result<bool, GpError> {
        self.breeder.terminated(self.generation)
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn result(&self) -> Result<GpResult<Pr::Primitive>, GpError> {
        self.breeder.result(self.generation, &self.fitness_history)
    }
}

/// Best individual of a slice, first seen on ties.
pub fn find_best<P: Primitive>(population: &[Individual<P>]) -> Option<&Individual<P>> {
    population.iter().fold(None, |best, ind| match best {
        Some(b) if b.fitness() >= ind.fitness() => Some(b),
        _ => Some(ind),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::{History, NoStatistics};
    use crate::testing::{scored, TruthTable};

    fn config() -> GpConfig {
        GpConfig::default()
            .with_population_size(60)
            .with_generations(15)
            .with_build_depth(1, 3)
            .with_seed(42)
    }

    #[test]
    fn test_solves_and() {
        let problem = TruthTable::and2();
        let config = config();
        let mut engine = GenerationalGp::new(&problem, &config).unwrap();
        let result = engine.evolve(&mut NoStatistics).unwrap();
        assert!(result.found_optimal);
        assert!((result.best_fitness - 1.0).abs() < 1e-12);
        assert!(result.generations <= 15);
    }

    #[test]
    fn test_runs_all_generations_without_optimum() {
        let problem = TruthTable::parity3();
        let config = config().with_stop_on_optimal(false).with_generations(5);
        let mut engine = GenerationalGp::new(&problem, &config).unwrap();
        let mut history = History::default();
        let result = engine.evolve(&mut history).unwrap();

        assert_eq!(result.generations, 5);
        assert_eq!(result.fitness_history.len(), 5);
        assert_eq!(history.generations.len(), 5);
        assert!(history.finished);
        assert_eq!(engine.population().len(), 60);
        // best-so-far never decreases
        for w in result.fitness_history.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn test_elites_survive() {
        let problem = TruthTable::parity3();
        let config = config()
            .with_stop_on_optimal(false)
            .with_elite_count(2)
            .with_generations(2);
        let mut engine = GenerationalGp::new(&problem, &config).unwrap();
        engine.initialize(&mut NoStatistics).unwrap();
        let before = find_best(engine.population()).unwrap().to_string();
        engine.step(&mut NoStatistics).unwrap();
        assert!(engine
            .population()
            .iter()
            .any(|i| i.to_string() == before));
    }

    #[test]
    fn test_evaluation_budget() {
        let problem = TruthTable::parity3();
        let config = config()
            .with_stop_on_optimal(false)
            .with_evaluations(200)
            .with_mutation_probability(1.0);
        let mut engine = GenerationalGp::new(&problem, &config).unwrap();
        let result = engine.evolve(&mut NoStatistics).unwrap();
        assert!(result.evaluations >= 200);
        // one generation at most past the budget
        assert!(result.evaluations < 200 + 60);
    }

    #[test]
    fn test_same_seed_same_run() {
        let problem = TruthTable::parity3();
        let a_config = config().with_num_threads(1);
        let b_config = config().with_num_threads(4);
        let a = GenerationalGp::new(&problem, &a_config)
            .unwrap()
            .evolve(&mut NoStatistics)
            .unwrap();
        let b = GenerationalGp::new(&problem, &b_config)
            .unwrap()
            .evolve(&mut NoStatistics)
            .unwrap();
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.evaluations, b.evaluations);
    }

    #[test]
    fn test_invalid_config() {
        let problem = TruthTable::and2();
        let config = GpConfig::default().with_population_size(1);
        assert!(matches!(
            GenerationalGp::new(&problem, &config),
            Err(GpError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_find_best() {
        let pop = vec![scored("D0", 0.3), scored("D1", 0.8), scored("D2", 0.8)];
        assert_eq!(find_best(&pop).unwrap().to_string(), "D1");
        assert!(find_best::<crate::testing::Bool>(&[]).is_none());
    }
}
