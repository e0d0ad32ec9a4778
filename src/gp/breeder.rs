//! Machinery shared by every engine: id stamping, random construction,
//! offspring events, evaluation and termination.

use super::config::GpConfig;
use super::eval::Evaluator;
use super::individual::{Individual, IndividualId};
use super::operators::{crossover, mutate};
use super::runner::GpResult;
use super::selection::Selection;
use super::stats::GenerationSummary;
use super::types::Problem;
use crate::error::GpError;
use crate::random::{create_rng, resolve_seed};
use crate::tree::BuildMethod;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashSet;

type Ind<Pr> = Individual<<Pr as Problem>::Primitive>;

/// Children of one offspring event and the pool indices of their parents.
pub(crate) struct Brood<P> {
    pub children: Vec<Individual<P>>,
    pub parents: Vec<usize>,
}

/// Owns the RNG, the id counter and the evaluator of a run.
pub(crate) struct Breeder<'a, Pr: Problem> {
    pub problem: &'a Pr,
    pub config: &'a GpConfig,
    pub rng: StdRng,
    pub evaluator: Evaluator<Pr::Primitive>,
    next_serial: u64,
}

impl<'a, Pr: Problem> Breeder<'a, Pr> {
    /// Validates `config` and seeds the run.
    pub fn new(problem: &'a Pr, config: &'a GpConfig, engine: &str) -> Result<Self, GpError> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        info!(
            "starting {engine} run: population {}, {:?}, {} threads, seed {seed}",
            config.population_size, config.termination, config.num_threads
        );
        Ok(Self {
            problem,
            config,
            rng: create_rng(seed),
            evaluator: Evaluator::new(config.num_threads, problem.optimal_fitness())?,
            next_serial: 0,
        })
    }

    /// Gives `individual` the next run-unique id.
    pub fn stamp(&mut self, individual: &mut Ind<Pr>, generation: usize) {
        individual.set_id(IndividualId {
            serial: self.next_serial,
            generation,
        });
        self.next_serial += 1;
    }

    /// Builds an unstamped random individual with a depth drawn from the
    /// configured build range.
    pub fn random_individual(&mut self, method: BuildMethod) -> Result<Ind<Pr>, GpError> {
        let depth = self
            .rng
            .random_range(self.config.min_build_depth..=self.config.max_build_depth);
        let tree = method.build(self.problem.primitives(), depth, &mut self.rng)?;
        Ok(Individual::new(tree))
    }

    /// Ramped half-and-half population of `n` stamped individuals.
    ///
    /// Genomes already in `seen` are redrawn; the redraw budget is
    /// `max_unique_retries` for this call, after which duplicates are
    /// accepted.
    pub fn ramped(
        &mut self,
        n: usize,
        generation: usize,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<Ind<Pr>>, GpError> {
        let mut population = Vec::with_capacity(n);
        let mut retries = 0;
        while population.len() < n {
            let method = BuildMethod::ramped(population.len(), n);
            let mut individual = self.random_individual(method)?;
            let genome = individual.to_string();
            if seen.contains(&genome) {
                if retries < self.config.max_unique_retries {
                    retries += 1;
                    continue;
                }
                if retries == self.config.max_unique_retries {
                    debug!("unique retries exhausted after {retries}; accepting duplicates");
                    retries += 1;
                }
            }
            seen.insert(genome);
            self.stamp(&mut individual, generation);
            population.push(individual);
        }
        Ok(population)
    }

    /// One offspring event on `pool`: a crossover yielding up to two
    /// children, or a replication yielding one. Never yields more than
    /// `room` children. Each child is mutated with the configured
    /// probability and stamped.
    pub fn breed(
        &mut self,
        pool: &[&Ind<Pr>],
        selection: &Selection,
        room: usize,
        generation: usize,
    ) -> Result<Brood<Pr::Primitive>, GpError> {
        let mut children = Vec::with_capacity(2);
        let mut parents = Vec::with_capacity(2);

        if self.rng.random_range(0.0..1.0) < self.config.crossover_probability {
            let (i, j) = selection.select_pair(pool, &mut self.rng);
            let outcome = crossover(pool[i], pool[j], self.config, &mut self.rng)?;
            parents.extend([i, j]);
            children.push(outcome.first);
            if !self.config.discard_second_child && room >= 2 {
                children.push(outcome.second);
            }
        } else {
            let i = selection.select_one(pool, &mut self.rng);
            parents.push(i);
            children.push(pool[i].light_copy());
        }

        for child in children.iter_mut() {
            if self.rng.random_range(0.0..1.0) < self.config.mutation_probability {
                *child = mutate(
                    child,
                    self.problem.primitives(),
                    self.config.node_mutation_probability,
                    &mut self.rng,
                )?;
            }
            self.stamp(child, generation);
        }
        Ok(Brood { children, parents })
    }

    /// Breeds from `pool` until `count` children exist.
    pub fn fill(
        &mut self,
        pool: &[&Ind<Pr>],
        selection: &Selection,
        count: usize,
        generation: usize,
    ) -> Result<(Vec<Ind<Pr>>, Vec<usize>), GpError> {
        let mut children = Vec::with_capacity(count);
        let mut parents = Vec::new();
        while children.len() < count {
            let brood = self.breed(pool, selection, count - children.len(), generation)?;
            children.extend(brood.children);
            parents.extend(brood.parents);
        }
        Ok((children, parents))
    }

    pub fn evaluate(&self, batch: &mut [Ind<Pr>], generation: usize) -> Result<(), GpError> {
        self.evaluator.evaluate(self.problem, batch, generation)
    }

    /// Whether the run should stop after `generation`.
    pub fn terminated(&self, generation: usize) -> Result<bool, GpError> {
        let evaluations = self.evaluator.evaluations()?;
        let optimal = self.config.stop_on_optimal && self.evaluator.found_optimal()?;
        Ok(optimal || self.config.termination.reached(generation, evaluations))
    }

    pub fn summary<'b, I>(&self, generation: usize, individuals: I) -> Result<GenerationSummary, GpError>
    where
        I: IntoIterator<Item = &'b Ind<Pr>>,
        Pr::Primitive: 'b,
    {
        let evaluations = self.evaluator.evaluations()?;
        let best = self.evaluator.best_fitness()?.unwrap_or(f64::NEG_INFINITY);
        Ok(GenerationSummary::from_population(
            generation,
            evaluations,
            best,
            individuals,
        ))
    }

    /// Logs a progress line every `progress_interval` generations.
    pub fn log_progress(&self, summary: &GenerationSummary) {
        let interval = self.config.progress_interval;
        if interval > 0 && summary.generation % interval == 0 {
            info!(
                "generation {}: best {:.4}, avg {:.4}, avg size {:.1}, evaluations {}",
                summary.generation,
                summary.best_fitness,
                summary.avg_fitness,
                summary.avg_size,
                summary.evaluations
            );
        }
    }

    /// Packages the run's outcome.
    pub fn result(
        &self,
        generation: usize,
        fitness_history: &[f64],
    ) -> Result<GpResult<Pr::Primitive>, GpError> {
        let state = self.evaluator.state()?;
        let best = state.best.ok_or(GpError::NoEvaluations)?;
        Ok(GpResult {
            best_fitness: best.fitness(),
            best,
            generations: generation + 1,
            evaluations: state.evaluations,
            found_optimal: state.found_optimal,
            last_improvement_generation: state.last_improvement_generation,
            fitness_history: fitness_history.to_vec(),
        })
    }
}

/// Deep copies of the `n` fittest individuals, best first.
pub(crate) fn elites<P: crate::tree::Primitive>(
    individuals: &[Individual<P>],
    n: usize,
) -> Vec<Individual<P>> {
    if n == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<&Individual<P>> = individuals.iter().collect();
    ranked.sort_by(|a, b| b.cmp_fitness(a));
    ranked.into_iter().take(n).map(Individual::deep_copy).collect()
}
