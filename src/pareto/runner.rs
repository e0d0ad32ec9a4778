//! Age/density/fitness Pareto engine.
//!
//! Each generation breeds `population_size - 1` offspring by random
//! mating, merges them into the population and trims the merged set back
//! by Pareto tournament deletion. One fresh random individual enters per
//! generation: before evaluation under age/fitness, after trimming under
//! the density objectives.

use super::config::{Objectives, ParetoConfig};
use super::diversity::DiversityTracker;
use super::dominance::{trim, Dominance};
use crate::engine::Engine;
use crate::error::GpError;
use crate::gp::breeder::Breeder;
use crate::gp::{GpConfig, GpResult, Individual, Problem, Selection, Statistics};
use crate::tree::BuildMethod;
use log::{debug, info};
use std::collections::HashSet;

const DEFAULT_TRIM_TOURNAMENT: usize = 7;
const SHALLOW_TAG_RETRIES: usize = 100;

/// Multi-objective survivor selection over age, tag density and fitness.
///
/// # Usage
///
/// ```ignore
/// let pareto = ParetoConfig::default().with_objectives(Objectives::AgeFitness);
/// let mut engine = ParetoGp::new(&problem, &config, &pareto)?;
/// let result = engine.evolve(&mut NoStatistics)?;
/// ```
pub struct ParetoGp<'a, Pr: Problem> {
    breeder: Breeder<'a, Pr>,
    settings: ParetoConfig,
    tracker: DiversityTracker,
    population: Vec<Individual<Pr::Primitive>>,
    generation: usize,
    // alternates grow and full for injected individuals
    next_method: BuildMethod,
    fitness_history: Vec<f64>,
}

impl<'a, Pr: Problem> ParetoGp<'a, Pr> {
    pub fn new(problem: &'a Pr, config: &'a GpConfig, pareto: &ParetoConfig) -> Result<Self, GpError> {
        pareto.validate(config)?;
        Ok(Self {
            breeder: Breeder::new(problem, config, "pareto")?,
            settings: pareto.clone(),
            tracker: DiversityTracker::new(pareto.tag_level, pareto.tag_depth),
            population: Vec::new(),
            generation: 0,
            next_method: BuildMethod::Grow,
            fitness_history: Vec::new(),
        })
    }

    pub fn population(&self) -> &[Individual<Pr::Primitive>] {
        &self.population
    }

    pub fn tracker(&self) -> &DiversityTracker {
        &self.tracker
    }

    fn record(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        let summary = self.breeder.summary(self.generation, &self.population)?;
        self.fitness_history.push(summary.best_fitness);
        stats.post_evaluation(&summary);
        stats.post_generation(&summary);
        self.breeder.log_progress(&summary);
        Ok(())
    }

    fn trim_tournament(&self) -> usize {
        match self.breeder.config.selection {
            Selection::Tournament(k) => k,
            Selection::RandomMating => DEFAULT_TRIM_TOURNAMENT,
        }
    }

    /// A tagged, stamped random individual; grow and full alternate.
    fn random_tagged(&mut self) -> Result<Individual<Pr::Primitive>, GpError> {
        let method = self.next_method;
        self.next_method = match method {
            BuildMethod::Grow => BuildMethod::Full,
            BuildMethod::Full => BuildMethod::Grow,
        };
        let mut individual = self.breeder.random_individual(method)?;
        self.tracker.tag_individual(&mut individual);
        self.breeder.stamp(&mut individual, self.generation);
        Ok(individual)
    }

    /// A random individual whose tag was never seen at the current level,
    /// or the last draw once the retry budget runs out.
    fn unique_random(&mut self) -> Result<Individual<Pr::Primitive>, GpError> {
        self.tracker.collect(&self.population);
        let max_tries = if self.tracker.depth() > 1 {
            self.breeder.config.max_unique_retries.max(1)
        } else {
            SHALLOW_TAG_RETRIES
        };

        let mut tries = 1;
        let mut individual = self.random_tagged()?;
        while tries < max_tries && !self.tracker.is_unique(individual.tag().unwrap_or_default()) {
            individual = self.random_tagged()?;
            tries += 1;
        }
        if let Some(t) = individual.tag() {
            let t = t.to_string();
            self.tracker.add_tag(t);
        }
        if self.generation % 100 == 0 {
            debug!(
                "generation {}: {tries} draws for a unique tag, {} tags seen",
                self.generation,
                self.tracker.num_tags()
            );
        }
        Ok(individual)
    }

    /// Slides the tag window on schedule and retags the population.
    fn update_tag_level(&mut self) {
        let gens = self.settings.tag_level_change_gens;
        if !self.settings.change_tag_level
            || gens == 0
            || self.generation == 0
            || (self.generation + 1) % gens != 0
        {
            return;
        }
        let level = self.tracker.level();
        let max_depth = self.breeder.config.max_depth;
        if level + 1 < max_depth {
            self.tracker.set_level(level + 1);
        } else if self.settings.cycle_tag_levels {
            self.tracker.set_level(0);
        } else {
            return;
        }
        self.tracker.tag_all(&mut self.population);
        debug!(
            "generation {}: tag level {level} -> {}",
            self.generation,
            self.tracker.level()
        );
    }
}

impl<Pr: Problem> Engine<Pr::Primitive> for ParetoGp<'_, Pr> {
    fn name(&self) -> &'static str {
        "pareto"
    }

    fn initialize(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        self.generation = 0;
        self.fitness_history.clear();
        let size = self.breeder.config.population_size;
        let mut population = self.breeder.ramped(size, 0, &mut HashSet::new())?;
        for individual in population.iter_mut() {
            individual.set_age(1);
        }
        self.tracker.tag_all(&mut population);
        self.tracker.collect(&population);
        self.breeder.evaluate(&mut population, 0)?;
        self.population = population;
        info!("pareto objectives {}", self.settings.objectives);
        self.record(stats)
    }

    fn step(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        stats.pre_generation(self.generation + 1);
        self.generation += 1;
        let config = self.breeder.config;
        let objectives = self.settings.objectives;

        let pool: Vec<&Individual<Pr::Primitive>> = self.population.iter().collect();
        let (mut offspring, _) = self.breeder.fill(
            &pool,
            &Selection::RandomMating,
            config.population_size - 1,
            self.generation,
        )?;
        self.tracker.tag_all(&mut offspring);
        if objectives == Objectives::AgeFitness {
            offspring.push(self.random_tagged()?);
        }
        self.breeder.evaluate(&mut offspring, self.generation)?;
        self.population.extend(offspring);

        let dominance = Dominance::new(objectives, &self.population, self.settings.size_breaks_ties);
        let target = self.settings.target_size(config);
        let tournament = self.trim_tournament();
        trim(
            &mut self.population,
            &dominance,
            target,
            tournament,
            &mut self.breeder.rng,
        );
        for individual in self.population.iter_mut() {
            individual.increment_age();
        }

        if objectives.uses_density() {
            let mut fresh = if self.settings.unique_tag_random {
                self.unique_random()?
            } else {
                self.random_tagged()?
            };
            self.breeder
                .evaluate(std::slice::from_mut(&mut fresh), self.generation)?;
            self.population.push(fresh);
        }

        self.update_tag_level();
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
