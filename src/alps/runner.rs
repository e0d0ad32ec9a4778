//! Age-layered evolutionary loop.
//!
//! [`LayeredGp`] keeps the population in layers of increasing age
//! tolerance. Each generation:
//!
//! 1. every layer is bred from itself and the layer below, elites kept,
//! 2. offspring are evaluated,
//! 3. layers are stamped, a new layer may open, individuals that outgrew
//!    their layer move up (displacing weaker or outgrown occupants), and
//!    the bottom layer is rebuilt on schedule.

use super::config::LayeredConfig;
use super::scheme::{AlpsScheme, LayerScheme};
use crate::engine::Engine;
use crate::error::GpError;
use crate::gp::breeder::{elites, Breeder};
use crate::gp::{GpConfig, GpResult, Individual, IndividualId, Problem, Statistics};
use log::debug;
use std::collections::HashSet;

type Layer<Pr> = Vec<Individual<<Pr as Problem>::Primitive>>;

/// Age-layered population structure (ALPS).
///
/// # Usage
///
/// ```ignore
/// let layered = LayeredConfig::default().with_num_layers(5).with_age_gap(10);
/// let mut engine = LayeredGp::new(&problem, &config, &layered)?;
/// let result = engine.evolve(&mut NoStatistics)?;
/// ```
pub struct LayeredGp<'a, Pr: Problem, S: LayerScheme = AlpsScheme> {
    breeder: Breeder<'a, Pr>,
    scheme: S,
    num_layers: usize,
    capacity: usize,
    layers: Vec<Layer<Pr>>,
    generation: usize,
    last_layer_add: usize,
    last_regen: usize,
    added_layer: bool,
    // Genomes ever generated from scratch in this run.
    seen: HashSet<String>,
    fitness_history: Vec<f64>,
}

impl<'a, Pr: Problem> LayeredGp<'a, Pr, AlpsScheme> {
    /// Creates the engine with the standard ALPS age policy.
    pub fn new(problem: &'a Pr, config: &'a GpConfig, layered: &LayeredConfig) -> Result<Self, GpError> {
        Self::with_scheme(problem, config, layered, AlpsScheme::new(layered.age_gap))
    }
}

impl<'a, Pr: Problem, S: LayerScheme> LayeredGp<'a, Pr, S> {
    /// Creates the engine with a custom age policy.
    pub fn with_scheme(
        problem: &'a Pr,
        config: &'a GpConfig,
        layered: &LayeredConfig,
        scheme: S,
    ) -> Result<Self, GpError> {
        layered.validate(config)?;
        Ok(Self {
            breeder: Breeder::new(problem, config, "layered")?,
            scheme,
            num_layers: layered.num_layers,
            capacity: layered.layer_capacity(config),
            layers: Vec::new(),
            generation: 0,
            last_layer_add: 0,
            last_regen: 0,
            added_layer: false,
            seen: HashSet::new(),
            fitness_history: Vec::new(),
        })
    }

    /// Current layers, youngest first.
    pub fn layers(&self) -> &[Layer<Pr>] {
        &self.layers
    }

    /// Individuals per layer.
    pub fn layer_capacity(&self) -> usize {
        self.capacity
    }

    fn stamp_layers(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            for individual in layer.iter_mut() {
                individual.set_layer(i);
            }
        }
    }

    fn record(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        let summary = self
            .breeder
            .summary(self.generation, self.layers.iter().flatten())?;
        self.fitness_history.push(summary.best_fitness);
        stats.post_evaluation(&summary);
        stats.post_generation(&summary);
        self.breeder.log_progress(&summary);
        Ok(())
    }

    fn evaluate_layers(&mut self) -> Result<(), GpError> {
        for layer in self.layers.iter_mut() {
            self.breeder.evaluate(layer, self.generation)?;
        }
        Ok(())
    }

    /// Breeds every layer from itself and the layer below.
    fn breed(&mut self) -> Result<(), GpError> {
        let config = self.breeder.config;
        let elite_count = config.elite_count;
        let top = self.layers.len();
        let mut parents: HashSet<IndividualId> = HashSet::new();
        let mut next: Vec<Layer<Pr>> = Vec::with_capacity(top);

        for i in 0..top {
            let current = &self.layers[i];
            // a layer opened last update is not bred again straight away
            if self.added_layer && i + 1 == top && current.len() == self.capacity {
                next.push(current.clone());
                continue;
            }

            let mut pool: Vec<&Individual<Pr::Primitive>> = Vec::new();
            if i > 0 {
                pool.extend(self.layers[i - 1].iter());
            }
            pool.extend(current.iter());
            if pool.is_empty() {
                next.push(Vec::new());
                continue;
            }

            let fill = if current.len() < elite_count {
                self.capacity - current.len()
            } else {
                self.capacity - elite_count
            };
            let (mut layer, picked) =
                self.breeder
                    .fill(&pool, &config.selection, fill, self.generation)?;
            parents.extend(picked.iter().filter_map(|&p| pool[p].id()));
            for child in layer.iter_mut() {
                child.increment_age();
            }

            for mut elite in elites(current, elite_count) {
                let was_parent = elite.id().is_some_and(|id| parents.contains(&id));
                elite.set_age(self.scheme.elite_age(elite.age(), was_parent));
                layer.push(elite);
            }
            next.push(layer);
        }

        self.layers = next;
        self.added_layer = false;
        Ok(())
    }

    /// Runs the per-generation layer maintenance.
    fn update_layers(&mut self) -> Result<(), GpError> {
        self.stamp_layers();

        if self.scheme.should_add_layer(
            self.generation,
            self.last_layer_add,
            self.layers.len(),
            self.num_layers,
        ) {
            self.add_layer()?;
        }

        self.move_up_all();

        let bottom_len = self.layers.first().map_or(0, Vec::len);
        if self
            .scheme
            .should_regenerate(self.generation, self.last_regen, bottom_len)
        {
            self.regenerate_bottom()?;
        }
        Ok(())
    }

    /// Opens a new top layer bred from the current top layer.
    fn add_layer(&mut self) -> Result<(), GpError> {
        let config = self.breeder.config;
        let index = self.layers.len();
        let Some(top) = self.layers.last().filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        let pool: Vec<&Individual<Pr::Primitive>> = top.iter().collect();
        let (mut layer, _) =
            self.breeder
                .fill(&pool, &config.selection, self.capacity, self.generation)?;
        for child in layer.iter_mut() {
            child.increment_age();
            child.set_layer(index);
        }
        self.breeder.evaluate(&mut layer, self.generation)?;

        self.layers.push(layer);
        self.last_layer_add = self.generation;
        self.added_layer = true;
        debug!(
            "generation {}: opened layer {index} of {}",
            self.generation, self.num_layers
        );
        Ok(())
    }

    /// Moves every individual that outgrew its layer, bottom layer first.
    fn move_up_all(&mut self) {
        let limit = self.layers.len().min(self.num_layers.saturating_sub(1));
        for i in 0..limit {
            let mut j = 0;
            while j < self.layers[i].len() {
                if !self
                    .scheme
                    .should_move_up(&self.layers[i][j], i, self.num_layers)
                {
                    j += 1;
                    continue;
                }
                let individual = self.layers[i].remove(j);
                if i + 1 < self.layers.len() {
                    self.move_up(individual, i + 1);
                }
            }
        }
    }

    /// Places `individual` into layer `target`, displacing if it is full.
    /// Returns `false` if the individual was dropped.
    fn move_up(&mut self, individual: Individual<Pr::Primitive>, target: usize) -> bool {
        if self.layers[target].len() < self.capacity {
            self.layers[target].push(individual);
            return true;
        }
        self.displace(individual, target)
    }

    fn displace(&mut self, individual: Individual<Pr::Primitive>, target: usize) -> bool {
        for k in 0..self.layers[target].len() {
            let occupant = &self.layers[target][k];
            // occupants that arrived from the same layer this update are safe
            if occupant.layer() == individual.layer() {
                continue;
            }
            let outgrown = self
                .scheme
                .should_move_up(occupant, target, self.num_layers);
            if individual.fitness() > occupant.fitness() || outgrown {
                let occupant = self.layers[target].remove(k);
                if outgrown && target + 1 < self.layers.len() {
                    self.move_up(occupant, target + 1);
                }
                self.layers[target].push(individual);
                return true;
            }
        }
        false
    }

    /// Rebuilds the bottom layer with fresh random individuals.
    fn regenerate_bottom(&mut self) -> Result<(), GpError> {
        let mut bottom = self
            .breeder
            .ramped(self.capacity, self.generation, &mut self.seen)?;
        self.breeder.evaluate(&mut bottom, self.generation)?;
        for individual in bottom.iter_mut() {
            individual.set_layer(0);
        }
        match self.layers.first_mut() {
            Some(first) => *first = bottom,
            None => self.layers.push(bottom),
        }
        self.last_regen = self.generation;
        debug!("generation {}: regenerated bottom layer", self.generation);
        Ok(())
    }
}

impl<Pr: Problem, S: LayerScheme> Engine<Pr::Primitive> for LayeredGp<'_, Pr, S> {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn initialize(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        self.generation = 0;
        self.last_layer_add = 0;
        self.last_regen = 0;
        self.added_layer = false;
        self.fitness_history.clear();

        let mut bottom = self.breeder.ramped(self.capacity, 0, &mut self.seen)?;
        self.breeder.evaluate(&mut bottom, 0)?;
        self.layers = vec![bottom];
        self.update_layers()?;
        self.record(stats)
    }

    fn step(&mut self, stats: &mut dyn Statistics<Pr::Primitive>) -> Result<(), GpError> {
        stats.pre_generation(self.generation + 1);
        self.generation += 1;
        self.breed()?;
        self.evaluate_layers()?;
        self.update_layers()?;
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

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alps::max_age;
    use crate::gp::{Evaluation, NoStatistics};
    use crate::testing::{ind, TruthTable};

    fn member(text: &str, age: usize, fitness: f64, layer: usize) -> Individual<crate::testing::Bool> {
        let mut i = ind(text);
        i.set_age(age);
        i.set_layer(layer);
        i.record_evaluation(Evaluation::new(fitness));
        i
    }

    fn small_engine<'a>(
        problem: &'a TruthTable,
        config: &'a GpConfig,
    ) -> LayeredGp<'a, TruthTable> {
        // capacity 2, ceilings: layer 0 → 1, layer 1 → 2, layer 2 unbounded
        let layered = LayeredConfig::default().with_num_layers(3).with_age_gap(1);
        LayeredGp::new(problem, config, &layered).unwrap()
    }

    fn texts(layer: &[Individual<crate::testing::Bool>]) -> Vec<String> {
        layer.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_move_up_displaces_weaker() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default().with_population_size(6).with_seed(1);
        let mut engine = small_engine(&problem, &config);
        engine.layers = vec![
            vec![member("D0", 2, 0.9, 0)],
            vec![member("D1", 0, 0.5, 1), member("D2", 0, 0.95, 1)],
            vec![],
        ];
        engine.move_up_all();
        assert!(engine.layers[0].is_empty());
        assert_eq!(texts(&engine.layers[1]), ["D2", "D0"]);
        assert!(engine.layers[2].is_empty());
    }

    #[test]
    fn test_move_up_fails_when_weaker() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default().with_population_size(6).with_seed(1);
        let mut engine = small_engine(&problem, &config);
        engine.layers = vec![
            vec![member("D0", 2, 0.1, 0)],
            vec![member("D1", 0, 0.5, 1), member("D2", 0, 0.95, 1)],
            vec![],
        ];
        engine.move_up_all();
        assert!(engine.layers[0].is_empty());
        assert_eq!(texts(&engine.layers[1]), ["D1", "D2"]);
    }

    #[test]
    fn test_outgrown_occupant_is_pushed_up() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default().with_population_size(6).with_seed(1);
        let mut engine = small_engine(&problem, &config);
        engine.layers = vec![
            vec![member("D0", 2, 0.1, 0)],
            vec![member("D1", 3, 0.99, 1), member("D2", 0, 0.95, 1)],
            vec![],
        ];
        engine.move_up_all();
        assert_eq!(texts(&engine.layers[1]), ["D2", "D0"]);
        assert_eq!(texts(&engine.layers[2]), ["D1"]);
    }

    #[test]
    fn test_same_origin_not_displaced() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default().with_population_size(6).with_seed(1);
        let mut engine = small_engine(&problem, &config);
        // both movers come from layer 0; the second cannot evict the first
        engine.layers = vec![
            vec![member("D0", 2, 0.2, 0), member("D1", 2, 0.9, 0)],
            vec![member("D2", 0, 0.95, 1)],
            vec![],
        ];
        engine.move_up_all();
        assert_eq!(texts(&engine.layers[1]), ["D2", "D0"]);
    }

    #[test]
    fn test_top_existing_layer_drops_outgrown() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default().with_population_size(6).with_seed(1);
        let mut engine = small_engine(&problem, &config);
        engine.layers = vec![vec![member("D0", 5, 0.9, 0), member("D1", 0, 0.5, 0)]];
        engine.move_up_all();
        assert_eq!(texts(&engine.layers[0]), ["D1"]);
    }

    #[test]
    fn test_layers_open_on_schedule() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default()
            .with_population_size(40)
            .with_generations(12)
            .with_stop_on_optimal(false)
            .with_build_depth(1, 3)
            .with_seed(3);
        let layered = LayeredConfig::default().with_num_layers(4).with_age_gap(3);
        let mut engine = LayeredGp::new(&problem, &config, &layered).unwrap();
        engine.initialize(&mut NoStatistics).unwrap();
        assert_eq!(engine.layers().len(), 1);

        let mut counts = Vec::new();
        while !engine.is_done().unwrap() {
            engine.step(&mut NoStatistics).unwrap();
            counts.push(engine.layers().len());
        }
        // opened at generations 3, 6 and 9
        assert_eq!(counts[1], 1);
        assert_eq!(counts[2], 2);
        assert_eq!(counts[5], 3);
        assert_eq!(*counts.last().unwrap(), 4);
    }

    #[test]
    fn test_invariants_hold_every_generation() {
        let problem = TruthTable::parity3();
        let config = GpConfig::default()
            .with_population_size(40)
            .with_generations(25)
            .with_stop_on_optimal(false)
            .with_elite_count(1)
            .with_build_depth(1, 3)
            .with_seed(11);
        let layered = LayeredConfig::default().with_num_layers(4).with_age_gap(2);
        let mut engine = LayeredGp::new(&problem, &config, &layered).unwrap();
        engine.initialize(&mut NoStatistics).unwrap();
        while !engine.is_done().unwrap() {
            engine.step(&mut NoStatistics).unwrap();
            for (i, layer) in engine.layers().iter().enumerate() {
                assert!(layer.len() <= engine.layer_capacity());
                if let Some(max) = max_age(i, 2, 4) {
                    assert!(layer.iter().all(|ind| ind.age() <= max), "layer {i}");
                }
                assert!(layer.iter().all(Individual::is_evaluated));
            }
            assert!(!engine.layers()[0].is_empty());
        }
    }

    #[test]
    fn test_solves_and() {
        let problem = TruthTable::and2();
        let config = GpConfig::default()
            .with_population_size(40)
            .with_generations(20)
            .with_build_depth(1, 3)
            .with_seed(5);
        let layered = LayeredConfig::default().with_num_layers(4).with_age_gap(3);
        let result = LayeredGp::new(&problem, &config, &layered)
            .unwrap()
            .evolve(&mut NoStatistics)
            .unwrap();
        assert!(result.found_optimal);
    }
}
