//! GP configuration.
//!
//! [`GpConfig`] holds the parameters shared by every engine. Engine-specific
//! settings live in [`LayeredConfig`](crate::alps::LayeredConfig) and
//! [`ParetoConfig`](crate::pareto::ParetoConfig).

use super::selection::Selection;
use crate::error::GpError;

/// When a run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Run this many generations, counting the initial population as
    /// generation 0.
    Generations(usize),
    /// Stop once this many individuals have been evaluated.
    Evaluations(u64),
}

impl Termination {
    /// Whether a run at `generation` with `evaluations` done should stop.
    pub fn reached(&self, generation: usize, evaluations: u64) -> bool {
        match *self {
            Termination::Generations(n) => generation + 1 >= n,
            Termination::Evaluations(n) => evaluations >= n,
        }
    }
}

/// Configuration for a GP run.
///
/// # Defaults
///
/// ```
/// use u_gp::gp::{GpConfig, Termination};
///
/// let config = GpConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.termination, Termination::Generations(50));
/// assert_eq!(config.max_depth, 17);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_gp::gp::{GpConfig, Selection};
///
/// let config = GpConfig::default()
///     .with_population_size(500)
///     .with_selection(Selection::Tournament(4))
///     .with_mutation_probability(0.1)
///     .with_num_threads(4)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpConfig {
    /// Number of individuals. For the layered engine, the total across
    /// all layers.
    pub population_size: usize,

    /// Stopping criterion.
    pub termination: Termination,

    /// Stop as soon as an individual reaches the problem's optimal fitness.
    pub stop_on_optimal: bool,

    /// Parent selection strategy. The Pareto engine always mates at random.
    pub selection: Selection,

    /// Probability that an offspring event is a crossover rather than a
    /// replication.
    pub crossover_probability: f64,

    /// Probability that a crossover point is a function node rather than a
    /// terminal.
    pub function_bias: f64,

    /// Probability that an offspring is mutated.
    pub mutation_probability: f64,

    /// Per-node probability of a point mutation, once an offspring is picked
    /// for mutation.
    pub node_mutation_probability: f64,

    /// Maximum tree depth (edges) a crossover may produce.
    pub max_depth: usize,

    /// Maximum node count a crossover may produce.
    pub max_size: usize,

    /// Lower bound on the depth of randomly built trees.
    pub min_build_depth: usize,

    /// Upper bound on the depth of randomly built trees.
    pub max_build_depth: usize,

    /// Attempts to find crossover points acceptable to both children before
    /// falling back to copies.
    pub max_crossover_attempts: usize,

    /// Retries allowed per initialisation when rejecting duplicate genomes.
    pub max_unique_retries: usize,

    /// Keep only the first child of each crossover.
    pub discard_second_child: bool,

    /// Best individuals copied unchanged into the next generation (per layer
    /// for the layered engine).
    pub elite_count: usize,

    /// Evaluation worker threads.
    pub num_threads: usize,

    /// Random seed for reproducibility. `None` draws one and logs it.
    pub seed: Option<u64>,

    /// Generations between progress log lines.
    pub progress_interval: usize,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            termination: Termination::Generations(50),
            stop_on_optimal: true,
            selection: Selection::default(),
            crossover_probability: 1.0,
            function_bias: 0.9,
            mutation_probability: 0.05,
            node_mutation_probability: 0.05,
            max_depth: 17,
            max_size: 300,
            min_build_depth: 0,
            max_build_depth: 5,
            max_crossover_attempts: 2,
            max_unique_retries: 50,
            discard_second_child: false,
            elite_count: 0,
            num_threads: 2,
            seed: None,
            progress_interval: 100,
        }
    }
}

impl GpConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Runs for `n` generations (the initial population included).
    pub fn with_generations(mut self, n: usize) -> Self {
        self.termination = Termination::Generations(n);
        self
    }

    /// Runs until `n` evaluations have been spent.
    pub fn with_evaluations(mut self, n: u64) -> Self {
        self.termination = Termination::Evaluations(n);
        self
    }

    pub fn with_stop_on_optimal(mut self, stop: bool) -> Self {
        self.stop_on_optimal = stop;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Convenience for `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_function_bias(mut self, p: f64) -> Self {
        self.function_bias = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_node_mutation_probability(mut self, p: f64) -> Self {
        self.node_mutation_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover depth and size bounds.
    pub fn with_bounds(mut self, max_depth: usize, max_size: usize) -> Self {
        self.max_depth = max_depth;
        self.max_size = max_size;
        self
    }

    /// Sets the depth range for random trees.
    pub fn with_build_depth(mut self, min: usize, max: usize) -> Self {
        self.min_build_depth = min;
        self.max_build_depth = max;
        self
    }

    pub fn with_max_crossover_attempts(mut self, n: usize) -> Self {
        self.max_crossover_attempts = n;
        self
    }

    pub fn with_max_unique_retries(mut self, n: usize) -> Self {
        self.max_unique_retries = n;
        self
    }

    pub fn with_discard_second_child(mut self, discard: bool) -> Self {
        self.discard_second_child = discard;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress_interval(mut self, n: usize) -> Self {
        self.progress_interval = n;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns [`GpError::InvalidConfig`] naming the first offending
    /// parameter.
    pub fn validate(&self) -> Result<(), GpError> {
        let invalid = |msg: &str| Err(GpError::InvalidConfig(msg.into()));

        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        match self.termination {
            Termination::Generations(0) => return invalid("generations must be at least 1"),
            Termination::Evaluations(0) => return invalid("evaluations must be at least 1"),
            _ => {}
        }
        if self.elite_count >= self.population_size {
            return invalid("elite_count must be below population_size");
        }
        if let Selection::Tournament(0) = self.selection {
            return invalid("tournament size must be at least 1");
        }
        for (name, p) in [
            ("crossover_probability", self.crossover_probability),
            ("function_bias", self.function_bias),
            ("mutation_probability", self.mutation_probability),
            ("node_mutation_probability", self.node_mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GpError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        if self.max_size == 0 {
            return invalid("max_size must be at least 1");
        }
        if self.min_build_depth > self.max_build_depth {
            return invalid("min_build_depth must not exceed max_build_depth");
        }
        if self.max_build_depth > self.max_depth {
            return invalid("max_build_depth must not exceed max_depth");
        }
        if self.num_threads == 0 {
            return invalid("num_threads must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GpConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.termination, Termination::Generations(50));
        assert!(config.stop_on_optimal);
        assert_eq!(config.selection, Selection::Tournament(7));
        assert!((config.crossover_probability - 1.0).abs() < 1e-10);
        assert!((config.function_bias - 0.9).abs() < 1e-10);
        assert!((config.mutation_probability - 0.05).abs() < 1e-10);
        assert_eq!(config.max_depth, 17);
        assert_eq!(config.max_size, 300);
        assert_eq!(config.max_build_depth, 5);
        assert_eq!(config.max_crossover_attempts, 2);
        assert_eq!(config.max_unique_retries, 50);
        assert_eq!(config.elite_count, 0);
        assert_eq!(config.num_threads, 2);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GpConfig::default()
            .with_population_size(64)
            .with_evaluations(10_000)
            .with_tournament_size(3)
            .with_crossover_probability(0.8)
            .with_bounds(10, 100)
            .with_build_depth(2, 4)
            .with_elite_count(2)
            .with_discard_second_child(true)
            .with_seed(9);

        assert_eq!(config.population_size, 64);
        assert_eq!(config.termination, Termination::Evaluations(10_000));
        assert_eq!(config.selection, Selection::Tournament(3));
        assert_eq!((config.max_depth, config.max_size), (10, 100));
        assert_eq!((config.min_build_depth, config.max_build_depth), (2, 4));
        assert!(config.discard_second_child);
        assert_eq!(config.seed, Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_probabilities() {
        let config = GpConfig::default()
            .with_crossover_probability(1.5)
            .with_mutation_probability(-0.2)
            .with_function_bias(3.0);
        assert!((config.crossover_probability - 1.0).abs() < 1e-10);
        assert!(config.mutation_probability.abs() < 1e-10);
        assert!((config.function_bias - 1.0).abs() < 1e-10);
    }

    // ---- Validation ----

    #[test]
    fn test_validate_default_ok() {
        assert!(GpConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            GpConfig::default().with_population_size(1),
            GpConfig::default().with_generations(0),
            GpConfig::default().with_evaluations(0),
            GpConfig::default().with_population_size(10).with_elite_count(10),
            GpConfig::default().with_tournament_size(0),
            GpConfig::default().with_build_depth(4, 2),
            GpConfig::default().with_bounds(3, 300),
            GpConfig::default().with_num_threads(0),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(GpError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_unclamped_field_rejected() {
        let config = GpConfig {
            node_mutation_probability: 1.5,
            ..GpConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("node_mutation_probability"));
    }

    // ---- Termination ----

    #[test]
    fn test_termination_generations() {
        let t = Termination::Generations(3);
        assert!(!t.reached(0, 0));
        assert!(!t.reached(1, 0));
        assert!(t.reached(2, 0));
    }

    #[test]
    fn test_termination_evaluations() {
        let t = Termination::Evaluations(100);
        assert!(!t.reached(40, 99));
        assert!(t.reached(0, 100));
    }
}
