//! Engine lifecycle and the engine registry.
//!
//! Every survivor strategy implements [`Engine`]: `initialize` builds and
//! scores the first population, `step` runs one generation, and `evolve`
//! loops until the termination criterion holds. [`EngineKind`] selects a
//! strategy by name and [`run`] drives it end to end.

use crate::alps::{LayeredConfig, LayeredGp};
use crate::error::GpError;
use crate::gp::{GenerationalGp, GpConfig, GpResult, Problem, Statistics};
use crate::pareto::{ParetoConfig, ParetoGp};
use crate::tree::Primitive;
use log::info;
use std::str::FromStr;

/// A generation-stepping GP engine.
pub trait Engine<P: Primitive> {
    fn name(&self) -> &'static str;

    /// Builds and evaluates the initial population (generation 0).
    fn initialize(&mut self, stats: &mut dyn Statistics<P>) -> Result<(), GpError>;

    /// Runs one generation.
    fn step(&mut self, stats: &mut dyn Statistics<P>) -> Result<(), GpError>;

    /// Whether the termination criterion holds.
    fn is_done(&self) -> Result<bool, GpError>;

    /// Current generation, 0 for the initial population.
    fn generation(&self) -> usize;

    /// Outcome so far.
    fn result(&self) -> Result<GpResult<P>, GpError>;

    /// Initializes, steps until done, and reports the result.
    fn evolve(&mut self, stats: &mut dyn Statistics<P>) -> Result<GpResult<P>, GpError> {
        self.initialize(stats)?;
        while !self.is_done()? {
            self.step(stats)?;
        }
        let result = self.result()?;
        info!(
            "{} run finished after {} generations, {} evaluations: best {:.4} {}",
            self.name(),
            result.generations,
            result.evaluations,
            result.best_fitness,
            result.best
        );
        stats.post_evolution(&result);
        Ok(result)
    }
}

/// Survivor strategy with its own settings.
///
/// # Examples
///
/// ```
/// use u_gp::EngineKind;
///
/// let kind: EngineKind = "alps".parse().unwrap();
/// assert_eq!(kind.name(), "layered");
/// assert!("steady-state".parse::<EngineKind>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineKind {
    /// Whole-population replacement with elitism.
    #[default]
    Generational,
    /// Age-layered population structure (ALPS).
    Layered(LayeredConfig),
    /// Multi-objective age/fitness/diversity Pareto survival.
    Pareto(ParetoConfig),
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Generational => "generational",
            EngineKind::Layered(_) => "layered",
            EngineKind::Pareto(_) => "pareto",
        }
    }

    /// Validates the strategy's own settings against `config`.
    pub fn validate(&self, config: &GpConfig) -> Result<(), GpError> {
        config.validate()?;
        match self {
            EngineKind::Generational => Ok(()),
            EngineKind::Layered(layered) => layered.validate(config),
            EngineKind::Pareto(pareto) => pareto.validate(config),
        }
    }
}

impl FromStr for EngineKind {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generational" | "gp" | "simple" => Ok(EngineKind::Generational),
            "layered" | "alps" => Ok(EngineKind::Layered(LayeredConfig::default())),
            "pareto" | "age-fitness" | "afpo" => Ok(EngineKind::Pareto(ParetoConfig::default())),
            _ => Err(GpError::UnknownStrategy {
                kind: "engine",
                name: s.to_string(),
            }),
        }
    }
}

/// Initializes `problem`, then runs the selected engine to completion.
pub fn run<Pr: Problem>(
    problem: &mut Pr,
    config: &GpConfig,
    kind: &EngineKind,
    stats: &mut dyn Statistics<Pr::Primitive>,
) -> Result<GpResult<Pr::Primitive>, GpError> {
    kind.validate(config)?;
    problem.init(config)?;
    let problem = &*problem;
    match kind {
        EngineKind::Generational => GenerationalGp::new(problem, config)?.evolve(stats),
        EngineKind::Layered(layered) => LayeredGp::new(problem, config, layered)?.evolve(stats),
        EngineKind::Pareto(pareto) => ParetoGp::new(problem, config, pareto)?.evolve(stats),
    }
}
