//! Pareto engine configuration.

use crate::error::GpError;
use crate::gp::GpConfig;
use std::fmt;
use std::str::FromStr;

/// Active objective set.
///
/// Age and density are minimised, fitness is maximised.
///
/// # Examples
///
/// ```
/// use u_gp::pareto::Objectives;
///
/// let o: Objectives = "AGE_FITNESS".parse().unwrap();
/// assert_eq!(o, Objectives::AgeFitness);
/// assert_eq!("density-fitness".parse::<Objectives>().unwrap(), Objectives::DensityFitness);
/// assert!(o.uses_age() && !o.uses_density());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objectives {
    AgeFitness,
    AgeDensity,
    #[default]
    DensityFitness,
    AgeDensityFitness,
}

impl Objectives {
    pub fn uses_age(self) -> bool {
        matches!(
            self,
            Objectives::AgeFitness | Objectives::AgeDensity | Objectives::AgeDensityFitness
        )
    }

    pub fn uses_density(self) -> bool {
        !matches!(self, Objectives::AgeFitness)
    }

    pub fn uses_fitness(self) -> bool {
        !matches!(self, Objectives::AgeDensity)
    }

    pub fn name(self) -> &'static str {
        match self {
            Objectives::AgeFitness => "AGE_FITNESS",
            Objectives::AgeDensity => "AGE_DENSITY",
            Objectives::DensityFitness => "DENSITY_FITNESS",
            Objectives::AgeDensityFitness => "AGE_DENSITY_FITNESS",
        }
    }
}

impl fmt::Display for Objectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objectives {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "AGE_FITNESS" => Ok(Objectives::AgeFitness),
            "AGE_DENSITY" => Ok(Objectives::AgeDensity),
            "DENSITY_FITNESS" => Ok(Objectives::DensityFitness),
            "AGE_DENSITY_FITNESS" => Ok(Objectives::AgeDensityFitness),
            _ => Err(GpError::UnknownStrategy {
                kind: "objectives",
                name: s.to_string(),
            }),
        }
    }
}

/// Settings of the age/density/fitness Pareto engine.
///
/// ```
/// use u_gp::pareto::{Objectives, ParetoConfig};
///
/// let pareto = ParetoConfig::default()
///     .with_objectives(Objectives::AgeDensityFitness)
///     .with_tag_window(1, 2)
///     .with_unique_tag_random(true);
/// assert_eq!(pareto.tag_level, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParetoConfig {
    pub objectives: Objectives,

    /// Tree level where the diversity tag window starts.
    pub tag_level: usize,

    /// Levels below `tag_level` included in the tag.
    pub tag_depth: usize,

    /// Slide the tag window down over the run.
    pub change_tag_level: bool,

    /// Wrap the tag window back to the root once it reaches the bottom.
    pub cycle_tag_levels: bool,

    /// Generations between tag level changes.
    pub tag_level_change_gens: usize,

    /// Redraw the injected random individual until its tag is new.
    pub unique_tag_random: bool,

    /// On a full objective tie, the smaller tree wins.
    pub size_breaks_ties: bool,
}

impl Default for ParetoConfig {
    fn default() -> Self {
        Self {
            objectives: Objectives::DensityFitness,
            tag_level: 0,
            tag_depth: 200,
            change_tag_level: false,
            cycle_tag_levels: false,
            tag_level_change_gens: 200,
            unique_tag_random: false,
            size_breaks_ties: true,
        }
    }
}

impl ParetoConfig {
    pub fn with_objectives(mut self, objectives: Objectives) -> Self {
        self.objectives = objectives;
        self
    }

    /// Sets the tag window start level and depth.
    pub fn with_tag_window(mut self, level: usize, depth: usize) -> Self {
        self.tag_level = level;
        self.tag_depth = depth;
        self
    }

    /// Slides the tag window every `gens` generations, optionally wrapping.
    pub fn with_tag_level_schedule(mut self, gens: usize, cycle: bool) -> Self {
        self.change_tag_level = true;
        self.tag_level_change_gens = gens;
        self.cycle_tag_levels = cycle;
        self
    }

    pub fn with_unique_tag_random(mut self, enabled: bool) -> Self {
        self.unique_tag_random = enabled;
        self
    }

    pub fn with_size_breaks_ties(mut self, enabled: bool) -> Self {
        self.size_breaks_ties = enabled;
        self
    }

    /// Population size the trimming step keeps.
    ///
    /// Density objectives leave one slot for the injected individual.
    pub fn target_size(&self, config: &GpConfig) -> usize {
        match self.objectives {
            Objectives::AgeFitness => config.population_size,
            _ => config.population_size - 1,
        }
    }

    pub fn validate(&self, config: &GpConfig) -> Result<(), GpError> {
        if self.change_tag_level && self.tag_level_change_gens == 0 {
            return Err(GpError::InvalidConfig(
                "tag_level_change_gens must be at least 1".into(),
            ));
        }
        if self.tag_level >= config.max_depth.max(1) {
            return Err(GpError::InvalidConfig(format!(
                "tag_level {} must be below max_depth {}",
                self.tag_level, config.max_depth
            )));
        }
        if config.population_size < 3 {
            return Err(GpError::InvalidConfig(
                "pareto engine needs a population of at least 3".into(),
            ));
        }
        Ok(())
    }
}
