//! Layered engine configuration.

use crate::error::GpError;
use crate::gp::GpConfig;

/// Settings of the age-layered population structure.
///
/// The population size of [`GpConfig`] is split evenly: each layer holds
/// `population_size / num_layers` individuals.
///
/// ```
/// use u_gp::alps::LayeredConfig;
/// use u_gp::gp::GpConfig;
///
/// let layered = LayeredConfig::default().with_num_layers(5).with_age_gap(20);
/// let config = GpConfig::default().with_population_size(500);
/// assert_eq!(layered.layer_capacity(&config), 100);
/// assert!(layered.validate(&config).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayeredConfig {
    /// Maximum number of layers.
    pub num_layers: usize,

    /// Generations between layer additions and bottom-layer regenerations.
    /// Also the unit of the layer age ceilings.
    pub age_gap: usize,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            num_layers: 10,
            age_gap: 10,
        }
    }
}

impl LayeredConfig {
    pub fn with_num_layers(mut self, n: usize) -> Self {
        self.num_layers = n;
        self
    }

    pub fn with_age_gap(mut self, gap: usize) -> Self {
        self.age_gap = gap;
        self
    }

    /// Individuals per layer.
    pub fn layer_capacity(&self, config: &GpConfig) -> usize {
        config.population_size / self.num_layers.max(1)
    }

    /// Validates the layering against the shared configuration.
    pub fn validate(&self, config: &GpConfig) -> Result<(), GpError> {
        if self.num_layers == 0 {
            return Err(GpError::InvalidConfig("num_layers must be at least 1".into()));
        }
        if self.age_gap == 0 {
            return Err(GpError::InvalidConfig("age_gap must be at least 1".into()));
        }
        let capacity = self.layer_capacity(config);
        if capacity == 0 {
            return Err(GpError::InvalidConfig(format!(
                "population_size {} too small for {} layers",
                config.population_size, self.num_layers
            )));
        }
        if config.elite_count >= capacity {
            return Err(GpError::InvalidConfig(format!(
                "elite_count {} must be below the layer capacity {capacity}",
                config.elite_count
            )));
        }
        Ok(())
    }
}
