//! Layer age policy.
//!
//! A [`LayerScheme`] decides how old an individual may grow in each layer,
//! when a new layer opens and when the bottom layer is refreshed.
//! [`AlpsScheme`] is the standard policy.
//!
//! # References
//!
//! - Hornby (2006), "ALPS: The Age-Layered Population Structure for
//!   Reducing the Problem of Premature Convergence"

use crate::gp::Individual;
use crate::tree::Primitive;

/// Age ceiling of `layer` out of `num_layers` with the given gap.
///
/// The top layer is unbounded, layer 0 holds ages up to `gap`, layer 1 up
/// to `2·gap` and layer `i ≥ 2` up to `i²·gap`.
///
/// ```
/// use u_gp::alps::max_age;
///
/// assert_eq!(max_age(0, 10, 9), Some(10));
/// assert_eq!(max_age(1, 10, 9), Some(20));
/// assert_eq!(max_age(3, 10, 9), Some(90));
/// assert_eq!(max_age(8, 10, 9), None);
/// ```
pub fn max_age(layer: usize, gap: usize, num_layers: usize) -> Option<usize> {
    if layer + 1 >= num_layers {
        return None;
    }
    Some(match layer {
        0 => gap,
        1 => 2 * gap,
        i => i * i * gap,
    })
}

/// Age policy of a layered population.
pub trait LayerScheme: Send + Sync {
    /// Oldest age allowed in `layer`; `None` for no limit.
    fn max_age(&self, layer: usize, num_layers: usize) -> Option<usize>;

    /// Whether `individual`, sitting in `layer`, has outgrown it.
    fn should_move_up<P: Primitive>(
        &self,
        individual: &Individual<P>,
        layer: usize,
        num_layers: usize,
    ) -> bool {
        self.max_age(layer, num_layers)
            .is_some_and(|max| individual.age() > max)
    }

    /// Whether a new layer opens at `generation`.
    fn should_add_layer(
        &self,
        generation: usize,
        last_add: usize,
        layers: usize,
        num_layers: usize,
    ) -> bool;

    /// Whether the bottom layer is rebuilt from scratch at `generation`.
    fn should_regenerate(&self, generation: usize, last_regen: usize, bottom_len: usize) -> bool;

    /// Age of an elite carried into the next generation.
    fn elite_age(&self, age: usize, was_parent: bool) -> usize {
        if was_parent {
            age + 1
        } else {
            age
        }
    }
}

/// The standard ALPS policy: one gap between layer openings and between
/// bottom-layer refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlpsScheme {
    pub age_gap: usize,
}

impl AlpsScheme {
    pub fn new(age_gap: usize) -> Self {
        Self { age_gap }
    }
}

impl LayerScheme for AlpsScheme {
    fn max_age(&self, layer: usize, num_layers: usize) -> Option<usize> {
        max_age(layer, self.age_gap, num_layers)
    }

    fn should_add_layer(
        &self,
        generation: usize,
        last_add: usize,
        layers: usize,
        num_layers: usize,
    ) -> bool {
        generation != 0 && generation - last_add >= self.age_gap && layers < num_layers
    }

    fn should_regenerate(&self, generation: usize, last_regen: usize, bottom_len: usize) -> bool {
        bottom_len == 0 || (generation != 0 && generation - last_regen >= self.age_gap)
    }
}
