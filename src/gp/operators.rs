//! Structure-preserving variation operators.
//!
//! - [`crossover`]: subtree exchange under depth and size bounds
//! - [`mutate`]: arity-preserving point mutation
//!
//! Both produce new individuals; parents are never edited in place.
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming*, subtree crossover
//! - McKay et al. (1995), point mutation for tree GP

use super::config::GpConfig;
use super::individual::Individual;
use crate::error::GpError;
use crate::tree::{NodeId, Primitive, PrimitiveSet};
use log::error;
use rand::Rng;

/// The two children of a crossover.
#[derive(Debug, Clone)]
pub struct CrossoverOutcome<P> {
    /// Child built on the first parent.
    pub first: Individual<P>,
    /// Child built on the second parent.
    pub second: Individual<P>,
    /// `first` is a verbatim copy of the first parent.
    pub first_copied: bool,
    /// `second` is a verbatim copy of the second parent.
    pub second_copied: bool,
}

/// Exchanges random subtrees between two parents.
///
/// Crossover points are drawn with `config.function_bias`. A side is
/// accepted when its point is the root, or when the grafted subtree keeps
/// the child within `max_depth` and `max_size`. Points are redrawn up to
/// `max_crossover_attempts` times until both sides are accepted; a side
/// still rejected on the last attempt yields a light copy of its parent.
///
/// Substituted children take the older parent's age, copies keep their
/// parent's age. Neither is evaluated unless it is a copy of an evaluated
/// parent.
///
/// # Errors
///
/// [`GpError::BoundsExceeded`] if an accepted substitution still produced a
/// tree deeper than `max_depth`.
pub fn crossover<P: Primitive, R: Rng>(
    parent1: &Individual<P>,
    parent2: &Individual<P>,
    config: &GpConfig,
    rng: &mut R,
) -> Result<CrossoverOutcome<P>, GpError> {
    let attempts = config.max_crossover_attempts.max(1);
    let mut points = (parent1.tree().root(), parent2.tree().root());
    let mut accepted = (false, false);

    for _ in 0..attempts {
        let a = parent1.tree().random_node(rng, config.function_bias);
        let b = parent2.tree().random_node(rng, config.function_bias);
        points = (a, b);
        accepted = (
            accepts(parent1, a, parent2, b, config),
            accepts(parent2, b, parent1, a, config),
        );
        if accepted.0 && accepted.1 {
            break;
        }
    }

    let age = parent1.age().max(parent2.age());
    let first = if accepted.0 {
        splice(parent1, points.0, parent2, points.1, age, config)?
    } else {
        parent1.light_copy()
    };
    let second = if accepted.1 {
        splice(parent2, points.1, parent1, points.0, age, config)?
    } else {
        parent2.light_copy()
    };

    Ok(CrossoverOutcome {
        first,
        second,
        first_copied: !accepted.0,
        second_copied: !accepted.1,
    })
}

/// Whether replacing `point` in `recipient` with `donor`'s subtree at
/// `donor_point` stays within bounds.
fn accepts<P: Primitive>(
    recipient: &Individual<P>,
    point: NodeId,
    donor: &Individual<P>,
    donor_point: NodeId,
    config: &GpConfig,
) -> bool {
    let rt = recipient.tree();
    if point == rt.root() {
        return true;
    }
    let dt = donor.tree();
    let depth = rt.node_depth(point) + dt.subtree_depth(donor_point);
    let size = recipient.size() - rt.subtree_size(point) + dt.subtree_size(donor_point);
    depth <= config.max_depth && size <= config.max_size
}

fn splice<P: Primitive>(
    recipient: &Individual<P>,
    point: NodeId,
    donor: &Individual<P>,
    donor_point: NodeId,
    age: usize,
    config: &GpConfig,
) -> Result<Individual<P>, GpError> {
    let mut tree = recipient.tree().clone();
    tree.replace_subtree(point, donor.tree(), donor_point);
    let mut child = Individual::new(tree);
    child.set_age(age);

    if child.depth() > config.max_depth {
        error!(
            "crossover produced depth {} > {}: {}",
            child.depth(),
            config.max_depth,
            child
        );
        return Err(GpError::BoundsExceeded {
            operation: "crossover",
            depth: child.depth(),
            max_depth: config.max_depth,
        });
    }
    Ok(child)
}

/// Point-mutates a copy of `individual`.
///
/// Each node is visited in pre-order and, with probability `probability`:
/// a function is swapped for a random function of the same arity (left
/// alone if there is none), a constant is resampled, and any other terminal
/// is swapped for a random terminal. The copy has no id and is unevaluated.
pub fn mutate<P: Primitive, R: Rng>(
    individual: &Individual<P>,
    set: &PrimitiveSet<P>,
    probability: f64,
    rng: &mut R,
) -> Result<Individual<P>, GpError> {
    let mut tree = individual.tree().clone();

    for number in 0..tree.len() {
        if rng.random_range(0.0..1.0) >= probability {
            continue;
        }
        let id = tree.find_node(number)?;
        let node = tree.node(id);
        let replacement = if node.is_function() {
            set.random_function_with_arity(node.children().len(), rng)
        } else if node.primitive().is_constant() {
            let mut constant = node.primitive().clone();
            constant.randomize(rng);
            Some(constant)
        } else {
            Some(set.random_terminal(rng))
        };
        if let Some(primitive) = replacement {
            tree.set_primitive(id, primitive)?;
        }
    }

    let mut child = Individual::new(tree);
    child.set_age(individual.age());
    if let Some(layer) = individual.layer() {
        child.set_layer(layer);
    }
    Ok(child)
}
