//! Random tree construction.
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming*, ramped half-and-half initialisation

use super::{Primitive, PrimitiveSet, Tree};
use crate::error::GpError;
use rand::Rng;

/// Random construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildMethod {
    /// Any node may be a terminal; a terminal is chosen with probability
    /// `|T| / (|T| + |F|)`. Produces irregular shapes.
    Grow,
    /// Functions until the depth budget runs out. Every leaf sits at the
    /// target depth (for sets without mixed arities).
    Full,
}

impl BuildMethod {
    /// Ramped half-and-half: the first half of a batch grows, the rest is full.
    pub fn ramped(index: usize, batch: usize) -> Self {
        if index < batch / 2 {
            BuildMethod::Grow
        } else {
            BuildMethod::Full
        }
    }

    /// Builds a random tree of at most `depth` edges.
    pub fn build<P: Primitive, R: Rng>(
        self,
        set: &PrimitiveSet<P>,
        depth: usize,
        rng: &mut R,
    ) -> Result<Tree<P>, GpError> {
        let mut primitives = Vec::new();
        self.push_subtree(set, depth, rng, &mut primitives);
        Tree::from_preorder(primitives)
    }

    fn push_subtree<P: Primitive, R: Rng>(
        self,
        set: &PrimitiveSet<P>,
        depth: usize,
        rng: &mut R,
        out: &mut Vec<P>,
    ) {
        let terminal = depth == 0
            || set.functions().is_empty()
            || match self {
                BuildMethod::Full => false,
                BuildMethod::Grow => rng.random_range(0.0..1.0) < set.terminal_ratio(),
            };
        if terminal {
            out.push(set.random_terminal(rng));
            return;
        }
        let f = set.random_function(rng);
        let arity = f.arity();
        out.push(f);
        for _ in 0..arity {
            self.push_subtree(set, depth - 1, rng, out);
        }
    }
}
