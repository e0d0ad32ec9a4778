//! Core contract between the engines and a problem domain.
//!
//! A problem supplies the primitive set the trees are built from and a
//! fitness function. Everything else (selection, variation, survival) is
//! handled generically by the engines.

use super::config::GpConfig;
use super::individual::Individual;
use crate::error::GpError;
use crate::tree::{Primitive, PrimitiveSet};

/// Outcome of scoring one individual.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Higher is better. The optimum is [`Problem::optimal_fitness`].
    pub fitness: f64,
    /// Number of fitness cases solved exactly.
    pub hits: usize,
}

impl Evaluation {
    pub fn new(fitness: f64) -> Self {
        Self { fitness, hits: 0 }
    }

    pub fn with_hits(mut self, hits: usize) -> Self {
        self.hits = hits;
        self
    }
}

/// Defines a GP problem.
///
/// `evaluate` is called from the evaluation workers, concurrently and
/// through a shared reference, so the problem must be `Sync`. It is never
/// called for an individual that is already evaluated.
///
/// # Implementing
///
/// ```ignore
/// struct Parity { set: PrimitiveSet<Bool>, bits: usize }
///
/// impl Problem for Parity {
///     type Primitive = Bool;
///
///     fn primitives(&self) -> &PrimitiveSet<Bool> { &self.set }
///
///     fn evaluate(&self, ind: &Individual<Bool>) -> Evaluation {
///         let hits = (0..1usize << self.bits)
///             .filter(|row| ind.evaluate(&(), &bits_of(*row)) == parity(*row))
///             .count();
///         Evaluation::new(hits as f64 / (1 << self.bits) as f64).with_hits(hits)
///     }
/// }
/// ```
pub trait Problem: Send + Sync {
    /// Node payload the genomes are made of.
    type Primitive: Primitive;

    /// Functions and terminals available to the search.
    fn primitives(&self) -> &PrimitiveSet<Self::Primitive>;

    /// One-time setup before the first generation.
    fn init(&mut self, _config: &GpConfig) -> Result<(), GpError> {
        Ok(())
    }

    /// Scores an individual.
    fn evaluate(&self, individual: &Individual<Self::Primitive>) -> Evaluation;

    /// Fitness at which a run may stop early.
    fn optimal_fitness(&self) -> f64 {
        1.0
    }
}
