//! Genetic programming core.
//!
//! Everything the survivor strategies share: the [`Individual`] wrapper
//! around a genome tree, the [`Problem`] contract, variation operators,
//! parent selection, the concurrent evaluator and statistics hooks, plus
//! the plain generational engine.
//!
//! # Core Traits
//!
//! - [`Problem`]: Primitive set and fitness function of a domain
//! - [`Statistics`]: Per-generation observer hooks
//!
//! # Key Types
//!
//! - [`GpConfig`]: Parameters shared by every engine
//! - [`GenerationalGp`]: Generational replacement with elitism
//! - [`GpResult`]: Final result with statistics
//! - [`Evaluator`]: Thread-pool fitness evaluation
//!
//! # Submodules
//!
//! - [`operators`]: Subtree crossover and point mutation
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming: On the Programming of Computers by
//!   Means of Natural Selection*
//! - Poli, Langdon & McPhee (2008), *A Field Guide to Genetic Programming*

pub(crate) mod breeder;
mod config;
mod eval;
mod individual;
pub mod operators;
mod runner;
mod selection;
mod stats;
mod types;

pub use config::{GpConfig, Termination};
pub use eval::{EvalState, Evaluator};
pub use individual::{Individual, IndividualId};
pub use runner::{find_best, GenerationalGp, GpResult};
pub use selection::Selection;
pub use stats::{GenerationSummary, History, NoStatistics, Statistics};
pub use types::{Evaluation, Problem};
