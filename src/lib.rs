//! Tree-based genetic programming engine.
//!
//! Evolves populations of symbolic-expression trees toward a fitness
//! objective:
//!
//! - **Genome trees**: Arena-backed expression trees over a user-supplied
//!   primitive set, with canonical prefix serialization and parsing.
//! - **Operators**: Bounded subtree crossover and point mutation.
//! - **Generational GP**: Whole-population replacement with tournament
//!   selection and elitism.
//! - **ALPS**: Age-layered population structure with scheduled
//!   injection of fresh random individuals.
//! - **Pareto GP**: Multi-objective survival over age, structural
//!   diversity and fitness.
//! - **Evaluation**: Fitness evaluation fanned out over a fixed thread
//!   pool; a fixed seed reproduces a run regardless of thread count.
//!
//! # Architecture
//!
//! The crate is domain-agnostic: a consumer implements
//! [`tree::Primitive`] for its node vocabulary and [`gp::Problem`] for its
//! fitness function, then picks an engine by [`EngineKind`] and calls
//! [`run`].
//!
//! ```
//! use u_gp::gp::{Evaluation, GpConfig, History, Individual, Problem};
//! use u_gp::tree::{Args, Primitive, PrimitiveSet};
//! use u_gp::{run, EngineKind};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Op { And, Or, Not, In(usize) }
//!
//! impl std::fmt::Display for Op {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         match self {
//!             Op::And => write!(f, "AND"),
//!             Op::Or => write!(f, "OR"),
//!             Op::Not => write!(f, "NOT"),
//!             Op::In(i) => write!(f, "D{i}"),
//!         }
//!     }
//! }
//!
//! impl Primitive for Op {
//!     type Context = ();
//!     type Input = [bool];
//!     type Value = bool;
//!
//!     fn arity(&self) -> usize {
//!         match self {
//!             Op::And | Op::Or => 2,
//!             Op::Not => 1,
//!             Op::In(_) => 0,
//!         }
//!     }
//!
//!     fn evaluate(&self, _: &(), input: &[bool], args: &Args<'_, Self>) -> bool {
//!         match self {
//!             Op::And => args.eval(0) && args.eval(1),
//!             Op::Or => args.eval(0) || args.eval(1),
//!             Op::Not => !args.eval(0),
//!             Op::In(i) => input[*i],
//!         }
//!     }
//! }
//!
//! struct Xor(PrimitiveSet<Op>);
//!
//! impl Problem for Xor {
//!     type Primitive = Op;
//!
//!     fn primitives(&self) -> &PrimitiveSet<Op> {
//!         &self.0
//!     }
//!
//!     fn evaluate(&self, individual: &Individual<Op>) -> Evaluation {
//!         let rows = [[false, false], [false, true], [true, false], [true, true]];
//!         let hits = rows
//!             .iter()
//!             .filter(|r| individual.evaluate(&(), &r[..]) == (r[0] != r[1]))
//!             .count();
//!         Evaluation::new(hits as f64 / 4.0).with_hits(hits)
//!     }
//! }
//!
//! # fn main() -> Result<(), u_gp::GpError> {
//! let set = PrimitiveSet::new(vec![Op::And, Op::Or, Op::Not], vec![Op::In(0), Op::In(1)])?;
//! let mut problem = Xor(set);
//! let config = GpConfig::default()
//!     .with_population_size(100)
//!     .with_generations(30)
//!     .with_seed(42);
//! let mut history = History::default();
//! let result = run(&mut problem, &config, &EngineKind::Generational, &mut history)?;
//! assert!(result.best_fitness >= 0.75);
//! assert_eq!(history.generations.len(), result.generations);
//! # Ok(())
//! # }
//! ```

pub mod alps;
pub mod engine;
pub mod error;
pub mod gp;
pub mod pareto;
pub mod random;
pub mod tree;

#[cfg(test)]
mod testing;

pub use engine::{run, Engine, EngineKind};
pub use error::GpError;
