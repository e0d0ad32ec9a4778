//! Primitive contract and primitive sets.
//!
//! A primitive is an opaque, fixed-arity evaluable unit. Functions have
//! arity > 0, terminals arity 0. The engine never inspects what a
//! primitive computes; it only needs arity, a canonical name (via
//! [`Display`](std::fmt::Display)), and for constants a way to resample.

use super::Args;
use crate::error::GpError;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

/// A node payload in a genome tree.
///
/// The `Display` output is the primitive's canonical token: it is what the
/// canonical string form prints and what [`PrimitiveSet::resolve`] looks
/// up when parsing.
///
/// # Examples
///
/// ```
/// use std::fmt;
/// use u_gp::tree::{Args, Primitive};
///
/// #[derive(Debug, Clone)]
/// enum Bool { And, Not, D(usize) }
///
/// impl fmt::Display for Bool {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         match self {
///             Bool::And => write!(f, "AND"),
///             Bool::Not => write!(f, "NOT"),
///             Bool::D(i) => write!(f, "D{i}"),
///         }
///     }
/// }
///
/// impl Primitive for Bool {
///     type Context = ();
///     type Input = [bool];
///     type Value = bool;
///
///     fn arity(&self) -> usize {
///         match self {
///             Bool::And => 2,
///             Bool::Not => 1,
///             Bool::D(_) => 0,
///         }
///     }
///
///     fn evaluate(&self, _: &(), input: &[bool], args: &Args<'_, Self>) -> bool {
///         match self {
///             Bool::And => args.eval(0) && args.eval(1),
///             Bool::Not => !args.eval(0),
///             Bool::D(i) => input[*i],
///         }
///     }
/// }
/// ```
pub trait Primitive: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Problem-wide state available to every node (data sets, lookup tables).
    type Context: ?Sized;
    /// The fitness case being evaluated.
    type Input: ?Sized;
    /// Result of evaluating a node.
    type Value;

    /// Number of children. Zero for terminals.
    fn arity(&self) -> usize;

    /// Evaluates this node. Children are evaluated on demand through `args`.
    fn evaluate(
        &self,
        context: &Self::Context,
        input: &Self::Input,
        args: &Args<'_, Self>,
    ) -> Self::Value;

    /// Whether this terminal carries a resampleable value.
    fn is_constant(&self) -> bool {
        false
    }

    /// Draws a new value for a constant. No-op for everything else.
    fn randomize<R: Rng>(&mut self, _rng: &mut R) {}

    /// Parses a literal token that is not a named primitive.
    fn from_literal(_token: &str) -> Option<Self> {
        None
    }

    /// Returns `true` for function primitives.
    fn is_function(&self) -> bool {
        self.arity() > 0
    }
}

/// The function and terminal sets a problem evolves over.
///
/// Also serves as the name→prototype mapping used to parse canonical
/// strings back into trees.
#[derive(Debug, Clone)]
pub struct PrimitiveSet<P: Primitive> {
    functions: Vec<P>,
    terminals: Vec<P>,
    by_name: HashMap<String, P>,
    by_arity: HashMap<usize, Vec<usize>>,
}

impl<P: Primitive> PrimitiveSet<P> {
    /// Creates a primitive set.
    ///
    /// Every function must have arity > 0, every terminal arity 0, the
    /// terminal set must be non-empty and names must be unique.
    pub fn new(functions: Vec<P>, terminals: Vec<P>) -> Result<Self, GpError> {
        if terminals.is_empty() {
            return Err(GpError::InvalidPrimitiveSet(
                "terminal set must not be empty".into(),
            ));
        }
        if let Some(f) = functions.iter().find(|f| f.arity() == 0) {
            return Err(GpError::InvalidPrimitiveSet(format!(
                "function '{f}' has arity 0"
            )));
        }
        if let Some(t) = terminals.iter().find(|t| t.arity() != 0) {
            return Err(GpError::InvalidPrimitiveSet(format!(
                "terminal '{t}' has arity {}",
                t.arity()
            )));
        }

        let mut by_name = HashMap::with_capacity(functions.len() + terminals.len());
        for p in functions.iter().chain(terminals.iter()) {
            if by_name.insert(p.to_string(), p.clone()).is_some() {
                return Err(GpError::InvalidPrimitiveSet(format!(
                    "duplicate primitive name '{p}'"
                )));
            }
        }

        let mut by_arity: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, f) in functions.iter().enumerate() {
            by_arity.entry(f.arity()).or_default().push(i);
        }

        Ok(Self {
            functions,
            terminals,
            by_name,
            by_arity,
        })
    }

    pub fn functions(&self) -> &[P] {
        &self.functions
    }

    pub fn terminals(&self) -> &[P] {
        &self.terminals
    }

    /// Probability of picking a terminal under the grow method:
    /// `|T| / (|T| + |F|)`.
    pub fn terminal_ratio(&self) -> f64 {
        self.terminals.len() as f64 / (self.terminals.len() + self.functions.len()) as f64
    }

    /// Looks up a primitive by canonical name.
    pub fn lookup(&self, name: &str) -> Option<&P> {
        self.by_name.get(name)
    }

    /// Resolves a genome token: named primitives first, then literals.
    pub fn resolve(&self, token: &str) -> Result<P, GpError> {
        if let Some(p) = self.by_name.get(token) {
            return Ok(p.clone());
        }
        P::from_literal(token).ok_or_else(|| GpError::UnknownToken {
            token: token.to_string(),
        })
    }

    /// Draws a terminal, resampling it if it is a constant.
    pub fn random_terminal<R: Rng>(&self, rng: &mut R) -> P {
        let mut t = self.terminals[rng.random_range(0..self.terminals.len())].clone();
        if t.is_constant() {
            t.randomize(rng);
        }
        t
    }

    /// Draws a function. Falls back to a terminal for a terminal-only set.
    pub fn random_function<R: Rng>(&self, rng: &mut R) -> P {
        if self.functions.is_empty() {
            return self.random_terminal(rng);
        }
        self.functions[rng.random_range(0..self.functions.len())].clone()
    }

    /// Draws a function of exactly `arity` children, if one exists.
    pub fn random_function_with_arity<R: Rng>(&self, arity: usize, rng: &mut R) -> Option<P> {
        let candidates = self.by_arity.get(&arity)?;
        let i = candidates[rng.random_range(0..candidates.len())];
        Some(self.functions[i].clone())
    }
}
