//! Candidate programs.

use super::types::Evaluation;
use crate::error::GpError;
use crate::tree::{Primitive, PrimitiveSet, Tree};
use std::cmp::Ordering;
use std::fmt;

/// Run-unique identity of an individual, printed as `serial|generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualId {
    /// Position in the engine's creation order.
    pub serial: u64,
    /// Generation in which the individual was created.
    pub generation: usize,
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.serial, self.generation)
    }
}

/// A genome tree plus the bookkeeping the engines attach to it.
///
/// Depth and size are kept in sync with the tree: every structural change
/// goes through [`Individual::new`] or [`Individual::refresh_structure`].
#[derive(Debug, Clone)]
pub struct Individual<P> {
    tree: Tree<P>,
    id: Option<IndividualId>,
    fitness: f64,
    hits: usize,
    depth: usize,
    size: usize,
    age: usize,
    tag: Option<String>,
    layer: Option<usize>,
    evaluated: bool,
}

impl<P: Primitive> Individual<P> {
    /// Wraps a tree as a fresh, unevaluated individual of age 0.
    pub fn new(tree: Tree<P>) -> Self {
        let mut ind = Self {
            tree,
            id: None,
            fitness: 0.0,
            hits: 0,
            depth: 0,
            size: 0,
            age: 0,
            tag: None,
            layer: None,
            evaluated: false,
        };
        ind.refresh_structure();
        ind
    }

    /// Parses an individual from its canonical string.
    pub fn parse(text: &str, set: &PrimitiveSet<P>) -> Result<Self, GpError> {
        Tree::parse(text, set).map(Self::new)
    }

    pub fn tree(&self) -> &Tree<P> {
        &self.tree
    }

    pub fn id(&self) -> Option<IndividualId> {
        self.id
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Edges from the root to the deepest leaf.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Node count.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn age(&self) -> usize {
        self.age
    }

    /// Structural diversity tag (Pareto engine only).
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Layer the individual sat in when layers were last stamped (ALPS only).
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn set_age(&mut self, age: usize) {
        self.age = age;
    }

    pub fn increment_age(&mut self) {
        self.age += 1;
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    pub(crate) fn set_id(&mut self, id: IndividualId) {
        self.id = Some(id);
    }

    pub(crate) fn set_layer(&mut self, layer: usize) {
        self.layer = Some(layer);
    }

    /// Stores an evaluation result and marks the individual evaluated.
    pub fn record_evaluation(&mut self, evaluation: Evaluation) {
        self.fitness = evaluation.fitness;
        self.hits = evaluation.hits;
        self.evaluated = true;
    }

    /// Clears fitness and hits so the individual is scored again.
    pub fn reset_evaluation(&mut self) {
        self.fitness = 0.0;
        self.hits = 0;
        self.evaluated = false;
    }

    /// Renumbers the tree and recomputes depth and size.
    pub fn refresh_structure(&mut self) {
        self.size = self.tree.renumber();
        self.depth = self.tree.depth();
    }

    /// Copies everything, id, layer and evaluation state included.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Copies the genome and scalar state but not the identity: the copy
    /// has no id and no layer.
    ///
    /// Evaluation state is kept since the genome is unchanged.
    pub fn light_copy(&self) -> Self {
        let mut copy = Self {
            tree: self.tree.clone(),
            id: None,
            fitness: self.fitness,
            hits: self.hits,
            depth: 0,
            size: 0,
            age: self.age,
            tag: self.tag.clone(),
            layer: None,
            evaluated: self.evaluated,
        };
        copy.refresh_structure();
        copy
    }

    /// Orders individuals by fitness alone; NaN compares equal.
    pub fn cmp_fitness(&self, other: &Self) -> Ordering {
        self.fitness
            .partial_cmp(&other.fitness)
            .unwrap_or(Ordering::Equal)
    }

    /// Evaluates the genome against one fitness case.
    pub fn evaluate(&self, context: &P::Context, input: &P::Input) -> P::Value {
        self.tree.evaluate(context, input)
    }
}

impl<P: Primitive> fmt::Display for Individual<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}
