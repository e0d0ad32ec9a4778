//! Structural diversity tags.
//!
//! A tag is the canonical form of a tree restricted to a window of levels
//! `[level, level + depth]`. Function nodes cut off at the bottom of the
//! window still print their parentheses so the tag keeps the shape of the
//! truncated subtree. When the window starts below the root, the subtrees
//! rooted at `level` are listed as comma-separated fragments.
//!
//! Individuals sharing a tag form a niche; the density of a niche is the
//! share of the population it holds.

use crate::gp::Individual;
use crate::tree::{NodeId, Primitive, Tree};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Tag of `tree` over the window `[level, level + depth]`.
///
/// ```
/// # fn main() -> Result<(), u_gp::GpError> {
/// use u_gp::pareto::tag;
/// # use u_gp::tree::{Args, Primitive, PrimitiveSet, Tree};
/// # #[derive(Debug, Clone, PartialEq)]
/// # struct Sym(&'static str, usize);
/// # impl std::fmt::Display for Sym {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.0) }
/// # }
/// # impl Primitive for Sym {
/// #     type Context = ();
/// #     type Input = ();
/// #     type Value = ();
/// #     fn arity(&self) -> usize { self.1 }
/// #     fn evaluate(&self, _: &(), _: &(), _: &Args<'_, Self>) {}
/// # }
/// # let set = PrimitiveSet::new(vec![Sym("+", 2), Sym("*", 2)], vec![Sym("x", 0)])?;
/// let tree = Tree::parse("(+ (* x x) x)", &set)?;
/// assert_eq!(tag(&tree, 0, 1), "(+ (*) x)");
/// assert_eq!(tag(&tree, 1, 1), "(* x x),x");
/// assert_eq!(tag(&tree, 0, 0), "+");
/// # Ok(())
/// # }
/// ```
pub fn tag<P: Primitive>(tree: &Tree<P>, level: usize, depth: usize) -> String {
    let root = tree.root();
    if level == 0 && depth == 0 {
        return tree.node(root).primitive().to_string();
    }
    let mut out = String::new();
    write_window(tree, root, level, level + depth, 0, &mut out);
    out
}

fn write_window<P: Primitive>(
    tree: &Tree<P>,
    id: NodeId,
    first: usize,
    last: usize,
    current: usize,
    out: &mut String,
) {
    let node = tree.node(id);
    if current >= first {
        if current > last {
            return;
        }
        if !node.is_function() {
            let _ = write!(out, "{}", node.primitive());
            return;
        }
        let _ = write!(out, "({}", node.primitive());
        if current < last {
            for &child in node.children() {
                out.push(' ');
                write_window(tree, child, first, last, current + 1, out);
            }
        }
        out.push(')');
        return;
    }

    // above the window: the children at `first` start new fragments
    let fragments = current + 1 == first;
    for (i, &child) in node.children().iter().enumerate() {
        if fragments && (i > 0 || !out.is_empty()) {
            out.push(',');
        }
        write_window(tree, child, first, last, current + 1, out);
    }
}

/// Share of `population` holding each tag. Untagged individuals count
/// under the empty tag.
pub fn tag_densities<P: Primitive>(population: &[Individual<P>]) -> HashMap<String, f64> {
    let mut densities: HashMap<String, f64> = HashMap::new();
    for individual in population {
        *densities
            .entry(individual.tag().unwrap_or_default().to_string())
            .or_default() += 1.0;
    }
    let n = population.len() as f64;
    for density in densities.values_mut() {
        *density /= n;
    }
    densities
}

/// Tags individuals with a sliding window and remembers every tag seen at
/// each window level during the run.
#[derive(Debug, Clone, Default)]
pub struct DiversityTracker {
    level: usize,
    depth: usize,
    seen: HashMap<usize, HashSet<String>>,
}

impl DiversityTracker {
    pub fn new(level: usize, depth: usize) -> Self {
        let mut tracker = Self {
            level,
            depth,
            seen: HashMap::new(),
        };
        tracker.seen.entry(level).or_default();
        tracker
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Moves the window start to `level`.
    pub fn set_level(&mut self, level: usize) {
        self.level = level;
        self.seen.entry(level).or_default();
    }

    /// Tag of `tree` under the current window.
    pub fn tag_of<P: Primitive>(&self, tree: &Tree<P>) -> String {
        tag(tree, self.level, self.depth)
    }

    pub fn tag_individual<P: Primitive>(&self, individual: &mut Individual<P>) {
        let t = self.tag_of(individual.tree());
        individual.set_tag(t);
    }

    pub fn tag_all<P: Primitive>(&self, individuals: &mut [Individual<P>]) {
        for individual in individuals.iter_mut() {
            self.tag_individual(individual);
        }
    }

    /// Records the tags of `individuals` at the current level.
    pub fn collect<P: Primitive>(&mut self, individuals: &[Individual<P>]) {
        let seen = self.seen.entry(self.level).or_default();
        seen.extend(
            individuals
                .iter()
                .filter_map(|i| i.tag())
                .map(str::to_string),
        );
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.seen.entry(self.level).or_default().insert(tag.into());
    }

    /// Whether `tag` was never recorded at the current level.
    pub fn is_unique(&self, tag: &str) -> bool {
        !self
            .seen
            .get(&self.level)
            .is_some_and(|seen| seen.contains(tag))
    }

    /// Distinct tags recorded over all levels.
    pub fn num_tags(&self) -> usize {
        self.seen.values().map(HashSet::len).sum()
    }

    pub fn num_tags_at(&self, level: usize) -> usize {
        self.seen.get(&level).map_or(0, HashSet::len)
    }
}
