//! Genome trees.
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by [`NodeId`]. Every node
//! stores its parent id (`None` only at the root), its ordered children and
//! its pre-order number. Structural edits graft nodes onto the arena and
//! then [`Tree::renumber`] compacts it again, so after any public operation
//! the arena index of a node equals its pre-order number.
//!
//! # Key Types
//!
//! - [`Primitive`]: Fixed-arity evaluable node payload
//! - [`PrimitiveSet`]: Function/terminal sets and the token mapping for parsing
//! - [`BuildMethod`]: Grow or full random construction
//!
//! # Canonical form
//!
//! Functions print as `(NAME child child ...)`, terminals as `NAME`:
//!
//! ```text
//! (AND (OR D0 D1) (NOT D0))
//! ```

mod build;
mod parse;
mod primitive;

pub use build::BuildMethod;
pub use primitive::{Primitive, PrimitiveSet};

use crate::error::GpError;
use rand::Rng;
use std::fmt;

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of a genome tree.
#[derive(Debug, Clone)]
pub struct Node<P> {
    primitive: P,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    number: usize,
}

impl<P: Primitive> Node<P> {
    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Pre-order number assigned by the last [`Tree::renumber`].
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn is_function(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Lazy access to a node's children during evaluation.
pub struct Args<'a, P: Primitive> {
    tree: &'a Tree<P>,
    children: &'a [NodeId],
    context: &'a P::Context,
    input: &'a P::Input,
}

impl<P: Primitive> Args<'_, P> {
    /// Evaluates child `i`.
    ///
    /// # Panics
    /// Panics if `i` is not below the primitive's arity.
    pub fn eval(&self, i: usize) -> P::Value {
        self.tree
            .eval_node(self.children[i], self.context, self.input)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// An arena-backed expression tree.
#[derive(Debug, Clone)]
pub struct Tree<P> {
    nodes: Vec<Node<P>>,
    root: NodeId,
}

impl<P: Primitive> Tree<P> {
    /// Builds a tree from primitives listed in pre-order.
    ///
    /// Arities drive the shape: each function consumes the next
    /// `arity` subtrees. Fails if the sequence is empty, ends early, or has
    /// tokens left over once the root is complete.
    pub fn from_preorder<I: IntoIterator<Item = P>>(primitives: I) -> Result<Self, GpError> {
        let mut nodes: Vec<Node<P>> = Vec::new();
        // Functions still waiting for children.
        let mut open: Vec<usize> = Vec::new();

        for primitive in primitives {
            if !nodes.is_empty() && open.is_empty() {
                return Err(GpError::MalformedGenome(format!(
                    "unexpected token '{primitive}' after complete expression"
                )));
            }
            let idx = nodes.len();
            let parent = open.last().copied();
            if let Some(p) = parent {
                let node = &mut nodes[p];
                node.children.push(NodeId(idx));
                if node.children.len() == node.primitive.arity() {
                    open.pop();
                }
            }
            let arity = primitive.arity();
            nodes.push(Node {
                primitive,
                parent: parent.map(NodeId),
                children: Vec::with_capacity(arity),
                number: idx,
            });
            if arity > 0 {
                open.push(idx);
            }
        }

        if nodes.is_empty() {
            return Err(GpError::MalformedGenome("empty expression".into()));
        }
        if let Some(&p) = open.last() {
            return Err(GpError::MalformedGenome(format!(
                "'{}' is missing arguments",
                nodes[p].primitive
            )));
        }
        Ok(Self {
            nodes,
            root: NodeId(0),
        })
    }

    /// Creates a single-node tree.
    pub fn leaf(primitive: P) -> Result<Self, GpError> {
        Self::from_preorder([primitive])
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node<P> {
        &self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in pre-order, found by walking from the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// Reassigns pre-order numbers, compacts the arena so that index equals
    /// number, and returns the node count.
    ///
    /// Nodes unreachable from the root are dropped.
    pub fn renumber(&mut self) -> usize {
        let order = self.preorder();
        let mut remap = vec![usize::MAX; self.nodes.len()];
        for (n, id) in order.iter().enumerate() {
            remap[id.0] = n;
        }

        let mut old: Vec<Option<Node<P>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for (n, id) in order.iter().enumerate() {
            if let Some(mut node) = old[id.0].take() {
                node.number = n;
                node.parent = node.parent.map(|p| NodeId(remap[p.0]));
                for c in node.children.iter_mut() {
                    *c = NodeId(remap[c.0]);
                }
                nodes.push(node);
            }
        }

        self.nodes = nodes;
        self.root = NodeId(0);
        self.nodes.len()
    }

    /// Finds the node carrying pre-order number `number`.
    pub fn find_node(&self, number: usize) -> Result<NodeId, GpError> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.number == number {
                return Ok(id);
            }
            stack.extend(node.children.iter().rev());
        }
        Err(GpError::NodeNotFound {
            number,
            size: self.nodes.len(),
        })
    }

    /// Edges from the root down to `id`.
    pub fn node_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.nodes[p.0].parent;
        }
        depth
    }

    /// Edges from `id` down to its deepest leaf.
    pub fn subtree_depth(&self, id: NodeId) -> usize {
        self.nodes[id.0]
            .children
            .iter()
            .map(|&c| 1 + self.subtree_depth(c))
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in the subtree rooted at `id`.
    pub fn subtree_size(&self, id: NodeId) -> usize {
        1 + self.nodes[id.0]
            .children
            .iter()
            .map(|&c| self.subtree_size(c))
            .sum::<usize>()
    }

    /// Depth of the whole tree.
    pub fn depth(&self) -> usize {
        self.subtree_depth(self.root)
    }

    /// Picks a random node.
    ///
    /// With probability `function_bias` the pick is among function nodes,
    /// otherwise among terminals. A single-node tree yields its root, and
    /// an empty class falls back to any node.
    pub fn random_node<R: Rng>(&self, rng: &mut R, function_bias: f64) -> NodeId {
        if self.nodes.len() == 1 {
            return self.root;
        }
        let want_function = rng.random_range(0.0..1.0) < function_bias;
        let pool: Vec<NodeId> = (0..self.nodes.len())
            .map(NodeId)
            .filter(|&id| self.nodes[id.0].is_function() == want_function)
            .collect();
        if pool.is_empty() {
            return NodeId(rng.random_range(0..self.nodes.len()));
        }
        pool[rng.random_range(0..pool.len())]
    }

    /// Replaces the primitive at `id`, keeping its children.
    pub fn set_primitive(&mut self, id: NodeId, primitive: P) -> Result<(), GpError> {
        let node = &mut self.nodes[id.0];
        if primitive.arity() != node.children.len() {
            return Err(GpError::MalformedGenome(format!(
                "cannot replace '{}' with '{primitive}': arity {} != {}",
                node.primitive,
                node.children.len(),
                primitive.arity()
            )));
        }
        node.primitive = primitive;
        Ok(())
    }

    /// Replaces the subtree at `at` with a deep copy of `donor`'s subtree
    /// rooted at `donor_at`. Returns the new node count.
    pub fn replace_subtree(&mut self, at: NodeId, donor: &Tree<P>, donor_at: NodeId) -> usize {
        let parent = self.nodes[at.0].parent;
        let grafted = self.graft(donor, donor_at, parent);
        match parent {
            Some(p) => {
                for c in self.nodes[p.0].children.iter_mut() {
                    if *c == at {
                        *c = grafted;
                    }
                }
            }
            None => self.root = grafted,
        }
        self.renumber()
    }

    fn graft(&mut self, donor: &Tree<P>, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let src = &donor.nodes[id.0];
        let new_id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            primitive: src.primitive.clone(),
            parent,
            children: Vec::with_capacity(src.children.len()),
            number: usize::MAX,
        });
        for &c in &src.children {
            let child = self.graft(donor, c, Some(new_id));
            self.nodes[new_id.0].children.push(child);
        }
        new_id
    }

    /// Evaluates the tree.
    pub fn evaluate(&self, context: &P::Context, input: &P::Input) -> P::Value {
        self.eval_node(self.root, context, input)
    }

    fn eval_node(&self, id: NodeId, context: &P::Context, input: &P::Input) -> P::Value {
        let node = &self.nodes[id.0];
        let args = Args {
            tree: self,
            children: &node.children,
            context,
            input,
        };
        node.primitive.evaluate(context, input, &args)
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id.0];
        if node.children.is_empty() {
            return write!(f, "{}", node.primitive);
        }
        write!(f, "({}", node.primitive)?;
        for &c in &node.children {
            f.write_str(" ")?;
            self.fmt_node(c, f)?;
        }
        f.write_str(")")
    }
}

impl<P: Primitive> fmt::Display for Tree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}
