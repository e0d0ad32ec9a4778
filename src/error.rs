//! Error type shared by every engine.
//!
//! Structural bound violations and search exhaustion are recovered from
//! locally (fallback copies, skipped mutations, tolerated duplicates) and
//! never surface here. What does surface is either malformed input
//! (genome text, configuration) or an internal-consistency failure that
//! aborts the run.

/// Errors produced while configuring or running a GP engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GpError {
    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A strategy or objective name did not match any registered variant.
    #[error("unknown {kind} '{name}'")]
    UnknownStrategy { kind: &'static str, name: String },

    /// A genome token is neither a known primitive nor a literal.
    #[error("unknown primitive token '{token}'")]
    UnknownToken { token: String },

    /// Genome text has missing or trailing tokens for the declared arities.
    #[error("malformed genome: {0}")]
    MalformedGenome(String),

    /// A primitive set was declared with an inconsistent arity.
    #[error("invalid primitive set: {0}")]
    InvalidPrimitiveSet(String),

    /// Node numbering no longer matches the tree.
    #[error("node {number} not found in tree of size {size}")]
    NodeNotFound { number: usize, size: usize },

    /// A structural edit produced a tree beyond the configured bounds.
    #[error("tree exceeds bounds after {operation}: depth {depth} > {max_depth}")]
    BoundsExceeded {
        operation: &'static str,
        depth: usize,
        max_depth: usize,
    },

    /// An evaluation worker panicked or left shared state poisoned.
    #[error("evaluation worker failed: {0}")]
    WorkerFailed(String),

    /// A result was requested before anything was evaluated.
    #[error("no individual has been evaluated yet")]
    NoEvaluations,

    /// The problem failed to initialise.
    #[error("problem initialisation failed: {0}")]
    Problem(String),
}
