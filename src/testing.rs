//! Shared fixtures for unit tests: a boolean and an arithmetic primitive
//! set, plus a truth-table problem.

use crate::gp::{Evaluation, Individual, Problem};
use crate::tree::{Args, Primitive, PrimitiveSet};
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bool {
    And,
    Or,
    Not,
    If,
    D(usize),
}

impl Bool {
    /// AND, OR, NOT, IF over `inputs` data terminals.
    pub fn set(inputs: usize) -> PrimitiveSet<Bool> {
        PrimitiveSet::new(
            vec![Bool::And, Bool::Or, Bool::Not, Bool::If],
            (0..inputs).map(Bool::D).collect(),
        )
        .unwrap()
    }
}

impl fmt::Display for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bool::And => write!(f, "AND"),
            Bool::Or => write!(f, "OR"),
            Bool::Not => write!(f, "NOT"),
            Bool::If => write!(f, "IF"),
            Bool::D(i) => write!(f, "D{i}"),
        }
    }
}

impl Primitive for Bool {
    type Context = ();
    type Input = [bool];
    type Value = bool;

    fn arity(&self) -> usize {
        match self {
            Bool::And | Bool::Or => 2,
            Bool::Not => 1,
            Bool::If => 3,
            Bool::D(_) => 0,
        }
    }

    fn evaluate(&self, _: &(), input: &[bool], args: &Args<'_, Self>) -> bool {
        match self {
            Bool::And => args.eval(0) && args.eval(1),
            Bool::Or => args.eval(0) || args.eval(1),
            Bool::Not => !args.eval(0),
            Bool::If => {
                if args.eval(0) {
                    args.eval(1)
                } else {
                    args.eval(2)
                }
            }
            Bool::D(i) => input[*i],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Math {
    Add,
    Sub,
    Mul,
    Sin,
    X,
    Const(f64),
}

impl Math {
    pub fn set() -> PrimitiveSet<Math> {
        PrimitiveSet::new(
            vec![Math::Add, Math::Sub, Math::Mul, Math::Sin],
            vec![Math::X, Math::Const(0.0)],
        )
        .unwrap()
    }
}

impl fmt::Display for Math {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Math::Add => write!(f, "+"),
            Math::Sub => write!(f, "-"),
            Math::Mul => write!(f, "*"),
            Math::Sin => write!(f, "SIN"),
            Math::X => write!(f, "x"),
            Math::Const(v) => write!(f, "{v}"),
        }
    }
}

impl Primitive for Math {
    type Context = ();
    type Input = f64;
    type Value = f64;

    fn arity(&self) -> usize {
        match self {
            Math::Add | Math::Sub | Math::Mul => 2,
            Math::Sin => 1,
            Math::X | Math::Const(_) => 0,
        }
    }

    fn evaluate(&self, _: &(), x: &f64, args: &Args<'_, Self>) -> f64 {
        match self {
            Math::Add => args.eval(0) + args.eval(1),
            Math::Sub => args.eval(0) - args.eval(1),
            Math::Mul => args.eval(0) * args.eval(1),
            Math::Sin => args.eval(0).sin(),
            Math::X => *x,
            Math::Const(v) => *v,
        }
    }

    fn is_constant(&self) -> bool {
        matches!(self, Math::Const(_))
    }

    fn randomize<R: Rng>(&mut self, rng: &mut R) {
        if let Math::Const(v) = self {
            *v = (rng.random_range(-1.0..1.0f64) * 100.0).round() / 100.0;
        }
    }

    fn from_literal(token: &str) -> Option<Self> {
        token.parse().ok().map(Math::Const)
    }
}

/// Parses a boolean individual over three inputs.
pub fn ind(text: &str) -> Individual<Bool> {
    Individual::parse(text, &Bool::set(3)).unwrap()
}

/// Parses a boolean individual and gives it a fitness.
pub fn scored(text: &str, fitness: f64) -> Individual<Bool> {
    let mut i = ind(text);
    i.record_evaluation(Evaluation::new(fitness));
    i
}

/// Learn a boolean function of `inputs` variables; fitness is the fraction
/// of truth-table rows matched.
pub struct TruthTable {
    set: PrimitiveSet<Bool>,
    inputs: usize,
    target: fn(&[bool]) -> bool,
}

impl TruthTable {
    pub fn new(inputs: usize, target: fn(&[bool]) -> bool) -> Self {
        Self {
            set: Bool::set(inputs),
            inputs,
            target,
        }
    }

    /// Two-input AND: found almost immediately.
    pub fn and2() -> Self {
        Self::new(2, |b| b[0] && b[1])
    }

    /// Three-input even parity: not solved in a handful of generations.
    pub fn parity3() -> Self {
        Self::new(3, |b| b.iter().filter(|&&x| x).count() % 2 == 0)
    }
}

impl Problem for TruthTable {
    type Primitive = Bool;

    fn primitives(&self) -> &PrimitiveSet<Bool> {
        &self.set
    }

    fn evaluate(&self, individual: &Individual<Bool>) -> Evaluation {
        let rows = 1usize << self.inputs;
        let hits = (0..rows)
            .filter(|row| {
                let bits: Vec<bool> = (0..self.inputs).map(|i| row >> i & 1 == 1).collect();
                individual.evaluate(&(), &bits) == (self.target)(&bits)
            })
            .count();
        Evaluation::new(hits as f64 / rows as f64).with_hits(hits)
    }
}
