//! Property tests for the genome operators and Pareto survival.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use u_gp::gp::operators::{crossover, mutate};
use u_gp::gp::{Evaluation, GpConfig, Individual};
use u_gp::pareto::{trim, Dominance, Objectives};
use u_gp::tree::{Args, BuildMethod, Primitive, PrimitiveSet, Tree};

#[derive(Debug, Clone, PartialEq)]
enum Arith {
    Add,
    Mul,
    Neg,
    Select,
    X(usize),
}

impl fmt::Display for Arith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arith::Add => write!(f, "ADD"),
            Arith::Mul => write!(f, "MUL"),
            Arith::Neg => write!(f, "NEG"),
            Arith::Select => write!(f, "SEL"),
            Arith::X(i) => write!(f, "X{i}"),
        }
    }
}

impl Primitive for Arith {
    type Context = ();
    type Input = [f64];
    type Value = f64;

    fn arity(&self) -> usize {
        match self {
            Arith::Add | Arith::Mul => 2,
            Arith::Neg => 1,
            Arith::Select => 3,
            Arith::X(_) => 0,
        }
    }

    fn evaluate(&self, _: &(), input: &[f64], args: &Args<'_, Self>) -> f64 {
        match self {
            Arith::Add => args.eval(0) + args.eval(1),
            Arith::Mul => args.eval(0) * args.eval(1),
            Arith::Neg => -args.eval(0),
            Arith::Select => {
                if args.eval(0) > 0.0 {
                    args.eval(1)
                } else {
                    args.eval(2)
                }
            }
            Arith::X(i) => input[*i],
        }
    }
}

fn primitives() -> PrimitiveSet<Arith> {
    PrimitiveSet::new(
        vec![Arith::Add, Arith::Mul, Arith::Neg, Arith::Select],
        (0..3).map(Arith::X).collect(),
    )
    .unwrap()
}

fn random_tree(seed: u64, depth: usize, full: bool) -> Tree<Arith> {
    let method = if full { BuildMethod::Full } else { BuildMethod::Grow };
    let mut rng = StdRng::seed_from_u64(seed);
    method.build(&primitives(), depth, &mut rng).unwrap()
}

proptest! {
    #[test]
    fn test_canonical_round_trip(seed in any::<u64>(), depth in 0usize..6, full in any::<bool>()) {
        let tree = random_tree(seed, depth, full);
        let text = tree.to_string();
        let parsed = Tree::parse(&text, &primitives()).unwrap();
        prop_assert_eq!(parsed.to_string(), text);
        prop_assert_eq!(parsed.len(), tree.len());
        prop_assert_eq!(parsed.depth(), tree.depth());
    }

    #[test]
    fn test_crossover_respects_bounds(
        seed in any::<u64>(),
        d1 in 0usize..6,
        d2 in 0usize..6,
        extra_depth in 0usize..3,
        extra_size in 0usize..20,
    ) {
        let mut p1 = Individual::new(random_tree(seed, d1, false));
        let p2 = Individual::new(random_tree(seed.wrapping_add(1), d2, true));
        p1.set_age(3);
        // parents within bounds keep every child within bounds
        let max_depth = p1.depth().max(p2.depth()) + extra_depth;
        let max_size = p1.size().max(p2.size()) + extra_size;
        let config = GpConfig::default()
            .with_bounds(max_depth, max_size)
            .with_max_crossover_attempts(3);
        let mut rng = StdRng::seed_from_u64(seed);
        let out = crossover(&p1, &p2, &config, &mut rng).unwrap();

        for (child, copied, parent) in [
            (&out.first, out.first_copied, &p1),
            (&out.second, out.second_copied, &p2),
        ] {
            prop_assert!(child.depth() <= max_depth);
            prop_assert!(child.size() <= max_size);
            prop_assert_eq!(child.size(), child.tree().len());
            prop_assert_eq!(child.depth(), child.tree().depth());
            if copied {
                prop_assert_eq!(child.to_string(), parent.to_string());
                prop_assert_eq!(child.age(), parent.age());
            } else {
                prop_assert_eq!(child.age(), 3);
            }
        }
    }

    #[test]
    fn test_mutation_at_zero_is_identity(seed in any::<u64>(), depth in 0usize..6) {
        let mut parent = Individual::new(random_tree(seed, depth, seed % 2 == 0));
        parent.set_age(4);
        let mut rng = StdRng::seed_from_u64(seed);
        let mutated = mutate(&parent, &primitives(), 0.0, &mut rng).unwrap();
        prop_assert_eq!(mutated.to_string(), parent.to_string());
        prop_assert_eq!(mutated.age(), 4);
        prop_assert!(!mutated.is_evaluated());
    }

    #[test]
    fn test_dominance_is_asymmetric(
        rows in prop::collection::vec((0usize..5, 0u8..5, 0usize..3, 0usize..3), 2..25),
    ) {
        let population: Vec<Individual<Arith>> = rows
            .iter()
            .enumerate()
            .map(|(i, &(age, fitness, tag, depth))| {
                let mut ind = Individual::new(random_tree(i as u64, depth, true));
                ind.set_age(age);
                ind.set_tag(format!("t{tag}"));
                ind.record_evaluation(Evaluation::new(f64::from(fitness) / 4.0));
                ind
            })
            .collect();

        for objectives in [
            Objectives::AgeFitness,
            Objectives::AgeDensity,
            Objectives::DensityFitness,
            Objectives::AgeDensityFitness,
        ] {
            let d = Dominance::new(objectives, &population, true);
            for a in &population {
                prop_assert!(!d.is_dominated(a, a));
                for b in &population {
                    prop_assert!(!(d.is_dominated(a, b) && d.is_dominated(b, a)));
                }
            }
        }
    }

    #[test]
    fn test_trim_bound_and_front_survival(
        rows in prop::collection::vec((0usize..6, 0u8..9), 3..40),
        target in 1usize..20,
        tournament in 2usize..8,
        seed in any::<u64>(),
    ) {
        let mut population: Vec<Individual<Arith>> = rows
            .iter()
            .enumerate()
            .map(|(i, &(age, fitness))| {
                let mut ind = Individual::new(random_tree(i as u64, i % 4, false));
                ind.set_age(age);
                ind.record_evaluation(Evaluation::new(f64::from(fitness) / 8.0));
                ind
            })
            .collect();
        let d = Dominance::new(Objectives::AgeFitness, &population, true);
        let front: Vec<(usize, u64)> = population
            .iter()
            .zip(d.front(&population))
            .filter(|(_, on_front)| *on_front)
            .map(|(ind, _)| (ind.age(), ind.fitness().to_bits()))
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        trim(&mut population, &d, target, tournament, &mut rng);

        prop_assert!(population.len() <= target.max(front.len()));
        for (age, bits) in &front {
            prop_assert!(population
                .iter()
                .any(|ind| ind.age() == *age && ind.fitness().to_bits() == *bits));
        }
    }
}
