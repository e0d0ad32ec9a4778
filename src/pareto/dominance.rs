//! Pareto dominance, the non-dominated front and tournament trimming.
//!
//! # References
//!
//! - Schmidt & Lipson (2011), "Age-Fitness Pareto Optimization"
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"

use super::config::Objectives;
use super::diversity::tag_densities;
use crate::gp::Individual;
use crate::tree::Primitive;
use rand::seq::index;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Dominance relation over one population snapshot.
///
/// Densities are fixed when the relation is built, so the relation stays
/// consistent while individuals are removed.
#[derive(Debug, Clone)]
pub struct Dominance {
    objectives: Objectives,
    densities: HashMap<String, f64>,
    size_breaks_ties: bool,
}

impl Dominance {
    /// Builds the relation with tag densities taken from `population`.
    pub fn new<P: Primitive>(
        objectives: Objectives,
        population: &[Individual<P>],
        size_breaks_ties: bool,
    ) -> Self {
        let densities = if objectives.uses_density() {
            tag_densities(population)
        } else {
            HashMap::new()
        };
        Self::with_densities(objectives, densities, size_breaks_ties)
    }

    pub fn with_densities(
        objectives: Objectives,
        densities: HashMap<String, f64>,
        size_breaks_ties: bool,
    ) -> Self {
        Self {
            objectives,
            densities,
            size_breaks_ties,
        }
    }

    /// Density of the niche `individual` belongs to; unknown tags count as 0.
    pub fn density<P: Primitive>(&self, individual: &Individual<P>) -> f64 {
        self.densities
            .get(individual.tag().unwrap_or_default())
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether `a` is dominated by `b`.
    ///
    /// `a` is dominated when the two differ on some active objective and
    /// `a` is better on none. Full ties go against the larger tree when
    /// `size_breaks_ties` is set and sizes differ, else against the later
    /// id, so the relation is irreflexive and asymmetric.
    pub fn is_dominated<P: Primitive>(&self, a: &Individual<P>, b: &Individual<P>) -> bool {
        let mut tied = true;
        let mut better = false;
        let mut compare = |ord: Ordering| match ord {
            Ordering::Greater => {
                better = true;
                tied = false;
            }
            Ordering::Less => tied = false,
            Ordering::Equal => {}
        };

        if self.objectives.uses_age() {
            // younger is better
            compare(b.age().cmp(&a.age()));
        }
        if self.objectives.uses_density() {
            // rarer is better
            compare(
                self.density(b)
                    .partial_cmp(&self.density(a))
                    .unwrap_or(Ordering::Equal),
            );
        }
        if self.objectives.uses_fitness() {
            compare(a.cmp_fitness(b));
        }

        if !tied {
            return !better;
        }
        if self.size_breaks_ties && a.size() != b.size() {
            return a.size() > b.size();
        }
        a.id() > b.id()
    }

    /// Membership flags of the non-dominated front, by exhaustive pairwise
    /// comparison.
    pub fn front<P: Primitive>(&self, population: &[Individual<P>]) -> Vec<bool> {
        (0..population.len())
            .map(|i| {
                !(0..population.len())
                    .any(|j| j != i && self.is_dominated(&population[i], &population[j]))
            })
            .collect()
    }
}

/// Shrinks `population` towards `target` by tournament deletion.
///
/// Each round samples `tournament_size` distinct survivors (clamped to
/// `[2, survivors]`). A sampled individual outside the front is deleted
/// when another sampled individual dominates it or sits on the front; a
/// sampled individual dominated by the current candidate is deleted too.
/// Rounds repeat until `target` is reached or only the front is left.
/// Front members are never deleted.
///
/// Returns the number of individuals deleted.
pub fn trim<P: Primitive, R: Rng>(
    population: &mut Vec<Individual<P>>,
    dominance: &Dominance,
    target: usize,
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let n = population.len();
    let front = dominance.front(population);
    let front_size = front.iter().filter(|&&f| f).count();
    if front_size == n {
        return 0;
    }

    let mut alive = vec![true; n];
    let mut remaining = n;
    while remaining > target && remaining > front_size {
        let survivors: Vec<usize> = (0..n).filter(|&i| alive[i]).collect();
        let k = tournament_size.clamp(2, survivors.len().max(2)).min(survivors.len());
        let sampled: Vec<usize> = index::sample(rng, survivors.len(), k)
            .into_iter()
            .map(|s| survivors[s])
            .collect();

        for &c1 in &sampled {
            if !alive[c1] || front[c1] {
                continue;
            }
            for &c2 in &sampled {
                if c1 == c2 || !alive[c2] {
                    continue;
                }
                if front[c2] || dominance.is_dominated(&population[c1], &population[c2]) {
                    alive[c1] = false;
                    remaining -= 1;
                    break;
                }
                if !front[c2] && dominance.is_dominated(&population[c2], &population[c1]) {
                    alive[c2] = false;
                    remaining -= 1;
                    if remaining <= target {
                        break;
                    }
                }
            }
            if remaining <= target {
                break;
            }
        }
    }

    let mut flags = alive.into_iter();
    population.retain(|_| flags.next().unwrap_or(false));
    n - remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::IndividualId;
    use crate::random::create_rng;
    use crate::testing::scored;

    fn member(text: &str, fitness: f64, age: usize, tag: &str, serial: u64) -> Individual<crate::testing::Bool> {
        let mut i = scored(text, fitness);
        i.set_age(age);
        i.set_tag(tag);
        i.set_id(IndividualId {
            serial,
            generation: 0,
        });
        i
    }

    fn density_population() -> Vec<Individual<crate::testing::Bool>> {
        let mut pop = Vec::new();
        let mut serial = 0;
        for (t, n) in [("A", 5), ("B", 3), ("C", 2)] {
            for _ in 0..n {
                pop.push(member("D0", 0.5, 1, t, serial));
                serial += 1;
            }
        }
        pop
    }

    #[test]
    fn test_rare_tag_not_dominated_by_common() {
        let pop = density_population();
        let d = Dominance::new(Objectives::DensityFitness, &pop, true);
        assert!((d.density(&pop[0]) - 0.5).abs() < 1e-12);
        assert!((d.density(&pop[5]) - 0.3).abs() < 1e-12);
        assert!((d.density(&pop[9]) - 0.2).abs() < 1e-12);
        let a = &pop[0];
        let c = &pop[8];
        assert!(!d.is_dominated(c, a));
        assert!(d.is_dominated(a, c));
    }

    #[test]
    fn test_age_fitness() {
        let d = Dominance::with_densities(Objectives::AgeFitness, HashMap::new(), true);
        let young_weak = member("D0", 0.2, 1, "", 0);
        let old_strong = member("D1", 0.9, 5, "", 1);
        let old_weak = member("D2", 0.2, 5, "", 2);
        assert!(!d.is_dominated(&young_weak, &old_strong));
        assert!(!d.is_dominated(&old_strong, &young_weak));
        assert!(d.is_dominated(&old_weak, &young_weak));
        assert!(d.is_dominated(&old_weak, &old_strong));
    }

    #[test]
    fn test_ties_broken_by_size_then_id() {
        let d = Dominance::with_densities(Objectives::AgeFitness, HashMap::new(), true);
        let small = member("D0", 0.5, 2, "", 7);
        let large = member("(NOT D0)", 0.5, 2, "", 3);
        assert!(d.is_dominated(&large, &small));
        assert!(!d.is_dominated(&small, &large));

        let d = Dominance::with_densities(Objectives::AgeFitness, HashMap::new(), false);
        assert!(d.is_dominated(&small, &large));
        assert!(!d.is_dominated(&large, &small));
    }

    #[test]
    fn test_irreflexive_and_asymmetric() {
        let pop = density_population();
        for objectives in [
            Objectives::AgeFitness,
            Objectives::AgeDensity,
            Objectives::DensityFitness,
            Objectives::AgeDensityFitness,
        ] {
            let d = Dominance::new(objectives, &pop, true);
            for a in &pop {
                assert!(!d.is_dominated(a, a));
                for b in &pop {
                    assert!(!(d.is_dominated(a, b) && d.is_dominated(b, a)));
                }
            }
        }
    }

    #[test]
    fn test_front() {
        let pop = vec![
            member("D0", 0.9, 3, "", 0),
            member("D1", 0.5, 1, "", 1),
            member("D2", 0.4, 2, "", 2),
            member("(NOT D0)", 0.9, 3, "", 3),
        ];
        let d = Dominance::new(Objectives::AgeFitness, &pop, true);
        assert_eq!(d.front(&pop), vec![true, true, false, false]);
    }

    #[test]
    fn test_trim_keeps_front_and_reaches_target() {
        let mut rng = create_rng(42);
        for seed in 0..20u64 {
            let mut pop: Vec<_> = (0..30)
                .map(|i| {
                    let fitness = ((i * 7 + seed as usize) % 11) as f64 / 10.0;
                    member("D0", fitness, (i * 3) % 8, "", i as u64)
                })
                .collect();
            let d = Dominance::new(Objectives::AgeFitness, &pop, true);
            let front: Vec<u64> = pop
                .iter()
                .zip(d.front(&pop))
                .filter(|(_, f)| *f)
                .map(|(i, _)| i.id().unwrap().serial)
                .collect();

            let removed = trim(&mut pop, &d, 12, 4, &mut rng);
            assert_eq!(removed + pop.len(), 30);
            assert!(pop.len() <= 12.max(front.len()));
            for serial in &front {
                assert!(pop.iter().any(|i| i.id().unwrap().serial == *serial));
            }
        }
    }

    #[test]
    fn test_trim_whole_front_untouched() {
        let mut pop = vec![member("D0", 0.9, 3, "", 0), member("D1", 0.5, 1, "", 1)];
        let d = Dominance::new(Objectives::AgeFitness, &pop, true);
        assert_eq!(trim(&mut pop, &d, 1, 7, &mut create_rng(1)), 0);
        assert_eq!(pop.len(), 2);
    }
}
