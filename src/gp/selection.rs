//! Parent selection strategies.
//!
//! Fitness is maximised: higher is better.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"

use super::individual::Individual;
use crate::error::GpError;
use crate::tree::Primitive;
use rand::seq::index;
use rand::Rng;
use std::str::FromStr;

/// Selection strategy for choosing parents.
///
/// Selection works on a pool of references so that engines can select from
/// views spanning several layers without copying.
///
/// # Examples
///
/// ```
/// use u_gp::gp::Selection;
///
/// let sel: Selection = "random-mating".parse().unwrap();
/// assert_eq!(sel, Selection::RandomMating);
/// assert_eq!(Selection::from_name("tournament", 5).unwrap(), Selection::Tournament(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Draw `k` distinct individuals, keep the fittest. When `k` covers the
    /// pool, the fittest overall wins. Ties go to the first drawn.
    Tournament(usize),

    /// Uniform draw, no selection pressure.
    RandomMating,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(7)
    }
}

impl Selection {
    /// Resolves a strategy by name, using `tournament_size` for tournaments.
    pub fn from_name(name: &str, tournament_size: usize) -> Result<Self, GpError> {
        match name.to_ascii_lowercase().as_str() {
            "tournament" => Ok(Selection::Tournament(tournament_size)),
            "random" | "random-mating" | "random_mating" | "randommating" => {
                Ok(Selection::RandomMating)
            }
            _ => Err(GpError::UnknownStrategy {
                kind: "selection",
                name: name.to_string(),
            }),
        }
    }

    /// Selects one parent index.
    ///
    /// # Panics
    /// Panics if `pool` is empty.
    pub fn select_one<P: Primitive, R: Rng>(&self, pool: &[&Individual<P>], rng: &mut R) -> usize {
        assert!(!pool.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => tournament(pool, *k, rng),
            Selection::RandomMating => rng.random_range(0..pool.len()),
        }
    }

    /// Selects two parent indices, redrawing the second once if it matches
    /// the first.
    pub fn select_pair<P: Primitive, R: Rng>(
        &self,
        pool: &[&Individual<P>],
        rng: &mut R,
    ) -> (usize, usize) {
        let first = self.select_one(pool, rng);
        let mut second = self.select_one(pool, rng);
        if second == first {
            second = self.select_one(pool, rng);
        }
        (first, second)
    }
}

impl FromStr for Selection {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s, 7)
    }
}

fn tournament<P: Primitive, R: Rng>(pool: &[&Individual<P>], k: usize, rng: &mut R) -> usize {
    let n = pool.len();
    let k = k.max(1);
    let contestants: Vec<usize> = if k >= n {
        (0..n).collect()
    } else {
        index::sample(rng, n, k).into_vec()
    };

    let mut best = contestants[0];
    for &i in &contestants[1..] {
        if pool[i].fitness() > pool[best].fitness() {
            best = i;
        }
    }
    best
}
