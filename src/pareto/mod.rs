//! Multi-objective age/diversity/fitness Pareto survival.
//!
//! Survivors are chosen by Pareto dominance over a configurable objective
//! set: genotypic age (younger is better), the density of the
//! individual's structural niche (rarer is better) and fitness.
//!
//! # Key Types
//!
//! - [`ParetoConfig`]: Objective set, tag window and injection policy
//! - [`ParetoGp`]: The Pareto engine
//! - [`Dominance`]: Dominance relation over a population snapshot
//! - [`DiversityTracker`]: Tagger with run-wide tag memory
//!
//! # Functions
//!
//! - [`tag`]: Structural tag of a tree window
//! - [`trim`]: Tournament deletion that preserves the non-dominated front

mod config;
mod diversity;
mod dominance;
mod runner;

pub use config::{Objectives, ParetoConfig};
pub use diversity::{tag, tag_densities, DiversityTracker};
pub use dominance::{trim, Dominance};
pub use runner::ParetoGp;
