//! Age-layered population structure (ALPS).
//!
//! The population is split into layers by genotypic age. Fresh random
//! individuals enter at the bottom on a fixed schedule, and individuals
//! move up as they age, so new material never competes directly with
//! long-refined programs.
//!
//! # Key Types
//!
//! - [`LayeredConfig`]: Layer count and age gap
//! - [`LayeredGp`]: The layered engine
//! - [`LayerScheme`]: Age ceilings and layer schedule ([`AlpsScheme`] by default)

mod config;
mod runner;
mod scheme;

pub use config::LayeredConfig;
pub use runner::LayeredGp;
pub use scheme::{max_age, AlpsScheme, LayerScheme};
