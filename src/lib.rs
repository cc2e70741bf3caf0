//! Weekly timetable generation for schools and colleges.
//!
//! [`solver::generate`] is the entry point: it validates the institution
//! data, evolves a population of candidate schedules, repairs whatever
//! conflicts survive the search and reports the result with statistics.

pub mod config;
pub mod data;
pub mod detector;
pub mod error;
pub mod fitness;
pub mod generator;
pub mod grid;
pub mod optimizer;
pub mod report;
pub mod resolver;
pub mod solver;
pub mod validation;

pub use config::OptimizationConfig;
pub use data::{InstitutionData, OptimizationResult};
pub use error::ConfigError;
pub use solver::generate;
