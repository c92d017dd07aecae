//! Cohort data structures, loading and generation

mod data;
pub mod generator;
pub mod loader;

pub use data::{Individual, Insurance, Race, Sex};
pub use generator::{generate_cohort, CohortProportions};
pub use loader::{load_cohort, load_cohort_from_reader, write_cohort};
