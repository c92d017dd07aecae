//! Health Microsim - Individual-level Markov microsimulation of lifetime outcomes
//!
//! This library provides:
//! - Synthetic cohort generation and cohort CSV loading
//! - Life tables with insurance-stratified mortality
//! - Two-layer (disease natural history / health system) Markov transitions
//!   under a Standard and a Social-Framework model
//! - Seeded per-individual simulation with common random numbers across arms
//! - Life-year, QALY and cost aggregation with discounting
//! - Paired treatment-effect estimation and state occupancy curves

pub mod error;
pub mod cohort;
pub mod assumptions;
pub mod simulation;
pub mod analysis;
pub mod output;
pub mod scenario;

// Re-export commonly used types
pub use error::{SimError, SimResult};
pub use cohort::{Individual, Insurance, Race, Sex};
pub use assumptions::{Assumptions, ModelFramework, ModelParameters, MortalityTables, TreatmentArm};
pub use simulation::{ArmResult, DnhState, HsState, OutcomeRecord, SimulationEngine, Trajectory};
pub use analysis::{EffectRow, Estimate, TreatmentEffectEstimator};
pub use scenario::{PairedRun, ScenarioRunner};
