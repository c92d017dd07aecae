//! Two-layer Markov microsimulation
//!
//! - `state`: DNH and HS state spaces and trajectories
//! - `sampling`: validated transition vectors and per-individual streams
//! - `transitions`: Standard and Social-Framework transition models
//! - `engine`: per-individual simulation and parallel cohort runs
//! - `outcomes`: life years, QALYs, costs and sickness counters

mod engine;
mod outcomes;
mod sampling;
mod state;
mod transitions;

pub use engine::{ArmResult, SimulationEngine};
pub use outcomes::{DiscountVector, OutcomeAggregator, OutcomeRecord};
pub use sampling::{IndividualRng, TransitionVector, SUM_TOLERANCE};
pub use state::{DnhState, HsState, StateSpace, Trajectory};
pub use transitions::{
    dnh_vector, hs_vector, DnhTransition, HsTransition, SocialFrameworkModel, StandardModel,
    TransitionModel,
};
