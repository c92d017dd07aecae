//! Cohort-level summaries of simulated arms

mod effect;
mod occupancy;

pub use effect::{combine_se, EffectRow, Estimate, OutcomeColumn, TreatmentEffectEstimator};
pub use occupancy::{dnh_occupancy, hs_occupancy};
