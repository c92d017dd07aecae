//! Model assumptions: life tables and the parameter set

mod mortality;
mod parameters;
pub mod loader;

pub use mortality::{
    to_probability, to_rate, InsuranceLifeTable, InsuranceMortalityTables, LifeTable,
    MortalityTables, SickMortalityConversion, MAX_TABLE_AGE, TABLE_ROWS,
};
pub use parameters::{
    CareRates, InsuranceEffects, ModelFramework, ModelParameters, OutcomeWeights,
    SicknessMortality, StateValues, TransitionRates, TreatmentArm, TreatmentCosts,
};

use crate::error::SimResult;
use std::path::Path;

/// Container for everything a run reads but never mutates
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub parameters: ModelParameters,
    pub mortality: MortalityTables,
}

impl Assumptions {
    pub fn new(parameters: ModelParameters, mortality: MortalityTables) -> SimResult<Self> {
        parameters.validate()?;
        Ok(Self { parameters, mortality })
    }

    /// Load life tables from the default location (data/life_tables/)
    /// with default parameters
    pub fn from_csv() -> SimResult<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_LIFE_TABLE_PATH), ModelParameters::default())
    }

    /// Load life tables from a specific directory
    pub fn from_csv_path(path: &Path, parameters: ModelParameters) -> SimResult<Self> {
        let mortality = loader::load_mortality_tables(path)?;
        Self::new(parameters, mortality)
    }
}
