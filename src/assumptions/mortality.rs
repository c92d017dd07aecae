//! Mortality assumptions based on race- and sex-specific period life tables
//!
//! The mortality model separates:
//! - Baseline one-year death probabilities (qx) by race, sex and age
//! - An optional insurance stratification that splits the baseline hazard
//!   between insured and uninsured sub-populations
//! - The conversion used to scale a probability by a hazard multiplier
//!
//! Tables cover ages 0-100. Mortality at or beyond the terminal age is
//! certain; enforcing that is the simulation engine's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cohort::{Insurance, Race, Sex};
use crate::error::{SimError, SimResult};

/// Rows kept from each source table (ages 0 through 100)
pub const TABLE_ROWS: usize = 101;

/// Last age carried by a table
pub const MAX_TABLE_AGE: u32 = 100;

/// Convert a one-year probability to a constant instantaneous rate
pub fn to_rate(prob: f64) -> f64 {
    -(1.0 - prob).ln()
}

/// Convert a constant instantaneous rate to a one-year probability
pub fn to_probability(rate: f64) -> f64 {
    1.0 - (-rate).exp()
}

/// Method for scaling a death probability by a hazard multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SickMortalityConversion {
    /// p' = prob(rate(p) * rr)
    Hazard,
    /// p' = prob(prob(p) * rr)
    ///
    /// Passes the probability through the rate-to-probability transform
    /// before scaling. Published results were produced with this chain.
    ProbabilityChain,
}

impl SickMortalityConversion {
    /// Scale a one-year death probability by `multiplier`
    pub fn scale(&self, prob: f64, multiplier: f64) -> f64 {
        let rate = match self {
            SickMortalityConversion::Hazard => to_rate(prob),
            SickMortalityConversion::ProbabilityChain => to_probability(prob),
        };
        let scaled = rate * multiplier;
        to_probability(scaled)
    }
}

impl Default for SickMortalityConversion {
    fn default() -> Self {
        SickMortalityConversion::ProbabilityChain
    }
}

/// Baseline qx for one race/sex group, indexed by age
#[derive(Debug, Clone, PartialEq)]
pub struct LifeTable {
    name: String,
    qx: Vec<f64>,
}

impl LifeTable {
    /// Build a table, keeping exactly the first `TABLE_ROWS` rows.
    ///
    /// Source tables often carry an open-ended final row or trailing notes;
    /// everything past age 100 is dropped.
    pub fn new(name: impl Into<String>, mut qx: Vec<f64>) -> SimResult<Self> {
        let name = name.into();
        if qx.len() < TABLE_ROWS {
            return Err(SimError::LifeTableTooShort {
                name,
                rows: qx.len(),
                required: TABLE_ROWS,
            });
        }
        qx.truncate(TABLE_ROWS);
        if let Some(bad) = qx.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(SimError::InvalidParameter {
                name: "qx",
                value: *bad,
                reason: "life-table probability must lie in [0, 1]",
            });
        }
        Ok(Self { name, qx })
    }

    /// Same qx at every age
    pub fn constant(name: impl Into<String>, q: f64) -> SimResult<Self> {
        Self::new(name, vec![q; TABLE_ROWS])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-year death probability at `age`; certain beyond the table
    pub fn qx(&self, age: u32) -> f64 {
        self.qx.get(age as usize).copied().unwrap_or(1.0)
    }

    /// Split the baseline hazard between insured and uninsured lives.
    ///
    /// With uninsured prevalence `p_r` and uninsured hazard ratio `hr`, the
    /// insured rate is `rate / (p_r + hr * (1 - p_r))` as published. That
    /// split recovers the baseline when the insured rate carries weight
    /// `p_r` and the uninsured rate `1 - p_r`, not the other way round.
    /// Age 100 is certain death for both groups.
    pub fn stratify_by_insurance(&self, p_r: f64, hr: f64) -> InsuranceLifeTable {
        let mut insured = Vec::with_capacity(self.qx.len());
        let mut uninsured = Vec::with_capacity(self.qx.len());

        for (age, &q) in self.qx.iter().enumerate() {
            if age as u32 == MAX_TABLE_AGE {
                insured.push(1.0);
                uninsured.push(1.0);
                continue;
            }
            let rate = to_rate(q);
            let q_insured = to_probability(rate / (p_r + hr * (1.0 - p_r)));
            let q_uninsured = to_probability(to_rate(q_insured) * hr);
            insured.push(q_insured);
            uninsured.push(q_uninsured);
        }

        InsuranceLifeTable { insured, uninsured }
    }
}

/// Insured/uninsured qx derived from a baseline table
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceLifeTable {
    insured: Vec<f64>,
    uninsured: Vec<f64>,
}

impl InsuranceLifeTable {
    pub fn insured(&self, age: u32) -> f64 {
        self.insured.get(age as usize).copied().unwrap_or(1.0)
    }

    pub fn uninsured(&self, age: u32) -> f64 {
        self.uninsured.get(age as usize).copied().unwrap_or(1.0)
    }

    pub fn qx(&self, age: u32, insurance: Insurance) -> f64 {
        match insurance {
            Insurance::Insured => self.insured(age),
            Insurance::Uninsured => self.uninsured(age),
        }
    }
}

/// Baseline life tables for every race/sex group in the cohort
#[derive(Debug, Clone, Default)]
pub struct MortalityTables {
    tables: HashMap<(Race, Sex), LifeTable>,
}

impl MortalityTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, race: Race, sex: Sex, table: LifeTable) {
        self.tables.insert((race, sex), table);
    }

    /// Tables with the same qx for every group and age
    pub fn uniform(q: f64) -> SimResult<Self> {
        let mut tables = Self::new();
        for race in Race::ALL {
            for sex in Sex::ALL {
                let name = format!("{}{}", race.as_str(), sex.as_str());
                tables.insert(race, sex, LifeTable::constant(name, q)?);
            }
        }
        Ok(tables)
    }

    pub fn table(&self, race: Race, sex: Sex) -> SimResult<&LifeTable> {
        self.tables
            .get(&(race, sex))
            .ok_or_else(|| SimError::MissingMortalityTable {
                race: race.as_str().to_string(),
                sex: sex.as_str().to_string(),
            })
    }

    /// Baseline one-year death probability
    pub fn lookup(&self, race: Race, sex: Sex, age: u32) -> SimResult<f64> {
        Ok(self.table(race, sex)?.qx(age))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Derive insurance-stratified tables once, using each race's
    /// uninsured prevalence
    pub fn stratify_by_insurance(
        &self,
        uninsured_prevalence: impl Fn(Race) -> f64,
        hazard_ratio: f64,
    ) -> InsuranceMortalityTables {
        let tables = self
            .tables
            .iter()
            .map(|(&(race, sex), table)| {
                let stratified = table.stratify_by_insurance(uninsured_prevalence(race), hazard_ratio);
                ((race, sex), stratified)
            })
            .collect();
        InsuranceMortalityTables { tables }
    }
}

/// Insurance-stratified tables for every race/sex group
#[derive(Debug, Clone, Default)]
pub struct InsuranceMortalityTables {
    tables: HashMap<(Race, Sex), InsuranceLifeTable>,
}

impl InsuranceMortalityTables {
    fn table(&self, race: Race, sex: Sex) -> SimResult<&InsuranceLifeTable> {
        self.tables
            .get(&(race, sex))
            .ok_or_else(|| SimError::MissingMortalityTable {
                race: race.as_str().to_string(),
                sex: sex.as_str().to_string(),
            })
    }

    pub fn lookup_insured(&self, race: Race, sex: Sex, age: u32) -> SimResult<f64> {
        Ok(self.table(race, sex)?.insured(age))
    }

    pub fn lookup_uninsured(&self, race: Race, sex: Sex, age: u32) -> SimResult<f64> {
        Ok(self.table(race, sex)?.uninsured(age))
    }

    pub fn lookup(&self, race: Race, sex: Sex, insurance: Insurance, age: u32) -> SimResult<f64> {
        Ok(self.table(race, sex)?.qx(age, insurance))
    }
}
