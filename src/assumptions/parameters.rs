//! Model parameters: transition rates, hazard ratios, weights and costs
//!
//! Defaults reproduce the published analysis. Every field can be overridden
//! from a JSON file; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use super::mortality::{to_probability, to_rate, SickMortalityConversion, MAX_TABLE_AGE};
use crate::cohort::{Insurance, Race};
use crate::error::{SimError, SimResult};
use crate::simulation::DnhState;

/// Treatment available to detected individuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentArm {
    StandardOfCare,
    NewTreatment,
}

impl TreatmentArm {
    pub const ALL: [TreatmentArm; 2] = [TreatmentArm::StandardOfCare, TreatmentArm::NewTreatment];

    pub fn label(&self) -> &'static str {
        match self {
            TreatmentArm::StandardOfCare => "Standard of Care",
            TreatmentArm::NewTreatment => "New Treatment",
        }
    }

    /// Short directory-friendly code
    pub fn code(&self) -> &'static str {
        match self {
            TreatmentArm::StandardOfCare => "sc",
            TreatmentArm::NewTreatment => "nt",
        }
    }
}

/// Which transition model drives the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFramework {
    /// Insurance-blind rates; everyone enters in the health system
    Standard,
    /// Insurance-differential care entry, detection, discontinuation and mortality
    SocialFramework,
}

impl ModelFramework {
    pub const ALL: [ModelFramework; 2] = [ModelFramework::Standard, ModelFramework::SocialFramework];

    pub fn code(&self) -> &'static str {
        match self {
            ModelFramework::Standard => "standard",
            ModelFramework::SocialFramework => "framework",
        }
    }
}

/// Base (insured / insurance-blind) transition probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionRates {
    /// Out of health system -> in health system
    pub p_oi: f64,
    /// In health system -> detected/treated (sick only)
    pub p_dt: f64,
    /// Detected/treated -> detected/untreated (discontinuation)
    pub p_dtut: f64,
    /// Healthy -> sick
    pub p_hs: f64,
}

impl Default for TransitionRates {
    fn default() -> Self {
        Self {
            p_oi: 0.05,
            p_dt: 0.20,
            p_dtut: 0.02,
            p_hs: 0.05,
        }
    }
}

/// Insurance effects used by the social-framework model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceEffects {
    /// Relative risk of entering care when uninsured
    pub rr_oi_uninsured: f64,
    /// Relative risk of detection when uninsured
    pub rr_dt_uninsured: f64,
    /// Relative risk of discontinuing treatment when uninsured
    pub rr_dtut_uninsured: f64,
    /// Mortality hazard ratio for the uninsured
    pub mortality_hazard_ratio: f64,
    /// Prevalence of uninsured among non-Hispanic Black individuals
    pub uninsured_prevalence_nhb: f64,
    /// Prevalence of uninsured among non-Hispanic white individuals
    pub uninsured_prevalence_nhw: f64,
}

impl Default for InsuranceEffects {
    fn default() -> Self {
        Self {
            rr_oi_uninsured: 0.20,
            rr_dt_uninsured: 0.20,
            rr_dtut_uninsured: 5.0,
            mortality_hazard_ratio: 1.4,
            uninsured_prevalence_nhb: 0.10,
            uninsured_prevalence_nhw: 0.066,
        }
    }
}

impl InsuranceEffects {
    pub fn uninsured_prevalence(&self, race: Race) -> f64 {
        match race {
            Race::Nhb => self.uninsured_prevalence_nhb,
            Race::Nhw => self.uninsured_prevalence_nhw,
        }
    }
}

/// Excess mortality while sick and the treatment effect on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SicknessMortality {
    /// Hazard multiplier for sick individuals not on treatment
    pub rr_sick_untreated: f64,
    /// Treatment hazard ratio under the standard of care
    pub treatment_hr_sc: f64,
    /// Treatment hazard ratio under the new treatment
    pub treatment_hr_nt: f64,
    pub conversion: SickMortalityConversion,
}

impl Default for SicknessMortality {
    fn default() -> Self {
        Self {
            rr_sick_untreated: 4.0,
            treatment_hr_sc: 0.5,
            treatment_hr_nt: 0.25,
            conversion: SickMortalityConversion::default(),
        }
    }
}

impl SicknessMortality {
    pub fn treatment_hr(&self, arm: TreatmentArm) -> f64 {
        match arm {
            TreatmentArm::StandardOfCare => self.treatment_hr_sc,
            TreatmentArm::NewTreatment => self.treatment_hr_nt,
        }
    }
}

/// Per-cycle value attached to each DNH state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    pub healthy: f64,
    pub sick: f64,
    pub dead: f64,
}

impl StateValues {
    pub fn get(&self, state: DnhState) -> f64 {
        match state {
            DnhState::Healthy => self.healthy,
            DnhState::Sick => self.sick,
            DnhState::Dead => self.dead,
        }
    }
}

/// QALY and cost weights by DNH state.
///
/// Life years need no weights: every living cycle counts as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeWeights {
    pub qaly: StateValues,
    pub cost: StateValues,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self {
            qaly: StateValues { healthy: 1.0, sick: 0.7, dead: 0.0 },
            cost: StateValues { healthy: 100.0, sick: 500.0, dead: 0.0 },
        }
    }
}

/// Annual treatment cost while sick and detected/treated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentCosts {
    pub standard_of_care: f64,
    pub new_treatment: f64,
}

impl Default for TreatmentCosts {
    fn default() -> Self {
        Self {
            standard_of_care: 20.0 * 12.0,
            new_treatment: 500.0 * 12.0,
        }
    }
}

impl TreatmentCosts {
    pub fn for_arm(&self, arm: TreatmentArm) -> f64 {
        match arm {
            TreatmentArm::StandardOfCare => self.standard_of_care,
            TreatmentArm::NewTreatment => self.new_treatment,
        }
    }
}

/// Complete, immutable parameter set for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Cohort entry age; fixes the number of cycles
    pub starting_age: u32,
    /// Age at which death is certain
    pub terminal_age: u32,
    /// Annual discount rate
    pub discount_rate: f64,
    pub transitions: TransitionRates,
    pub insurance: InsuranceEffects,
    pub sickness: SicknessMortality,
    pub weights: OutcomeWeights,
    pub treatment_cost: TreatmentCosts,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            starting_age: 40,
            terminal_age: 100,
            discount_rate: 0.03,
            transitions: TransitionRates::default(),
            insurance: InsuranceEffects::default(),
            sickness: SicknessMortality::default(),
            weights: OutcomeWeights::default(),
            treatment_cost: TreatmentCosts::default(),
        }
    }
}

/// HS transition probabilities resolved for one insurance status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CareRates {
    pub p_oi: f64,
    pub p_dt: f64,
    pub p_dtut: f64,
}

impl ModelParameters {
    /// Load parameters from a JSON file; absent fields keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let file = File::open(path)?;
        let params: Self = serde_json::from_reader(file)?;
        params.validate()?;
        Ok(params)
    }

    /// Number of yearly transitions simulated (cohort runs to terminal age + 1)
    pub fn cycles(&self) -> usize {
        (self.terminal_age + 1).saturating_sub(self.starting_age) as usize
    }

    /// Care-pathway rates for the insurance-blind model
    pub fn care_rates(&self) -> CareRates {
        CareRates {
            p_oi: self.transitions.p_oi,
            p_dt: self.transitions.p_dt,
            p_dtut: self.transitions.p_dtut,
        }
    }

    /// Care-pathway rates by insurance status.
    ///
    /// Uninsured values scale the insured rate by the relative risk in the
    /// rate domain.
    pub fn care_rates_for(&self, insurance: Insurance) -> CareRates {
        let base = self.care_rates();
        match insurance {
            Insurance::Insured => base,
            Insurance::Uninsured => {
                let fx = &self.insurance;
                CareRates {
                    p_oi: to_probability(to_rate(base.p_oi) * fx.rr_oi_uninsured),
                    p_dt: to_probability(to_rate(base.p_dt) * fx.rr_dt_uninsured),
                    p_dtut: to_probability(to_rate(base.p_dtut) * fx.rr_dtut_uninsured),
                }
            }
        }
    }

    /// Reject parameter sets that would build invalid transition vectors
    pub fn validate(&self) -> SimResult<()> {
        let probabilities = [
            ("p_oi", self.transitions.p_oi),
            ("p_dt", self.transitions.p_dt),
            ("p_dtut", self.transitions.p_dtut),
            ("p_hs", self.transitions.p_hs),
            ("uninsured_prevalence_nhb", self.insurance.uninsured_prevalence_nhb),
            ("uninsured_prevalence_nhw", self.insurance.uninsured_prevalence_nhw),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    reason: "probability must lie in [0, 1]",
                });
            }
        }

        let multipliers = [
            ("rr_oi_uninsured", self.insurance.rr_oi_uninsured),
            ("rr_dt_uninsured", self.insurance.rr_dt_uninsured),
            ("rr_dtut_uninsured", self.insurance.rr_dtut_uninsured),
            ("mortality_hazard_ratio", self.insurance.mortality_hazard_ratio),
            ("rr_sick_untreated", self.sickness.rr_sick_untreated),
            ("treatment_hr_sc", self.sickness.treatment_hr_sc),
            ("treatment_hr_nt", self.sickness.treatment_hr_nt),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    reason: "hazard multiplier must be finite and non-negative",
                });
            }
        }

        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(SimError::InvalidParameter {
                name: "discount_rate",
                value: self.discount_rate,
                reason: "discount rate must be finite and greater than -1",
            });
        }
        if self.starting_age > self.terminal_age {
            return Err(SimError::InvalidParameter {
                name: "starting_age",
                value: self.starting_age as f64,
                reason: "starting age must not exceed the terminal age",
            });
        }
        if self.terminal_age > MAX_TABLE_AGE {
            return Err(SimError::InvalidParameter {
                name: "terminal_age",
                value: self.terminal_age as f64,
                reason: "life tables end at age 100",
            });
        }
        Ok(())
    }
}
