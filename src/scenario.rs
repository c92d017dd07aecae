//! Scenario runner for paired treatment runs
//!
//! Loads assumptions once, then runs any framework's two arms over a cohort
//! without re-reading life tables.

use std::path::Path;

use crate::analysis::{EffectRow, TreatmentEffectEstimator};
use crate::assumptions::{Assumptions, ModelFramework, ModelParameters, TreatmentArm};
use crate::cohort::Individual;
use crate::error::SimResult;
use crate::simulation::{ArmResult, SimulationEngine, SocialFrameworkModel, StandardModel};

/// Both arms of one framework and their effect table
#[derive(Debug, Clone)]
pub struct PairedRun {
    pub framework: ModelFramework,
    pub sc: ArmResult,
    pub nt: ArmResult,
    pub effects: Vec<EffectRow>,
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
/// let cohort = load_cohort("results/cohort.csv")?;
///
/// for framework in ModelFramework::ALL {
///     let paired = runner.run_paired(framework, &cohort)?;
///     println!("{} effect rows", paired.effects.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    assumptions: Assumptions,
}

impl ScenarioRunner {
    /// Create runner by loading life tables from data/life_tables/
    pub fn from_csv() -> SimResult<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv()?,
        })
    }

    /// Create runner from a specific life table directory
    pub fn from_csv_path(path: &Path, parameters: ModelParameters) -> SimResult<Self> {
        Ok(Self {
            assumptions: Assumptions::from_csv_path(path, parameters)?,
        })
    }

    /// Create runner with pre-built assumptions
    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self { assumptions }
    }

    /// Run one arm of one framework
    pub fn run_arm(&self, framework: ModelFramework, cohort: &[Individual], arm: TreatmentArm) -> SimResult<ArmResult> {
        let params = &self.assumptions.parameters;
        let mortality = &self.assumptions.mortality;
        match framework {
            ModelFramework::Standard => {
                let model = StandardModel::new(params, mortality);
                SimulationEngine::new(&model).run_arm(cohort, arm)
            }
            ModelFramework::SocialFramework => {
                let model = SocialFrameworkModel::new(params, mortality);
                SimulationEngine::new(&model).run_arm(cohort, arm)
            }
        }
    }

    /// Run both arms of a framework with shared seeds and estimate the effect
    pub fn run_paired(&self, framework: ModelFramework, cohort: &[Individual]) -> SimResult<PairedRun> {
        log::info!("Running {} framework over {} individuals", framework.code(), cohort.len());
        let starting_age = self.assumptions.parameters.starting_age;
        let off_age = cohort.iter().filter(|p| p.starting_age != starting_age).count();
        if off_age > 0 {
            // Trace length follows the parameter set, not the individual
            log::warn!(
                "{} individuals do not start at age {}; their traces keep {} cycles",
                off_age,
                starting_age,
                self.assumptions.parameters.cycles()
            );
        }

        let sc = self.run_arm(framework, cohort, TreatmentArm::StandardOfCare)?;
        let nt = self.run_arm(framework, cohort, TreatmentArm::NewTreatment)?;
        let effects = TreatmentEffectEstimator::new().estimate(&sc, &nt)?;

        Ok(PairedRun {
            framework,
            sc,
            nt,
            effects,
        })
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Mutable access for parameter sensitivity runs
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }
}
