//! Paired treatment-effect estimation across two arms
//!
//! Both arms must come from the same cohort with the same seeds, so row `i`
//! of one arm and row `i` of the other describe the same individual. The
//! paired difference NT - SC then isolates the treatment effect from
//! sampling noise.

use serde::Serialize;

use crate::cohort::Race;
use crate::error::{SimError, SimResult};
use crate::simulation::{ArmResult, OutcomeRecord};

/// z-value for a two-sided 95% normal interval
const Z_95: f64 = 1.96;

/// Outcome columns reported in the effect table, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeColumn {
    YearsToDeath,
    DiscountedLy,
    Qaly,
    DiscountedQaly,
    Cost,
    DiscountedCost,
    YearsSickTreated,
    YearsSickUntreated,
    YearsSick,
    WasSick,
    WasTreated,
}

impl OutcomeColumn {
    pub const ALL: [OutcomeColumn; 11] = [
        OutcomeColumn::YearsToDeath,
        OutcomeColumn::DiscountedLy,
        OutcomeColumn::Qaly,
        OutcomeColumn::DiscountedQaly,
        OutcomeColumn::Cost,
        OutcomeColumn::DiscountedCost,
        OutcomeColumn::YearsSickTreated,
        OutcomeColumn::YearsSickUntreated,
        OutcomeColumn::YearsSick,
        OutcomeColumn::WasSick,
        OutcomeColumn::WasTreated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutcomeColumn::YearsToDeath => "years_to_death",
            OutcomeColumn::DiscountedLy => "discounted_LY",
            OutcomeColumn::Qaly => "QALY",
            OutcomeColumn::DiscountedQaly => "discounted_QALY",
            OutcomeColumn::Cost => "cost",
            OutcomeColumn::DiscountedCost => "discounted_cost",
            OutcomeColumn::YearsSickTreated => "years_sick_treated",
            OutcomeColumn::YearsSickUntreated => "years_sick_untreated",
            OutcomeColumn::YearsSick => "years_sick",
            OutcomeColumn::WasSick => "was_sick",
            OutcomeColumn::WasTreated => "was_treated",
        }
    }

    pub fn value(&self, record: &OutcomeRecord) -> f64 {
        match self {
            OutcomeColumn::YearsToDeath => record.years_to_death as f64,
            OutcomeColumn::DiscountedLy => record.discounted_ly,
            OutcomeColumn::Qaly => record.qaly,
            OutcomeColumn::DiscountedQaly => record.discounted_qaly,
            OutcomeColumn::Cost => record.cost,
            OutcomeColumn::DiscountedCost => record.discounted_cost,
            OutcomeColumn::YearsSickTreated => record.years_sick_treated as f64,
            OutcomeColumn::YearsSickUntreated => record.years_sick_untreated as f64,
            OutcomeColumn::YearsSick => record.years_sick as f64,
            OutcomeColumn::WasSick => indicator(record.was_sick),
            OutcomeColumn::WasTreated => indicator(record.was_treated),
        }
    }

    /// Columns averaged only over individuals who were ever sick
    pub fn requires_sickness(&self) -> bool {
        matches!(self, OutcomeColumn::YearsSickTreated | OutcomeColumn::YearsSickUntreated)
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Sample mean and standard error of the mean.
///
/// `mean` is undefined for an empty sample and `se` for fewer than two
/// observations; both are reported as `None` rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub n: usize,
    pub mean: Option<f64>,
    pub se: Option<f64>,
}

impl Estimate {
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self { n, mean: None, se: None };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let se = (n >= 2).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            let sd = (ss / (n - 1) as f64).sqrt();
            sd / (n as f64).sqrt()
        });
        Self {
            n,
            mean: Some(mean),
            se,
        }
    }

    /// Normal-approximation 95% interval `mean ± 1.96·se`
    pub fn confidence_interval_95(&self) -> Option<(f64, f64)> {
        let mean = self.mean?;
        let se = self.se?;
        Some((mean - Z_95 * se, mean + Z_95 * se))
    }
}

/// Standard error of a sum or difference of independent estimates
pub fn combine_se(ses: &[f64]) -> f64 {
    ses.iter().map(|se| se * se).sum::<f64>().sqrt()
}

/// One line of the effect table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectRow {
    pub race: Race,
    pub column: OutcomeColumn,
    pub sc: Estimate,
    pub nt: Estimate,
    /// Paired difference NT - SC
    pub diff: Estimate,
}

/// Builds the per-race effect table from a pair of arms
#[derive(Debug, Clone, Copy, Default)]
pub struct TreatmentEffectEstimator;

impl TreatmentEffectEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate arm means and the paired NT - SC difference for every race
    /// and outcome column.
    pub fn estimate(&self, sc: &ArmResult, nt: &ArmResult) -> SimResult<Vec<EffectRow>> {
        verify_pairing(sc, nt)?;

        let mut rows = Vec::with_capacity(Race::ALL.len() * OutcomeColumn::ALL.len());
        for race in Race::ALL {
            let pairs: Vec<(&OutcomeRecord, &OutcomeRecord)> = sc
                .cohort
                .iter()
                .zip(sc.outcomes.iter().zip(&nt.outcomes))
                .filter(|(person, _)| person.race == race)
                .map(|(_, pair)| pair)
                .collect();

            for column in OutcomeColumn::ALL {
                rows.push(estimate_column(race, column, &pairs));
            }
        }

        log::debug!("Estimated {} effect rows for {} pairs", rows.len(), sc.len());
        Ok(rows)
    }
}

fn estimate_column(race: Race, column: OutcomeColumn, pairs: &[(&OutcomeRecord, &OutcomeRecord)]) -> EffectRow {
    let restrict = column.requires_sickness();

    let sc_values: Vec<f64> = pairs
        .iter()
        .filter(|(s, _)| !restrict || s.was_sick)
        .map(|(s, _)| column.value(s))
        .collect();
    let nt_values: Vec<f64> = pairs
        .iter()
        .filter(|(_, n)| !restrict || n.was_sick)
        .map(|(_, n)| column.value(n))
        .collect();
    let diffs: Vec<f64> = pairs
        .iter()
        .filter(|(s, n)| !restrict || (s.was_sick && n.was_sick))
        .map(|(s, n)| column.value(n) - column.value(s))
        .collect();

    EffectRow {
        race,
        column,
        sc: Estimate::from_values(&sc_values),
        nt: Estimate::from_values(&nt_values),
        diff: Estimate::from_values(&diffs),
    }
}

fn verify_pairing(sc: &ArmResult, nt: &ArmResult) -> SimResult<()> {
    if sc.framework != nt.framework {
        return Err(SimError::UnpairedArms {
            reason: format!("frameworks differ ({} vs {})", sc.framework.code(), nt.framework.code()),
        });
    }
    if sc.len() != nt.len() || sc.outcomes.len() != sc.len() || nt.outcomes.len() != nt.len() {
        return Err(SimError::UnpairedArms {
            reason: format!("arm sizes differ ({} vs {})", sc.outcomes.len(), nt.outcomes.len()),
        });
    }
    let mismatch = sc
        .cohort
        .iter()
        .zip(&nt.cohort)
        .position(|(a, b)| a.id != b.id || a.seed != b.seed);
    if let Some(i) = mismatch {
        return Err(SimError::UnpairedArms {
            reason: format!(
                "row {} holds id {} (seed {}) vs id {} (seed {})",
                i, sc.cohort[i].id, sc.cohort[i].seed, nt.cohort[i].id, nt.cohort[i].seed
            ),
        });
    }
    Ok(())
}
