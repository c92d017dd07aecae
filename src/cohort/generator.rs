//! Synthetic cohort generation from demographic proportions
//!
//! Every draw flows from a single master seed so a cohort is fully
//! reproducible. Columns are drawn one at a time (all seeds, then all races,
//! then sexes, insurance and place), so growing the cohort never changes the
//! covariates of earlier individuals within a column.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use super::{Individual, Insurance, Race, Sex};
use crate::error::{SimError, SimResult};
use crate::simulation::HsState;

/// Master seed used when none is supplied
pub const DEFAULT_MASTER_SEED: u64 = 1234;

/// Per-individual seeds are drawn uniformly from this half-open range
const SEED_RANGE: std::ops::Range<u64> = 1..1_000_000;

/// Demographic and utilization proportions estimated from survey data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortProportions {
    /// Share of the cohort that is non-Hispanic Black
    pub prop_black: f64,
    /// Share of the cohort that is female
    pub prop_female: f64,
    /// Share insured among non-Hispanic Black individuals
    pub insured_prop_nhb: f64,
    /// Share insured among non-Hispanic white individuals
    pub insured_prop_nhw: f64,
    /// Share with a routine place for care among the insured
    pub place_prop_insured: f64,
    /// Share with a routine place for care among the uninsured
    pub place_prop_uninsured: f64,
}

impl CohortProportions {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let file = File::open(path)?;
        let proportions: Self = serde_json::from_reader(file)?;
        proportions.validate()?;
        Ok(proportions)
    }

    /// Read one single-value JSON file per proportion (`[0.123]`) from a
    /// survey-input directory, e.g. `prop_black.json`, `insurance_prop_NHB.json`
    pub fn from_input_dir<P: AsRef<Path>>(dir: P) -> SimResult<Self> {
        let dir = dir.as_ref();
        let read = |file_name: &'static str| -> SimResult<f64> {
            let values: Vec<f64> = serde_json::from_reader(File::open(dir.join(file_name))?)?;
            values.first().copied().ok_or(SimError::InvalidParameter {
                name: file_name,
                value: f64::NAN,
                reason: "proportion file holds no value",
            })
        };
        let proportions = Self {
            prop_black: read("prop_black.json")?,
            prop_female: read("prop_female.json")?,
            insured_prop_nhb: read("insurance_prop_NHB.json")?,
            insured_prop_nhw: read("insurance_prop_NHW.json")?,
            place_prop_insured: read("place_prop_insured.json")?,
            place_prop_uninsured: read("place_prop_uninsured.json")?,
        };
        proportions.validate()?;
        Ok(proportions)
    }

    pub fn validate(&self) -> SimResult<()> {
        let fields = [
            ("prop_black", self.prop_black),
            ("prop_female", self.prop_female),
            ("insured_prop_nhb", self.insured_prop_nhb),
            ("insured_prop_nhw", self.insured_prop_nhw),
            ("place_prop_insured", self.place_prop_insured),
            ("place_prop_uninsured", self.place_prop_uninsured),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidParameter {
                    name,
                    value,
                    reason: "proportion must lie in [0, 1]",
                });
            }
        }
        Ok(())
    }

    fn insured_prop(&self, race: Race) -> f64 {
        match race {
            Race::Nhb => self.insured_prop_nhb,
            Race::Nhw => self.insured_prop_nhw,
        }
    }

    fn place_prop(&self, insurance: Insurance) -> f64 {
        match insurance {
            Insurance::Insured => self.place_prop_insured,
            Insurance::Uninsured => self.place_prop_uninsured,
        }
    }
}

/// Generate `size` individuals, all entering at `starting_age`
pub fn generate_cohort(
    size: usize,
    starting_age: u32,
    proportions: &CohortProportions,
    master_seed: u64,
) -> SimResult<Vec<Individual>> {
    proportions.validate()?;
    let mut rng = Pcg64Mcg::seed_from_u64(master_seed);

    let seeds: Vec<u64> = (0..size).map(|_| rng.gen_range(SEED_RANGE)).collect();

    let races: Vec<Race> = (0..size)
        .map(|_| if rng.gen::<f64>() < proportions.prop_black { Race::Nhb } else { Race::Nhw })
        .collect();

    let sexes: Vec<Sex> = (0..size)
        .map(|_| if rng.gen::<f64>() < proportions.prop_female { Sex::Female } else { Sex::Male })
        .collect();

    let insurance: Vec<Insurance> = races
        .iter()
        .map(|&race| {
            if rng.gen::<f64>() < proportions.insured_prop(race) {
                Insurance::Insured
            } else {
                Insurance::Uninsured
            }
        })
        .collect();

    let places: Vec<HsState> = insurance
        .iter()
        .map(|&status| {
            if rng.gen::<f64>() < proportions.place_prop(status) {
                HsState::InSystem
            } else {
                HsState::OutOfSystem
            }
        })
        .collect();

    let cohort = (0..size)
        .map(|i| Individual::new(i as u64, seeds[i], starting_age, races[i], sexes[i], insurance[i], places[i]))
        .collect();

    log::info!("Generated cohort of {} individuals (master seed {})", size, master_seed);
    Ok(cohort)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proportions() -> CohortProportions {
        CohortProportions {
            prop_black: 0.3,
            prop_female: 0.5,
            insured_prop_nhb: 0.85,
            insured_prop_nhw: 0.9,
            place_prop_insured: 0.9,
            place_prop_uninsured: 0.6,
        }
    }

    #[test]
    fn test_same_master_seed_same_cohort() {
        let a = generate_cohort(200, 40, &proportions(), DEFAULT_MASTER_SEED).unwrap();
        let b = generate_cohort(200, 40, &proportions(), DEFAULT_MASTER_SEED).unwrap();
        assert_eq!(a, b);

        let c = generate_cohort(200, 40, &proportions(), 99).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_ids_ages_and_seed_range() {
        let cohort = generate_cohort(500, 45, &proportions(), 7).unwrap();
        for (i, person) in cohort.iter().enumerate() {
            assert_eq!(person.id, i as u64);
            assert_eq!(person.starting_age, 45);
            assert!(SEED_RANGE.contains(&person.seed));
            assert!(matches!(person.place, HsState::InSystem | HsState::OutOfSystem));
        }
    }

    #[test]
    fn test_degenerate_proportions() {
        let props = CohortProportions {
            prop_black: 1.0,
            prop_female: 0.0,
            insured_prop_nhb: 0.0,
            insured_prop_nhw: 1.0,
            place_prop_insured: 1.0,
            place_prop_uninsured: 0.0,
        };
        let cohort = generate_cohort(50, 40, &props, 1).unwrap();
        assert!(cohort.iter().all(|p| p.race == Race::Nhb));
        assert!(cohort.iter().all(|p| p.sex == Sex::Male));
        assert!(cohort.iter().all(|p| p.insurance == Insurance::Uninsured));
        assert!(cohort.iter().all(|p| p.place == HsState::OutOfSystem));
    }

    #[test]
    fn test_rejects_out_of_range_proportion() {
        let mut props = proportions();
        props.prop_female = 1.2;
        assert!(generate_cohort(10, 40, &props, 1).is_err());
    }

    #[test]
    fn test_reads_survey_input_dir() {
        let dir = std::env::temp_dir().join(format!("microsim_props_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let values = [
            ("prop_black.json", 0.12),
            ("prop_female.json", 0.51),
            ("insurance_prop_NHB.json", 0.86),
            ("insurance_prop_NHW.json", 0.91),
            ("place_prop_insured.json", 0.88),
            ("place_prop_uninsured.json", 0.55),
        ];
        for (name, value) in values {
            std::fs::write(dir.join(name), format!("[{}]", value)).unwrap();
        }

        let props = CohortProportions::from_input_dir(&dir).unwrap();
        assert_eq!(props.prop_black, 0.12);
        assert_eq!(props.insured_prop_nhw, 0.91);
        assert_eq!(props.place_prop_uninsured, 0.55);

        std::fs::write(dir.join("prop_female.json"), "[]").unwrap();
        assert!(CohortProportions::from_input_dir(&dir).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
