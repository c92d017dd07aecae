//! Individual covariates matching the cohort table format

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::simulation::HsState;

/// Race/ethnicity group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    /// Non-Hispanic Black
    #[serde(rename = "NHB")]
    Nhb,
    /// Non-Hispanic white
    #[serde(rename = "NHW")]
    Nhw,
}

impl Race {
    pub const ALL: [Race; 2] = [Race::Nhb, Race::Nhw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Race::Nhb => "NHB",
            Race::Nhw => "NHW",
        }
    }

    pub fn parse(value: &str) -> SimResult<Self> {
        match value.trim() {
            "NHB" => Ok(Race::Nhb),
            "NHW" => Ok(Race::Nhw),
            other => Err(SimError::InvalidCovariate {
                field: "race",
                value: other.to_string(),
            }),
        }
    }
}

/// Sex of the individual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "F",
            Sex::Male => "M",
        }
    }

    pub fn parse(value: &str) -> SimResult<Self> {
        match value.trim() {
            "F" => Ok(Sex::Female),
            "M" => Ok(Sex::Male),
            other => Err(SimError::InvalidCovariate {
                field: "sex",
                value: other.to_string(),
            }),
        }
    }
}

/// Health insurance coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Insurance {
    #[serde(rename = "Y")]
    Insured,
    #[serde(rename = "N")]
    Uninsured,
}

impl Insurance {
    pub fn is_insured(&self) -> bool {
        matches!(self, Insurance::Insured)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Insurance::Insured => "Y",
            Insurance::Uninsured => "N",
        }
    }

    pub fn parse(value: &str) -> SimResult<Self> {
        match value.trim() {
            "Y" => Ok(Insurance::Insured),
            "N" => Ok(Insurance::Uninsured),
            other => Err(SimError::InvalidCovariate {
                field: "insurance",
                value: other.to_string(),
            }),
        }
    }
}

/// A single member of the synthetic cohort.
///
/// Covariates are fixed when the cohort is created and never change during
/// a run. The `seed` keys the individual's private random stream and must be
/// reused for every arm the individual is simulated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: u64,
    pub seed: u64,
    pub starting_age: u32,
    pub race: Race,
    pub sex: Sex,
    pub insurance: Insurance,
    /// Health-system state at cohort entry (`OHS` or `IHS`)
    pub place: HsState,
}

impl Individual {
    pub fn new(
        id: u64,
        seed: u64,
        starting_age: u32,
        race: Race,
        sex: Sex,
        insurance: Insurance,
        place: HsState,
    ) -> Self {
        Self {
            id,
            seed,
            starting_age,
            race,
            sex,
            insurance,
            place,
        }
    }

    /// Attained age at a given cycle index
    pub fn age_at(&self, cycle: usize) -> u32 {
        self.starting_age + cycle as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_covariates() {
        assert_eq!(Race::parse("NHB").unwrap(), Race::Nhb);
        assert_eq!(Sex::parse(" M ").unwrap(), Sex::Male);
        assert_eq!(Insurance::parse("N").unwrap(), Insurance::Uninsured);
    }

    #[test]
    fn test_unknown_covariate_is_rejected() {
        let err = Race::parse("Hispanic").unwrap_err();
        assert!(matches!(err, SimError::InvalidCovariate { field: "race", .. }));
        assert!(Sex::parse("X").is_err());
        assert!(Insurance::parse("maybe").is_err());
    }

    #[test]
    fn test_round_trip_labels() {
        for race in Race::ALL {
            assert_eq!(Race::parse(race.as_str()).unwrap(), race);
        }
        for sex in Sex::ALL {
            assert_eq!(Sex::parse(sex.as_str()).unwrap(), sex);
        }
    }

    #[test]
    fn test_age_at_cycle() {
        let person = Individual::new(0, 7, 40, Race::Nhw, Sex::Female, Insurance::Insured, HsState::InSystem);
        assert_eq!(person.age_at(0), 40);
        assert_eq!(person.age_at(60), 100);
    }
}
