//! Load a cohort from cohort.csv

use super::{Individual, Insurance, Race, Sex};
use crate::error::SimResult;
use crate::simulation::HsState;
use csv::{Reader, Writer};
use std::path::Path;

/// Default location of the generated cohort
pub const DEFAULT_COHORT_PATH: &str = "results/cohort.csv";

/// Raw CSV row matching cohort.csv columns
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct CsvRow {
    id: u64,
    seed: u64,
    starting_age: u32,
    race: String,
    sex: String,
    insurance: String,
    place: String,
}

impl CsvRow {
    fn into_individual(self) -> SimResult<Individual> {
        Ok(Individual {
            id: self.id,
            seed: self.seed,
            starting_age: self.starting_age,
            race: Race::parse(&self.race)?,
            sex: Sex::parse(&self.sex)?,
            insurance: Insurance::parse(&self.insurance)?,
            place: HsState::parse(&self.place)?,
        })
    }

    fn from_individual(person: &Individual) -> Self {
        Self {
            id: person.id,
            seed: person.seed,
            starting_age: person.starting_age,
            race: person.race.as_str().to_string(),
            sex: person.sex.as_str().to_string(),
            insurance: person.insurance.as_str().to_string(),
            place: person.place.as_str().to_string(),
        }
    }
}

/// Load all individuals from a CSV file
pub fn load_cohort<P: AsRef<Path>>(path: P) -> SimResult<Vec<Individual>> {
    let reader = Reader::from_path(path)?;
    read_rows(reader)
}

/// Load a cohort from any reader (e.g., string buffer)
pub fn load_cohort_from_reader<R: std::io::Read>(reader: R) -> SimResult<Vec<Individual>> {
    read_rows(Reader::from_reader(reader))
}

fn read_rows<R: std::io::Read>(mut reader: Reader<R>) -> SimResult<Vec<Individual>> {
    let mut cohort = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        cohort.push(row.into_individual()?);
    }
    Ok(cohort)
}

/// Write a cohort in the same layout `load_cohort` reads
pub fn write_cohort<P: AsRef<Path>>(path: P, cohort: &[Individual]) -> SimResult<()> {
    let mut writer = Writer::from_path(path)?;
    for person in cohort {
        writer.serialize(CsvRow::from_individual(person))?;
    }
    writer.flush()?;
    Ok(())
}
