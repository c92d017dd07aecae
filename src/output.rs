//! Result writers
//!
//! Layout under an output directory:
//!
//! ```text
//! <out>/run_manifest.json
//! <out>/<framework>/treatment_effect.csv
//! <out>/<framework>/<arm>/HS_state.csv
//! <out>/<framework>/<arm>/DNH_state.csv
//! <out>/<framework>/<arm>/total_trace.csv
//! <out>/<framework>/<arm>/occupancy.csv
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;

use crate::analysis::{dnh_occupancy, hs_occupancy, EffectRow, OutcomeColumn};
use crate::assumptions::{ModelFramework, ModelParameters, TreatmentArm};
use crate::error::SimResult;
use crate::simulation::{ArmResult, DnhState, HsState, StateSpace};

pub const HS_STATE_FILE: &str = "HS_state.csv";
pub const DNH_STATE_FILE: &str = "DNH_state.csv";
pub const TOTAL_TRACE_FILE: &str = "total_trace.csv";
pub const OCCUPANCY_FILE: &str = "occupancy.csv";
pub const TREATMENT_EFFECT_FILE: &str = "treatment_effect.csv";
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Directory holding one framework's results
pub fn framework_dir(out: &Path, framework: ModelFramework) -> PathBuf {
    out.join(framework.code())
}

/// Directory holding one arm's results
pub fn arm_dir(out: &Path, framework: ModelFramework, arm: TreatmentArm) -> PathBuf {
    framework_dir(out, framework).join(arm.code())
}

fn year_headers(prefix: &str, entries: usize) -> Vec<String> {
    (0..entries).map(|t| format!("{}{}", prefix, t)).collect()
}

fn trace_width(result: &ArmResult) -> usize {
    result.trajectories.iter().map(|t| t.len()).max().unwrap_or(0)
}

/// HS trajectories, one row per individual (`HSYear0..`)
pub fn write_hs_states<W: Write>(writer: W, result: &ArmResult) -> SimResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(year_headers("HSYear", trace_width(result)))?;
    for traj in &result.trajectories {
        wtr.write_record(traj.hs().iter().map(HsState::as_str))?;
    }
    wtr.flush()?;
    Ok(())
}

/// DNH trajectories, one row per individual (`Year0..`)
pub fn write_dnh_states<W: Write>(writer: W, result: &ArmResult) -> SimResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(year_headers("Year", trace_width(result)))?;
    for traj in &result.trajectories {
        wtr.write_record(traj.dnh().iter().map(DnhState::as_str))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Cohort covariates, both traces and all outcomes side by side
pub fn write_total_trace<W: Write>(writer: W, result: &ArmResult) -> SimResult<()> {
    let width = trace_width(result);
    let mut wtr = Writer::from_writer(writer);

    let mut header: Vec<String> = ["id", "seed", "starting_age", "race", "sex", "insurance", "place"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(year_headers("Year", width));
    header.extend(year_headers("HSYear", width));
    header.extend(
        [
            "years_to_death",
            "discounted_LY",
            "QALY",
            "discounted_QALY",
            "cost",
            "discounted_cost",
            "death_age",
            "years_sick",
            "years_sick_treated",
            "years_sick_untreated",
            "was_sick",
            "was_treated",
            "treatment_type",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    wtr.write_record(&header)?;

    let rows = result.cohort.iter().zip(&result.trajectories).zip(&result.outcomes);
    for ((person, traj), out) in rows {
        let mut record: Vec<String> = vec![
            person.id.to_string(),
            person.seed.to_string(),
            person.starting_age.to_string(),
            person.race.as_str().to_string(),
            person.sex.as_str().to_string(),
            person.insurance.as_str().to_string(),
            person.place.as_str().to_string(),
        ];
        record.extend(traj.dnh().iter().map(|s| s.as_str().to_string()));
        record.extend(traj.hs().iter().map(|s| s.as_str().to_string()));
        record.extend([
            out.years_to_death.to_string(),
            out.discounted_ly.to_string(),
            out.qaly.to_string(),
            out.discounted_qaly.to_string(),
            out.cost.to_string(),
            out.discounted_cost.to_string(),
            out.death_age.to_string(),
            out.years_sick.to_string(),
            out.years_sick_treated.to_string(),
            out.years_sick_untreated.to_string(),
            u8::from(out.was_sick).to_string(),
            u8::from(out.was_treated).to_string(),
            result.arm.label().to_string(),
        ]);
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Per-cycle DNH occupancy over the cohort and HS occupancy over the living
pub fn write_occupancy<W: Write>(writer: W, result: &ArmResult) -> SimResult<()> {
    let dnh = dnh_occupancy(&result.trajectories);
    let hs = hs_occupancy(&result.trajectories);

    let mut wtr = Writer::from_writer(writer);
    let mut header = vec!["cycle".to_string()];
    header.extend(DnhState::ALL.iter().map(|s| s.as_str().to_string()));
    header.extend(HsState::ALL.iter().map(|s| s.as_str().to_string()));
    wtr.write_record(&header)?;

    for (t, (d, h)) in dnh.iter().zip(&hs).enumerate() {
        let mut record = vec![t.to_string()];
        record.extend(d.iter().map(|v| v.to_string()));
        record.extend(h.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Effect table; undefined estimates are written as empty cells
pub fn write_effect_table<W: Write>(writer: W, rows: &[EffectRow]) -> SimResult<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record([
        "race",
        "column",
        "SC mean",
        "SC se",
        "NT mean",
        "NT se",
        "Diff mean",
        "Diff se",
        "Diff ci_low",
        "Diff ci_high",
    ])?;
    for row in rows {
        let ci = row.diff.confidence_interval_95();
        wtr.write_record([
            row.race.as_str().to_string(),
            row.column.name().to_string(),
            opt(row.sc.mean),
            opt(row.sc.se),
            opt(row.nt.mean),
            opt(row.nt.se),
            opt(row.diff.mean),
            opt(row.diff.se),
            opt(ci.map(|(lo, _)| lo)),
            opt(ci.map(|(_, hi)| hi)),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every per-arm file into `<out>/<framework>/<arm>/`
pub fn write_arm(out: &Path, result: &ArmResult) -> SimResult<PathBuf> {
    let dir = arm_dir(out, result.framework, result.arm);
    fs::create_dir_all(&dir)?;

    write_hs_states(File::create(dir.join(HS_STATE_FILE))?, result)?;
    write_dnh_states(File::create(dir.join(DNH_STATE_FILE))?, result)?;
    write_total_trace(File::create(dir.join(TOTAL_TRACE_FILE))?, result)?;
    write_occupancy(File::create(dir.join(OCCUPANCY_FILE))?, result)?;

    log::info!("Wrote {} individuals to {}", result.len(), dir.display());
    Ok(dir)
}

/// Write the effect table into `<out>/<framework>/`
pub fn write_effects(out: &Path, framework: ModelFramework, rows: &[EffectRow]) -> SimResult<PathBuf> {
    let dir = framework_dir(out, framework);
    fs::create_dir_all(&dir)?;
    let path = dir.join(TREATMENT_EFFECT_FILE);
    write_effect_table(File::create(&path)?, rows)?;
    Ok(path)
}

/// Record of what a run used and produced
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub created_at: DateTime<Utc>,
    pub cohort_size: usize,
    pub frameworks: Vec<ModelFramework>,
    pub life_tables: String,
    pub columns: Vec<&'static str>,
    pub parameters: ModelParameters,
}

impl RunManifest {
    pub fn new(
        cohort_size: usize,
        frameworks: Vec<ModelFramework>,
        life_tables: &Path,
        parameters: ModelParameters,
    ) -> Self {
        Self {
            created_at: Utc::now(),
            cohort_size,
            frameworks,
            life_tables: life_tables.display().to_string(),
            columns: OutcomeColumn::ALL.iter().map(|c| c.name()).collect(),
            parameters,
        }
    }

    pub fn write(&self, out: &Path) -> SimResult<PathBuf> {
        fs::create_dir_all(out)?;
        let path = out.join(MANIFEST_FILE);
        serde_json::to_writer_pretty(File::create(&path)?, self)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TreatmentEffectEstimator;
    use crate::assumptions::MortalityTables;
    use crate::cohort::{Individual, Insurance, Race, Sex};
    use crate::simulation::{SimulationEngine, StandardModel};

    fn run(arm: TreatmentArm) -> ArmResult {
        let params = ModelParameters::default();
        let tables = MortalityTables::uniform(0.02).unwrap();
        let model = StandardModel::new(&params, &tables);
        let cohort: Vec<Individual> = (0..4)
            .map(|i| {
                let race = if i % 2 == 0 { Race::Nhb } else { Race::Nhw };
                Individual::new(i, 10 + i, 40, race, Sex::Female, Insurance::Insured, HsState::InSystem)
            })
            .collect();
        SimulationEngine::new(&model).run_arm(&cohort, arm).unwrap()
    }

    fn read(bytes: Vec<u8>) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let header = rdr.headers().unwrap().clone();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (header, rows)
    }

    #[test]
    fn test_state_tables() {
        let result = run(TreatmentArm::StandardOfCare);
        let mut buf = Vec::new();
        write_dnh_states(&mut buf, &result).unwrap();
        let (header, rows) = read(buf);

        assert_eq!(header.len(), 62);
        assert_eq!(&header[0], "Year0");
        assert_eq!(&header[61], "Year61");
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "H");
        assert_eq!(&rows[0][61], "D");

        let mut buf = Vec::new();
        write_hs_states(&mut buf, &result).unwrap();
        let (header, rows) = read(buf);
        assert_eq!(&header[0], "HSYear0");
        assert_eq!(&rows[1][0], "IHS");
    }

    #[test]
    fn test_total_trace_columns() {
        let result = run(TreatmentArm::NewTreatment);
        let mut buf = Vec::new();
        write_total_trace(&mut buf, &result).unwrap();
        let (header, rows) = read(buf);

        assert_eq!(header.len(), 7 + 62 * 2 + 13);
        assert_eq!(&header[3], "race");
        assert_eq!(header.iter().last(), Some("treatment_type"));
        assert_eq!(rows[0].iter().last(), Some("New Treatment"));
        let was_sick = header.iter().position(|h| h == "was_sick").unwrap();
        assert!(matches!(&rows[0][was_sick], "0" | "1"));
    }

    #[test]
    fn test_effect_table_blanks_undefined() {
        let sc = run(TreatmentArm::StandardOfCare);
        let nt = run(TreatmentArm::NewTreatment);
        let rows = TreatmentEffectEstimator::new().estimate(&sc, &nt).unwrap();

        let mut buf = Vec::new();
        write_effect_table(&mut buf, &rows).unwrap();
        let (header, records) = read(buf);
        assert_eq!(&header[2], "SC mean");
        assert_eq!(records.len(), 22);
        for rec in records.iter().filter(|r| &r[1] == "years_to_death") {
            assert!(!rec[2].is_empty());
            assert!(!rec[6].is_empty());
        }
    }

    #[test]
    fn test_layout_paths() {
        let out = Path::new("results");
        assert_eq!(
            arm_dir(out, ModelFramework::SocialFramework, TreatmentArm::NewTreatment),
            Path::new("results/framework/nt")
        );
        assert_eq!(framework_dir(out, ModelFramework::Standard), Path::new("results/standard"));
    }

    #[test]
    fn test_manifest_serializes() {
        let manifest = RunManifest::new(
            4,
            vec![ModelFramework::Standard],
            Path::new("data/life_tables"),
            ModelParameters::default(),
        );
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["cohort_size"], 4);
        assert_eq!(json["frameworks"][0], "Standard");
        assert_eq!(json["parameters"]["starting_age"], 40);
        assert!(json["created_at"].is_string());
    }
}
