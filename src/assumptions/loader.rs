//! CSV-based life table loader
//!
//! Loads period life tables from CSV files in data/life_tables/

use std::path::Path;

use super::mortality::{LifeTable, MortalityTables};
use crate::cohort::{Race, Sex};
use crate::error::{SimError, SimResult};

/// Default path to the life table directory
pub const DEFAULT_LIFE_TABLE_PATH: &str = "data/life_tables";

/// File name of the table for a race/sex group
pub fn life_table_file_name(race: Race, sex: Sex) -> &'static str {
    match (race, sex) {
        (Race::Nhb, Sex::Female) => "NonHispanicBlackFemale.csv",
        (Race::Nhb, Sex::Male) => "NonHispanicBlackMale.csv",
        (Race::Nhw, Sex::Female) => "NonHispanicWhiteFemale.csv",
        (Race::Nhw, Sex::Male) => "NonHispanicWhiteMale.csv",
    }
}

/// Read the `qx` column of one table and trim it to ages 0-100
pub fn load_life_table<R: std::io::Read>(name: &str, reader: R) -> SimResult<LifeTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let qx_col = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("qx"))
        .ok_or_else(|| SimError::MissingColumn {
            name: name.to_string(),
            column: "qx",
        })?;

    let mut qx = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        // Source tables end with footnotes that carry no qx value
        let Some(value) = record.get(qx_col).map(str::trim).filter(|v| !v.is_empty()) else {
            break;
        };
        let q: f64 = value.parse().map_err(|_| SimError::InvalidTableValue {
            name: name.to_string(),
            row,
            value: value.to_string(),
        })?;
        qx.push(q);
    }

    LifeTable::new(name, qx)
}

/// Load all four race/sex tables from a directory
pub fn load_mortality_tables(path: &Path) -> SimResult<MortalityTables> {
    let mut tables = MortalityTables::new();
    for race in Race::ALL {
        for sex in Sex::ALL {
            let file_name = life_table_file_name(race, sex);
            let file = std::fs::File::open(path.join(file_name))?;
            let table = load_life_table(file_name, file)?;
            log::debug!("Loaded life table {} ({} {})", file_name, race.as_str(), sex.as_str());
            tables.insert(race, sex, table);
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_csv(rows: usize) -> String {
        let mut csv = String::from("Age,qx,lx\n");
        for age in 0..rows {
            csv.push_str(&format!("{}-{},{},100000\n", age, age + 1, 0.001 * (age as f64 + 1.0) / 10.0));
        }
        csv
    }

    #[test]
    fn test_load_trims_to_101_rows() {
        let mut csv = table_csv(101);
        csv.push_str("100 and over,1.0,500\n");
        csv.push_str("SOURCE: National Vital Statistics,,\n");

        let table = load_life_table("NonHispanicBlackMale.csv", csv.as_bytes()).unwrap();
        assert!((table.qx(0) - 0.0001).abs() < 1e-12);
        assert!((table.qx(100) - 0.0101).abs() < 1e-12);
        assert_eq!(table.qx(101), 1.0);
    }

    #[test]
    fn test_short_table_is_rejected() {
        let csv = table_csv(60);
        let err = load_life_table("short.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::LifeTableTooShort { rows: 60, .. }));
    }

    #[test]
    fn test_unreadable_qx_names_the_row() {
        let mut csv = table_csv(3);
        csv.push_str("3-4,n/a,100000\n");
        let err = load_life_table("bad.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::InvalidTableValue { row: 3, ref value, .. } if value == "n/a"));
    }

    #[test]
    fn test_missing_qx_column() {
        let csv = "Age,lx\n0,100000\n";
        let err = load_life_table("bad.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::MissingColumn { column: "qx", .. }));
    }
}
