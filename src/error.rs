//! Error types shared across the simulation library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid covariate for {field}: {value:?}")]
    InvalidCovariate { field: &'static str, value: String },

    #[error("No mortality table for race {race}, sex {sex}")]
    MissingMortalityTable { race: String, sex: String },

    #[error("Malformed {layer} transition vector {probs:?}: {reason}")]
    MalformedProbabilityVector {
        layer: &'static str,
        probs: Vec<f64>,
        reason: String,
    },

    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Life table {name} has {rows} rows, need at least {required}")]
    LifeTableTooShort {
        name: String,
        rows: usize,
        required: usize,
    },

    #[error("Life table {name} row {row} has unreadable qx {value:?}")]
    InvalidTableValue { name: String, row: usize, value: String },

    #[error("Life table {name} is missing a '{column}' column")]
    MissingColumn { name: String, column: &'static str },

    #[error("Arms are not seed-paired: {reason}")]
    UnpairedArms { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
