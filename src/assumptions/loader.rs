//! File-based assumption loader
//!
//! Two formats are accepted:
//! - a `key,value` CSV where each row overrides one field of the reference case
//! - a JSON object with any subset of the fields

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use super::{AssumptionError, Assumptions};

/// Default path to the assumptions file
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions.csv";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read assumptions: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed assumptions CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed assumptions JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown assumption `{0}`")]
    UnknownKey(String),

    #[error("cannot parse `{value}` as a value for `{key}`")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Invalid(#[from] AssumptionError),
}

impl Assumptions {
    /// Load assumptions from the default location (data/assumptions.csv)
    pub fn from_default_path() -> Result<Self, LoadError> {
        Self::from_path(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load from a `.json` file, anything else is read as CSV
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_path(path),
            _ => Self::from_csv_path(path),
        }
    }

    /// Reference case overridden by the rows of a `key,value` CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        let assumptions = Self::default_case().with_csv_overrides(file)?;
        assumptions.validate()?;

        log::debug!("Loaded assumptions from {}", path.display());
        Ok(assumptions)
    }

    /// Full or partial JSON record; missing fields keep the reference case
    pub fn from_json_path(path: &Path) -> Result<Self, LoadError> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;

        let assumptions: Assumptions = serde_json::from_str(&contents)?;
        assumptions.validate()?;

        log::debug!("Loaded assumptions from {}", path.display());
        Ok(assumptions)
    }

    /// Copy of `self` with every `key,value` row of `reader` applied.
    ///
    /// A leading `key,value` header is optional. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn with_csv_overrides<R: Read>(&self, reader: R) -> Result<Self, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut fields = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => unreachable!("Assumptions serializes to a JSON object"),
        };

        for (index, result) in reader.records().enumerate() {
            let record = result?;
            let key = record.get(0).unwrap_or_default();
            let value = record.get(1).unwrap_or_default();
            if index == 0 && key == "key" && value == "value" {
                continue;
            }
            override_field(&mut fields, key, value)?;
        }

        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Replace one field, parsing `raw` according to the field's current type
fn override_field(fields: &mut Map<String, Value>, key: &str, raw: &str) -> Result<(), LoadError> {
    let current = fields
        .get(key)
        .ok_or_else(|| LoadError::UnknownKey(key.to_string()))?;

    let invalid = || LoadError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    };

    let parsed = match current {
        Value::Bool(_) => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            Value::from(raw.parse::<i64>().map_err(|_| invalid())?)
        }
        _ => {
            let number = raw.parse::<f64>().map_err(|_| invalid())?;
            serde_json::Number::from_f64(number)
                .map(Value::Number)
                .ok_or_else(invalid)?
        }
    };

    fields.insert(key.to_string(), parsed);
    Ok(())
}
