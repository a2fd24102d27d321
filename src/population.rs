use crate::types::{CountryName, PopulationRecord};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One population entry as it appears in the source dataset. The numeric
/// columns are kept raw until indexing coerces them.
#[derive(Debug, Clone, Deserialize)]
pub struct PopulationRow {
    pub country: String,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub females: Value,
    #[serde(default)]
    pub males: Value,
}

/// Best-effort numeric coercion. Numbers pass through, numeric strings are
/// parsed, blanks and `null` become 0 and anything unparseable or non-finite
/// becomes 0 as well, which downstream reads as "no data".
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_numeric_str(s),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn parse_numeric_str(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    // Rust accepts "inf"/"nan" spellings that are not numbers in the source data.
    if s.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return 0.0;
    }
    s.parse::<f64>().unwrap_or(0.0)
}

#[derive(Debug, Clone, Default)]
pub struct PopulationIndex {
    records: HashMap<CountryName, PopulationRecord>,
}

impl PopulationIndex {
    /// Later rows for the same country overwrite earlier ones.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = PopulationRow>,
    {
        let mut records = HashMap::new();
        for row in rows {
            let record = PopulationRecord {
                total: coerce_number(&row.total),
                females: coerce_number(&row.females),
                males: coerce_number(&row.males),
            };
            records.insert(CountryName::new(row.country), record);
        }
        Self { records }
    }

    pub fn get(&self, name: &str) -> Option<&PopulationRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
