use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Country name used as the join key. Compared byte for byte, never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryName(String);

impl CountryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Borrow<str> for CountryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub total: f64,
    pub females: f64,
    pub males: f64,
}

/// Population attached to a feature after the join.
///
/// `None` is the "no data" state a failed name lookup produces. It is a value,
/// not an error, and serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopulationDetails(Option<PopulationRecord>);

impl PopulationDetails {
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Total, if present and truthy (non-zero).
    pub fn total(&self) -> Option<f64> {
        self.0.map(|r| r.total).filter(|v| truthy(*v))
    }

    pub fn females(&self) -> Option<f64> {
        self.0.map(|r| r.females).filter(|v| truthy(*v))
    }

    pub fn males(&self) -> Option<f64> {
        self.0.map(|r| r.males).filter(|v| truthy(*v))
    }
}

impl From<Option<PopulationRecord>> for PopulationDetails {
    fn from(record: Option<PopulationRecord>) -> Self {
        Self(record)
    }
}

impl Serialize for PopulationDetails {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match &self.0 {
            Some(record) => record.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

#[derive(Debug, Clone)]
pub struct CountryFeature {
    pub id: String,
    pub name: String,
    pub geometry: Option<Geometry<f64>>,
    pub population_details: PopulationDetails,
}
