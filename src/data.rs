use crate::config::InputConfig;
use crate::population::PopulationRow;
use crate::topology;
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use topojson::Topology;
use tracing::{debug, info};

/// Where a dataset comes from: a local file or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::Path(PathBuf::from(s))
        }
    }

    /// Lower-cased extension of the file or URL path, ignoring any query string.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            DataSource::Path(p) => p.clone(),
            DataSource::Url(u) => {
                let without_query = u.split(['?', '#']).next().unwrap_or(u);
                PathBuf::from(without_query)
            }
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
    }

    async fn fetch_text(&self, client: &reqwest::Client) -> Result<String> {
        match self {
            DataSource::Path(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path)),
            DataSource::Url(url) => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Request to {} failed", url))?
                    .error_for_status()
                    .with_context(|| format!("{} returned an error status", url))?;
                response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read response body from {}", url))
            }
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => f.write_str(u),
        }
    }
}

impl<'de> Deserialize<'de> for DataSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DataSource::parse(&s))
    }
}

/// Both inputs, only ever produced together.
#[derive(Debug)]
pub struct Datasets {
    pub topology: Topology,
    pub population: Vec<PopulationRow>,
}

/// Fetches the boundary topology and the population records concurrently.
///
/// Either both succeed or the first failure is returned; there is no partial
/// result and no retry.
pub async fn load_datasets(input: &InputConfig) -> Result<Datasets> {
    info!("Loading boundaries from {} and population from {}", input.topology, input.population);
    let client = reqwest::Client::new();

    let (topology, population) = tokio::try_join!(
        load_topology(&client, &input.topology),
        load_population(&client, &input.population),
    )?;

    info!("Loaded {} population records", population.len());
    Ok(Datasets {
        topology,
        population,
    })
}

async fn load_topology(client: &reqwest::Client, source: &DataSource) -> Result<Topology> {
    let text = source
        .fetch_text(client)
        .await
        .with_context(|| format!("Failed to load boundary topology from {}", source))?;
    debug!("Fetched {} bytes of topology", text.len());
    topology::parse_topology(&text)
        .with_context(|| format!("Failed to parse boundary topology from {}", source))
}

async fn load_population(
    client: &reqwest::Client,
    source: &DataSource,
) -> Result<Vec<PopulationRow>> {
    let text = source
        .fetch_text(client)
        .await
        .with_context(|| format!("Failed to load population data from {}", source))?;

    let rows = match source.extension().as_deref() {
        Some("csv") => parse_population_csv(&text),
        _ => parse_population_json(&text),
    };
    rows.with_context(|| format!("Failed to parse population data from {}", source))
}

pub fn parse_population_json(text: &str) -> Result<Vec<PopulationRow>> {
    serde_json::from_str(text).context("Population JSON must be an array of records")
}

/// Reads population rows from CSV, locating columns by header name.
pub fn parse_population_csv(text: &str) -> Result<Vec<PopulationRow>> {
    let mut rdr = ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let country_idx =
        column("country").ok_or_else(|| anyhow!("Column 'country' not found in CSV"))?;
    let total_idx = column("total");
    let females_idx = column("females");
    let males_idx = column("males");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|s| Value::String(s.to_string()))
                .unwrap_or(Value::Null)
        };
        rows.push(PopulationRow {
            country: record.get(country_idx).unwrap_or("").to_string(),
            total: field(total_idx),
            females: field(females_idx),
            males: field(males_idx),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "arcs": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "001", "properties": {"name": "Testland"}, "arcs": [[0]]}
                ]
            }
        }
    }"#;

    fn input(dir: &Path, topology: &str, population: &str) -> InputConfig {
        InputConfig {
            topology: DataSource::Path(dir.join(topology)),
            population: DataSource::Path(dir.join(population)),
            object: "countries".to_string(),
        }
    }

    #[test]
    fn classifies_sources() {
        assert_eq!(
            DataSource::parse("data/50m.json"),
            DataSource::Path(PathBuf::from("data/50m.json"))
        );
        let url = DataSource::parse("https://example.org/pop.csv?v=2");
        assert!(matches!(url, DataSource::Url(_)));
        assert_eq!(url.extension().as_deref(), Some("csv"));
        assert_eq!(DataSource::parse("POP.JSON").extension().as_deref(), Some("json"));
    }

    #[test]
    fn csv_columns_are_found_by_header() {
        let rows = parse_population_csv("males,country,total\n10,Testland,30\n,Blank,\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "Testland");
        assert_eq!(rows[0].total, Value::String("30".into()));
        assert_eq!(rows[0].females, Value::Null);
        assert_eq!(rows[1].males, Value::String(String::new()));
    }

    #[test]
    fn csv_without_country_column_fails() {
        assert!(parse_population_csv("name,total\nX,1\n").is_err());
    }

    #[tokio::test]
    async fn loads_both_datasets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.json"), TOPOLOGY).unwrap();
        fs::write(
            dir.path().join("population.json"),
            r#"[{"country": "Testland", "total": "1200000", "females": "600000", "males": "600000"}]"#,
        )
        .unwrap();

        let datasets = load_datasets(&input(dir.path(), "world.json", "population.json"))
            .await
            .unwrap();
        assert_eq!(datasets.population.len(), 1);
        let features = topology::extract_features(&datasets.topology, "countries").unwrap();
        assert_eq!(features.len(), 1);
    }

    #[tokio::test]
    async fn loads_population_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.json"), TOPOLOGY).unwrap();
        fs::write(
            dir.path().join("population.csv"),
            "country,total,females,males\nTestland,1200000,600000,600000\n",
        )
        .unwrap();

        let datasets = load_datasets(&input(dir.path(), "world.json", "population.csv"))
            .await
            .unwrap();
        assert_eq!(datasets.population[0].country, "Testland");
    }

    #[tokio::test]
    async fn one_missing_input_fails_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.json"), TOPOLOGY).unwrap();

        let err = load_datasets(&input(dir.path(), "world.json", "missing.json"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("population"));
    }

    #[tokio::test]
    async fn malformed_topology_fails_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.json"), "{not json").unwrap();
        fs::write(dir.path().join("population.json"), "[]").unwrap();

        let err = load_datasets(&input(dir.path(), "world.json", "population.json"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("boundary topology"));
    }
}
