use crate::config::AppConfig;
use crate::data::{self, Datasets};
use crate::enrich::enrich;
use crate::population::PopulationIndex;
use crate::render::{bind, BoundCountry};
use crate::scale::ThresholdScale;
use crate::topology::extract_features;
use crate::types::CountryFeature;
use anyhow::Result;
use tracing::info;

/// The joined, bound map: what `generate`, `serve` and `inspect` all work from.
pub struct MapModel {
    pub features: Vec<CountryFeature>,
    pub countries: Vec<BoundCountry>,
    /// Kept so the map can be re-bound at another viewport size.
    pub scale: ThresholdScale,
}

/// Index → enrich → bind. Synchronous; runs once the inputs are in hand.
pub fn build_map(datasets: Datasets, config: &AppConfig) -> Result<MapModel> {
    let index = PopulationIndex::from_rows(datasets.population);
    info!("Indexed population for {} countries", index.len());

    let raw = extract_features(&datasets.topology, &config.input.object)?;
    let features = enrich(raw, &index);

    let scale = config.render.scale.build()?;
    let countries = bind(&features, &scale, &config.render.projection());

    Ok(MapModel {
        features,
        countries,
        scale,
    })
}

/// Loads both datasets and builds the map. Nothing is built if either load fails.
pub async fn load_map(config: &AppConfig) -> Result<MapModel> {
    let datasets = data::load_datasets(&config.input).await?;
    build_map(datasets, config)
}
