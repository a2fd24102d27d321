use crate::population::PopulationIndex;
use crate::topology::RawFeature;
use crate::types::{CountryFeature, PopulationDetails};
use tracing::{debug, info};

/// Attaches population details to each feature by exact name match.
///
/// Features whose name is not in the index get empty details. Input order is
/// kept.
pub fn enrich(raw: Vec<RawFeature>, index: &PopulationIndex) -> Vec<CountryFeature> {
    let mut unmatched = 0usize;

    let features: Vec<CountryFeature> = raw
        .into_iter()
        .map(|feature| {
            let details = PopulationDetails::from(index.get(&feature.name).copied());
            if details.is_empty() {
                unmatched += 1;
                debug!("No population record for '{}'", feature.name);
            }
            CountryFeature {
                id: feature.id,
                name: feature.name,
                geometry: feature.geometry,
                population_details: details,
            }
        })
        .collect();

    info!(
        "Joined population data onto {} features ({} without a match)",
        features.len(),
        unmatched
    );
    features
}
