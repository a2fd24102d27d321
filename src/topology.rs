//! TopoJSON → country features.
//!
//! Arc stitching and delta decoding are left to the `topojson` crate; this
//! module only pulls the identity fields out and turns the GeoJSON geometry
//! into `geo` types for projection and hit testing.

use anyhow::{anyhow, Result};
use geo::Geometry;
use geojson::feature::Id;
use topojson::{to_geojson, TopoJson, Topology};
use tracing::warn;

/// A country boundary before the population join.
#[derive(Debug, Clone)]
pub struct RawFeature {
    pub id: String,
    pub name: String,
    pub geometry: Option<Geometry<f64>>,
}

pub fn parse_topology(text: &str) -> Result<Topology> {
    let topo = text
        .parse::<TopoJson>()
        .map_err(|e| anyhow!("Invalid TopoJSON: {:?}", e))?;
    match topo {
        TopoJson::Topology(topology) => Ok(topology),
        _ => Err(anyhow!("TopoJSON document must be a Topology")),
    }
}

pub fn extract_features(topology: &Topology, object_name: &str) -> Result<Vec<RawFeature>> {
    if !topology.objects.iter().any(|o| o.name == object_name) {
        return Err(anyhow!("Topology has no object named '{}'", object_name));
    }

    let key = object_name.to_string();
    let collection = to_geojson(topology, &key)
        .map_err(|e| anyhow!("Failed to convert topology object '{}': {:?}", object_name, e))?;

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let id = match &feature.id {
            Some(Id::String(s)) => s.clone(),
            Some(Id::Number(n)) => n.to_string(),
            None => String::new(),
        };

        let name = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let geometry = match feature.geometry {
            Some(geom) => match Geometry::<f64>::try_from(geom.value) {
                Ok(g) => Some(g),
                Err(e) => {
                    warn!("Skipping geometry of '{}': {:?}", name, e);
                    None
                }
            },
            None => None,
        };

        features.push(RawFeature { id, name, geometry });
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUANTIZED: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1, 1], "translate": [0, 0]},
        "arcs": [
            [[0, 0], [10, 0], [0, 10], [-10, 0], [0, -10]],
            [[20, 20], [5, 0], [0, 5], [-5, 0], [0, -5]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "004", "properties": {"name": "Squareland"}, "arcs": [[0]]},
                    {"type": "MultiPolygon", "id": 8, "properties": {"name": "Islands"}, "arcs": [[[0]], [[1]]]},
                    {"type": "Polygon", "arcs": [[1]]}
                ]
            }
        }
    }"#;

    #[test]
    fn extracts_identity_and_geometry() {
        let topology = parse_topology(QUANTIZED).unwrap();
        let features = extract_features(&topology, "countries").unwrap();

        assert_eq!(features.len(), 3);
        assert_eq!(features[0].id, "004");
        assert_eq!(features[0].name, "Squareland");
        assert!(matches!(features[0].geometry, Some(Geometry::Polygon(_))));

        assert_eq!(features[1].id, "8");
        assert!(matches!(features[1].geometry, Some(Geometry::MultiPolygon(_))));

        assert_eq!(features[2].id, "");
        assert_eq!(features[2].name, "");
    }

    #[test]
    fn decodes_quantized_arcs() {
        let topology = parse_topology(QUANTIZED).unwrap();
        let features = extract_features(&topology, "countries").unwrap();
        let Some(Geometry::Polygon(square)) = &features[0].geometry else {
            panic!("expected polygon");
        };
        let xs: Vec<f64> = square.exterior().coords().map(|c| c.x).collect();
        assert!(xs.iter().all(|x| (0.0..=10.0).contains(x)));
        assert!(xs.contains(&10.0));
    }

    #[test]
    fn missing_object_is_an_error() {
        let topology = parse_topology(QUANTIZED).unwrap();
        assert!(extract_features(&topology, "land").is_err());
    }

    #[test]
    fn rejects_non_topology_documents() {
        assert!(parse_topology(r#"{"type": "Point", "coordinates": [0, 0]}"#).is_err());
        assert!(parse_topology("[]").is_err());
    }
}
