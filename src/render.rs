use crate::config::RenderConfig;
use crate::interaction::{FeatureStyle, BASE_STYLE};
use crate::projection::{path_data, MercatorProjection};
use crate::scale::ThresholdScale;
use crate::types::{CountryFeature, PopulationDetails};
use crate::viewport::Transform;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// A country ready to draw: identity, projected outline and fill.
#[derive(Debug, Clone, Serialize)]
pub struct BoundCountry {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub path: String,
    pub fill: Option<String>,
    pub details: PopulationDetails,
}

/// `None` when the total is zero or missing, otherwise the scale's bucket.
pub fn fill_color<'a>(details: &PopulationDetails, scale: &'a ThresholdScale) -> Option<&'a str> {
    details.total().map(|total| scale.color_for(total))
}

pub fn bind(
    features: &[CountryFeature],
    scale: &ThresholdScale,
    projection: &MercatorProjection,
) -> Vec<BoundCountry> {
    info!("Binding {} features", features.len());

    features
        .par_iter()
        .map(|feature| BoundCountry {
            id: feature.id.clone(),
            name: feature.name.clone(),
            path: feature
                .geometry
                .as_ref()
                .map(|g| path_data(g, projection))
                .unwrap_or_default(),
            fill: fill_color(&feature.population_details, scale).map(str::to_string),
            details: feature.population_details,
        })
        .collect()
}

/// Renders the full SVG document. `highlighted` is the position of the
/// hovered country in `countries`, if any; each path carries its position as
/// `data-index` so the page can address it even when ids repeat.
pub fn render_svg(
    countries: &[BoundCountry],
    config: &RenderConfig,
    transform: &Transform,
    highlighted: Option<usize>,
) -> String {
    let mut svg = String::with_capacity(countries.len() * 512);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="50 10 {} {}" preserveAspectRatio="xMinYMin" style="cursor: move">"#,
        config.width, config.height
    );
    let _ = writeln!(
        svg,
        r#"<g class="map-group" transform="{}">"#,
        transform.to_svg()
    );
    svg.push_str("<g>\n");

    for (index, country) in countries.iter().enumerate() {
        let style = if highlighted == Some(index) {
            FeatureStyle::highlighted()
        } else {
            BASE_STYLE
        };
        let _ = writeln!(
            svg,
            r#"<path name="{}" id="{}" data-index="{}" d="{}" style="{}"/>"#,
            escape_attr(&country.name),
            escape_attr(&country.id),
            index,
            country.path,
            style_attr(country.fill.as_deref(), &style)
        );
    }

    svg.push_str("</g>\n</g>\n</svg>\n");
    svg
}

fn style_attr(fill: Option<&str>, style: &FeatureStyle) -> String {
    let mut css = String::new();
    if let Some(fill) = fill {
        let _ = write!(css, "fill: {}; ", escape_attr(fill));
    }
    if let Some(stroke) = style.stroke {
        let _ = write!(css, "stroke: {}; ", stroke);
    }
    let _ = write!(css, "stroke-width: {}", style.stroke_width);
    if let Some(cursor) = style.cursor {
        let _ = write!(css, "; cursor: {}", cursor);
    }
    css
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn write_svg(path: &Path, svg: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(path, svg).with_context(|| format!("Failed to write SVG to {:?}", path))?;
    info!("Wrote map to {:?}", path);
    Ok(())
}

/// Writes the bound model (without outlines) as JSON.
pub fn write_model(path: &Path, countries: &[BoundCountry]) -> Result<()> {
    let json = serde_json::to_string_pretty(countries).context("Failed to serialize map model")?;
    fs::write(path, json).with_context(|| format!("Failed to write model to {:?}", path))?;
    info!("Wrote country model to {:?}", path);
    Ok(())
}
