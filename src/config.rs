use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::DataSource;
use crate::projection::MercatorProjection;
use crate::scale::ThresholdScale;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub topology: DataSource,
    pub population: DataSource,
    /// Name of the object collection inside the topology holding the countries
    #[serde(default = "default_object")]
    pub object: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub projection_scale: f64,
    pub scale: ScaleConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScaleConfig {
    pub breakpoints: Vec<f64>,
    pub colors: Vec<String>, // Hex codes, one more than breakpoints
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub svg: PathBuf,
    pub model: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

fn default_object() -> String {
    "countries".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            projection_scale: 130.0,
            scale: ScaleConfig::default(),
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                10_000.0,
                100_000.0,
                500_000.0,
                1_000_000.0,
                5_000_000.0,
                10_000_000.0,
                50_000_000.0,
                100_000_000.0,
            ],
            colors: [
                "#f7fcfd", "#e0ecf4", "#bfd3e6", "#9ebcda", "#8c96c6", "#8c6bb1", "#88419d",
                "#810f7c", "#4d004b",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            svg: PathBuf::from("map.svg"),
            model: Some(PathBuf::from("map.json")),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            static_dir: PathBuf::from("web"),
        }
    }
}

impl ScaleConfig {
    pub fn build(&self) -> Result<ThresholdScale> {
        ThresholdScale::new(self.breakpoints.clone(), self.colors.clone())
            .map_err(|e| anyhow!("Invalid colour scale in [render.scale]: {}", e))
    }
}

impl RenderConfig {
    /// A copy sized to a measured viewport. Sizes that are missing, zero or
    /// non-finite keep the configured value.
    pub fn with_viewport(&self, width: Option<f64>, height: Option<f64>) -> Self {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        Self {
            width: usable(width).unwrap_or(self.width),
            height: usable(height).unwrap_or(self.height),
            ..self.clone()
        }
    }

    pub fn projection(&self) -> MercatorProjection {
        MercatorProjection::for_viewport(self.projection_scale, self.width, self.height)
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        // Fail at startup rather than on first render.
        config.render.scale.build()?;
        Ok(config)
    }
}
