use anyhow::Context;
use clap::{Parser, Subcommand};
use population_choropleth::config::AppConfig;
use population_choropleth::interaction::DetailPanel;
use population_choropleth::pipeline::{self, MapModel};
use population_choropleth::render;
use population_choropleth::server;
use population_choropleth::viewport::Transform;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the choropleth to an SVG file
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the map with hover details and pan/zoom
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the detail panel shown when hovering a country
    Inspect {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Exact country name as it appears in the boundary data
        #[arg(long)]
        country: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating map with config: {:?}", config);
            let app_config = AppConfig::load_from_file(config)?;
            let Some(model) = load(&app_config).await else {
                return Ok(ExitCode::FAILURE);
            };

            let svg = render::render_svg(
                &model.countries,
                &app_config.render,
                &Transform::identity(),
                None,
            );
            render::write_svg(&app_config.output.svg, &svg)?;
            if let Some(model_path) = &app_config.output.model {
                render::write_model(model_path, &model.countries)?;
            }

            info!("Generation complete");
        }
        Commands::Serve { config } => {
            info!("Serving map with config: {:?}", config);
            let app_config = AppConfig::load_from_file(config)?;
            let Some(model) = load(&app_config).await else {
                return Ok(ExitCode::FAILURE);
            };

            server::start_server(app_config, model).await?;
        }
        Commands::Inspect { config, country } => {
            let app_config = AppConfig::load_from_file(config)?;
            let Some(model) = load(&app_config).await else {
                return Ok(ExitCode::FAILURE);
            };

            let found = model
                .countries
                .iter()
                .find(|c| &c.name == country)
                .with_context(|| format!("No country named '{}' in the boundary data", country))?;

            let panel = DetailPanel::for_hovered(Some(found));
            println!("{}", panel.country);
            println!("{}", panel.females);
            println!("{}", panel.males);
            println!("fill: {}", found.fill.as_deref().unwrap_or("none"));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads and builds the map. A load failure is logged here, once; the caller
/// then exits with a failure status before anything is rendered.
async fn load(config: &AppConfig) -> Option<MapModel> {
    match pipeline::load_map(config).await {
        Ok(model) => Some(model),
        Err(e) => {
            error!("Error loading data: {:#}", e);
            None
        }
    }
}
