use population_choropleth::config::AppConfig;
use population_choropleth::interaction::{MapSession, SessionEvent, NO_DATA};
use population_choropleth::pipeline::load_map;
use population_choropleth::render::render_svg;
use std::fs;
use std::path::Path;
use std::process::Command;

const WORLD: &str = r#"{
    "type": "Topology",
    "transform": {"scale": [0.1, 0.1], "translate": [-20, -10]},
    "arcs": [
        [[0, 0], [100, 0], [0, 100], [-100, 0], [0, -100]],
        [[200, 0], [100, 0], [0, 100], [-100, 0], [0, -100]]
    ],
    "objects": {
        "countries": {
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Polygon", "id": "100", "properties": {"name": "Testland"}, "arcs": [[0]]},
                {"type": "Polygon", "id": "200", "properties": {"name": "NoDataLand"}, "arcs": [[1]]}
            ]
        }
    }
}"#;

const POPULATION: &str = r#"[
    {"country": "Testland", "total": "1200000", "females": "600000", "males": "600000"},
    {"country": "Elsewhere", "total": "5", "females": "2", "males": "3"}
]"#;

fn write_config(dir: &Path, population_file: &str) -> AppConfig {
    let toml = format!(
        "[input]\ntopology = {:?}\npopulation = {:?}\n",
        dir.join("world.json").display().to_string(),
        dir.join(population_file).display().to_string(),
    );
    let config_path = dir.join("config.toml");
    fs::write(&config_path, toml).unwrap();
    AppConfig::load_from_file(&config_path).unwrap()
}

#[tokio::test]
async fn hovering_testland_shows_its_population() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("world.json"), WORLD).unwrap();
    fs::write(dir.path().join("population.json"), POPULATION).unwrap();
    let config = write_config(dir.path(), "population.json");

    let model = load_map(&config).await.unwrap();
    assert_eq!(model.countries.len(), 2);

    let testland = &model.countries[0];
    assert_eq!(testland.name, "Testland");
    assert_eq!(testland.fill.as_deref(), Some("#8c96c6"));

    let mut session = MapSession::new(model.countries);
    let state = session.apply(SessionEvent::HoverEnter { index: 0 });
    assert!(state.panel.visible);
    assert_eq!(state.panel.country, "Testland");
    assert_eq!(state.panel.females, "Female 600000");
    assert_eq!(state.panel.males, "Male 600000");
}

#[tokio::test]
async fn hovering_nodataland_shows_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("world.json"), WORLD).unwrap();
    fs::write(dir.path().join("population.json"), POPULATION).unwrap();
    let config = write_config(dir.path(), "population.json");

    let model = load_map(&config).await.unwrap();
    let nodata = &model.countries[1];
    assert_eq!(nodata.name, "NoDataLand");
    assert_eq!(nodata.fill, None);
    assert!(nodata.details.is_empty());

    let svg = render_svg(
        &model.countries,
        &config.render,
        &Default::default(),
        None,
    );
    assert!(svg.contains(r#"name="NoDataLand" id="200" data-index="1""#));
    assert_eq!(svg.matches("<path ").count(), 2);
    assert_eq!(svg.matches("fill:").count(), 1);

    let mut session = MapSession::new(model.countries);
    let state = session.apply(SessionEvent::HoverEnter { index: 1 });
    assert_eq!(state.panel.females, NO_DATA);
    assert_eq!(state.panel.males, NO_DATA);

    let state = session.apply(SessionEvent::HoverExit { index: None });
    assert!(!state.panel.visible);
}

#[tokio::test]
async fn csv_population_joins_the_same_way() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("world.json"), WORLD).unwrap();
    fs::write(
        dir.path().join("population.csv"),
        "country,total,females,males\nTestland,1200000,600000,600000\n",
    )
    .unwrap();
    let config = write_config(dir.path(), "population.csv");

    let model = load_map(&config).await.unwrap();
    assert_eq!(model.countries[0].fill.as_deref(), Some("#8c96c6"));
    assert_eq!(model.countries[1].fill, None);
}

#[tokio::test]
async fn failed_load_builds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("population.json"), POPULATION).unwrap();
    let config = write_config(dir.path(), "population.json");

    let err = load_map(&config).await.err().unwrap();
    assert!(format!("{:#}", err).contains("boundary topology"));
}

#[test]
fn generate_exits_with_failure_when_data_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("population.json"), POPULATION).unwrap();
    let svg_path = dir.path().join("out").join("map.svg");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[input]\ntopology = {:?}\npopulation = {:?}\n\n[output]\nsvg = {:?}\n",
            dir.path().join("world.json").display().to_string(),
            dir.path().join("population.json").display().to_string(),
            svg_path.display().to_string(),
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_population-choropleth"))
        .arg("generate")
        .arg("--config")
        .arg(&config_path)
        .env("RUST_LOG", "error")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let log = String::from_utf8_lossy(&output.stdout);
    assert_eq!(log.matches("Error loading data").count(), 1);
    assert!(!svg_path.exists());
}
