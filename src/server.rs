use crate::config::AppConfig;
use crate::interaction::{DetailPanel, MapSession, SessionEvent, ViewState};
use crate::pipeline::MapModel;
use crate::render::{bind, render_svg, BoundCountry};
use crate::scale::ThresholdScale;
use crate::types::CountryFeature;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// Wrapper for RTree indexing
pub struct CountryEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for CountryEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub features: Vec<CountryFeature>,
    pub scale: ThresholdScale,
    pub tree: RTree<CountryEnvelope>,
    pub config: AppConfig,
    session: Mutex<MapSession>,
}

impl AppState {
    pub fn new(config: AppConfig, model: MapModel) -> Self {
        let tree_items: Vec<CountryEnvelope> = model
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let rect = feature.geometry.as_ref()?.bounding_rect()?;
                Some(CountryEnvelope {
                    index: i,
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        let tree = RTree::bulk_load(tree_items);
        info!("Spatial index built over {} countries", tree.size());

        Self {
            features: model.features,
            scale: model.scale,
            tree,
            config,
            session: Mutex::new(MapSession::new(model.countries)),
        }
    }

    /// The session only holds plain data, so a poisoned lock is still usable.
    fn session(&self) -> MutexGuard<'_, MapSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Country containing a lon/lat point, if any.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.index)
            .find(|&i| {
                self.features[i]
                    .geometry
                    .as_ref()
                    .is_some_and(|g| g.contains(&point))
            })
    }
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

/// Visible size of the browser window, measured when the page loads.
#[derive(Deserialize)]
pub struct MapSvgParams {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    index: usize,
    id: String,
    name: String,
    panel: DetailPanel,
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/map.svg", get(map_svg_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/countries/:index", get(country_handler))
        .route("/api/query", get(query_handler))
        .route("/api/state", get(state_handler))
        .route("/api/events", post(event_handler))
        .fallback_service(static_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, model: MapModel) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState::new(config, model));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn map_svg_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapSvgParams>,
) -> impl IntoResponse {
    let configured = &state.config.render;
    let render = configured.with_viewport(params.width, params.height);

    let svg = if render.width == configured.width && render.height == configured.height {
        let session = state.session();
        render_svg(
            session.countries(),
            &render,
            session.transform(),
            session.hover().hovered(),
        )
    } else {
        let (transform, hovered) = {
            let session = state.session();
            (*session.transform(), session.hover().hovered())
        };
        debug!("Re-binding map for a {}x{} viewport", render.width, render.height);
        let countries = bind(&state.features, &state.scale, &render.projection());
        render_svg(&countries, &render, &transform, hovered)
    };
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}

async fn countries_handler(State(state): State<Arc<AppState>>) -> Json<Vec<BoundCountry>> {
    Json(state.session().countries().to_vec())
}

async fn country_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<DetailPanel>, StatusCode> {
    let session = state.session();
    let country = session.country(index).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(DetailPanel::for_hovered(Some(country))))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<QueryResponse>> {
    let Some(index) = state.locate(params.lon, params.lat) else {
        return Json(None);
    };
    let session = state.session();
    Json(session.country(index).map(|country| QueryResponse {
        index,
        id: country.id.clone(),
        name: country.name.clone(),
        panel: DetailPanel::for_hovered(Some(country)),
    }))
}

async fn state_handler(State(state): State<Arc<AppState>>) -> Json<ViewState> {
    Json(state.session().view_state())
}

async fn event_handler(
    State(state): State<Arc<AppState>>,
    Json(event): Json<SessionEvent>,
) -> Json<ViewState> {
    Json(state.session().apply(event))
}
