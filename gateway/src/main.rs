use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use demand_forecast::{ForecastEngine, RidgeSeasonalEngine};
use mission_store::{
    history, load_demand_points, BaseRegistry, DemandPoint, DemographicCatalog, MissionStore,
};
use scenario_engine::Simulator;

mod forecast_routes;
mod map_html;
mod responses;
mod scenario_routes;

#[derive(Clone)]
pub struct AppState {
    pub simulator: Arc<Simulator>,
    pub store: Arc<MissionStore>,
    pub registry: Arc<BaseRegistry>,
    pub demand_points: Arc<Vec<DemandPoint>>,
    pub catalog: Arc<DemographicCatalog>,
    pub engine: Arc<dyn ForecastEngine>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "medops_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = Arc::new(BaseRegistry::with_gulf_coast_network());
    let demand_points = Arc::new(load_demand_points());
    let store = Arc::new(MissionStore::with_reference_history(
        &registry,
        &demand_points,
    ));
    let catalog = Arc::new(DemographicCatalog::with_regional_projections());

    // "Most recent 12 months" anchors here; overridable so replayed
    // environments stay reproducible
    let reference_date = match std::env::var("MEDOPS_REFERENCE_DATE") {
        Ok(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("invalid MEDOPS_REFERENCE_DATE: {}", raw))?,
        Err(_) => history::history_end(),
    };

    tracing::info!(
        "Loaded {} missions, {} bases, {} demand points (reference date {})",
        store.len(),
        registry.iter().count(),
        demand_points.len(),
        reference_date
    );

    let simulator = Arc::new(Simulator::new(
        store.clone(),
        registry.clone(),
        demand_points.clone(),
        reference_date,
    ));

    let state = AppState {
        simulator,
        store,
        registry,
        demand_points,
        catalog,
        engine: Arc::new(RidgeSeasonalEngine),
    };

    let api_routes = Router::new()
        .route("/scenario_simulate", post(scenario_routes::scenario_simulate))
        .route("/scenario_compare", post(scenario_routes::scenario_compare))
        .route("/pareto_sensitivity", post(scenario_routes::pareto_sensitivity))
        .route("/base_siting", post(scenario_routes::base_siting))
        .route("/predict_demand_v2", post(forecast_routes::predict_demand_v2))
        .route("/base_locations", get(forecast_routes::base_locations))
        .route("/get_corr_matrix", get(forecast_routes::get_corr_matrix))
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let port = std::env::var("MEDOPS_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "18710".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("MedOps gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "medops-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
