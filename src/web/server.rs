use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::services::Services;

use super::api::passes as pass_handlers;
use super::api::satellites as satellite_handlers;
use super::api::weather as weather_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Pass prediction
        .route("/api/passes", get(pass_handlers::list_passes))
        .route("/api/passes/next", get(pass_handlers::next_pass))
        .route("/api/overhead", get(pass_handlers::overhead))
        // Catalog
        .route("/api/satellites", get(satellite_handlers::list_satellites))
        .route("/api/satellites/{id}", get(satellite_handlers::get_satellite))
        // Weather
        .route("/api/weather", get(weather_handlers::get_weather))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    if config.station.observer().is_none() {
        log::warn!(
            "Station coordinates {:?} are invalid; requests must pass lat/lon",
            config.station.coordinates
        );
    }

    let services = Services::from_config(config).map_err(std::io::Error::other)?;
    let app = router(AppState::new(services));

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
