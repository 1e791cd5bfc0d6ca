mod catalog;
mod config;
mod http;
mod llm;
mod metrics;
mod models;
mod orchestrator;
mod pipeline;
mod security;
#[cfg(test)]
mod test_support;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use catalog::ShopifyCatalog;
use config::AppConfig;
use eyre::WrapErr;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{ApiError, OptimizeRequest, OptimizeResponse, ProductView};
use orchestrator::FailoverOrchestrator;
use pipeline::{Pipeline, PipelineError, PipelineErrorKind};
use security::{AuthContext, AuthState, require_api_auth};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const OPENAPI_SPEC: &str = include_str!("../docs/openapi.yaml");

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "optimizer.api", "server crashed: {err:?}");
    }
}

async fn run() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let http = http::build_client(&config.http);
    let orchestrator =
        FailoverOrchestrator::new(llm::registry::provider_tiers(&config.providers, &http));
    let catalog = Arc::new(ShopifyCatalog::from_settings(&config.shopify, http.clone()));
    let pipeline = Pipeline::new(orchestrator, catalog, config.products_page_size);

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .wrap_err("failed to install prometheus recorder")?;
    let openapi: serde_json::Value =
        serde_yaml::from_str(OPENAPI_SPEC).wrap_err("bundled openapi document is invalid")?;

    let state = AppState {
        pipeline,
        openapi: Arc::new(openapi),
        prometheus_handle,
        openapi_key: config.openapi_key.clone(),
        metrics_key: config.metrics_key.clone(),
    };
    let auth = AuthState::from_config(config.api_keys.as_deref());
    let app = router(state, auth, config.request_max_bytes);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!(target = "optimizer.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    openapi: Arc<serde_json::Value>,
    prometheus_handle: PrometheusHandle,
    openapi_key: Option<String>,
    metrics_key: Option<String>,
}

fn router(state: AppState, auth: AuthState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/api/products", get(list_products))
        .route("/api/optimize", post(optimize))
        .route_layer(middleware::from_fn_with_state(auth, require_api_auth));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .route("/docs", get(swagger_ui))
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
///
/// Lists the provider engines that currently have credentials.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "catalog-copy-optimizer",
        "engines": state.pipeline.orchestrator().configured_engines(),
    }))
}

async fn openapi_json(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(key) = &state.openapi_key {
        let presented = headers
            .get("X-Docs-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != key {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    Json((*state.openapi).clone()).into_response()
}

async fn swagger_ui() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<html>
<head>
  <meta charset='utf-8'/>
  <title>Catalog Copy Optimizer API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: '/openapi.json', dom_id: '#swagger-ui' });
    };
  </script>
</body>
</html>"#,
    )
}

async fn metrics_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(secret) = &state.metrics_key {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus_handle.render(),
    )
        .into_response()
}

/// List a page of catalog products for the dashboard.
///
/// - Method: `GET`
/// - Path: `/api/products`
/// - Response: array of `ProductView` (`images.nodes[].url` like Shopify)
async fn list_products(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    crate::metrics::inc_requests("/api/products");
    info!(
        target = "optimizer.api",
        client_id = %context.client_id,
        "product listing requested",
    );
    let items = state.pipeline.list_products().await?;
    Ok(Json(items.into_iter().map(ProductView::from).collect()))
}

/// Generate description and tags for one product and write them back.
///
/// - Method: `POST`
/// - Path: `/api/optimize`
/// - Body: `{ "id": "...", "title": "..." }`
/// - Response: `OptimizeResponse`; generation always succeeds, a failed
///   catalog write answers 502.
async fn optimize(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    crate::metrics::inc_requests("/api/optimize");
    info!(
        target = "optimizer.api",
        client_id = %context.client_id,
        "optimize invoked",
    );
    let response = state.pipeline.optimize(&payload.id, &payload.title).await?;
    Ok(Json(response))
}

#[derive(Debug)]
enum AppError {
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Pipeline(err) => {
                let status = match err.kind() {
                    PipelineErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    PipelineErrorKind::Upstream => StatusCode::BAD_GATEWAY,
                    PipelineErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let payload = ApiError {
                    error: err.stage().to_string(),
                    detail: Some(err.detail().to_string()),
                };
                (status, Json(payload)).into_response()
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
