//! HTTP server for the order API.
//!
//! Routes live under `/api`; `/health` sits at the root for liveness probes.

use axum::{
	extract::DefaultBodyLimit,
	http::HeaderValue,
	response::Json,
	routing::{get, post},
	Router,
};
use oms_config::ApiConfig;
use oms_core::OrderEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use crate::apis::order;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Engine handling every order operation.
	pub engine: Arc<OrderEngine>,
}

/// Builds the API router with its middleware stack.
pub fn router(api_config: &ApiConfig, engine: Arc<OrderEngine>) -> Router {
	let app_state = AppState { engine };

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", get(order::list_orders).post(order::create_order))
				.route(
					"/orders/{id}",
					get(order::get_order).delete(order::delete_order),
				)
				.route("/orders/{id}/next", post(order::advance_order)),
		)
		.route("/health", get(health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(cors_layer(api_config))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(app_state)
}

/// Origin of the local web console, allowed when no CORS section is set.
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

fn cors_layer(api_config: &ApiConfig) -> CorsLayer {
	let default_origins = [DEFAULT_CORS_ORIGIN.to_string()];
	let origins: &[String] = match &api_config.cors {
		Some(cors) => &cors.allowed_origins,
		None => &default_origins,
	};
	let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

	if origins.iter().any(|origin| origin == "*") {
		return layer.allow_origin(Any);
	}

	let origins: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();
	layer.allow_origin(AllowOrigin::list(origins))
}

/// Starts the HTTP server and runs it until ctrl-c.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
	tracing::info!("Shutdown signal received");
}

/// Handles GET /health requests.
async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}
