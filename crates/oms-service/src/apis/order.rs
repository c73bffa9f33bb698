//! Order endpoints.
//!
//! Thin adapters between HTTP and `OrderEngine`: they parse the request, call
//! one engine operation and map its error onto an API error body.

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	response::Json,
};
use oms_core::EngineError;
use oms_types::{APIError, ErrorKind, NewOrder, OrderView};
use tracing::warn;

use crate::server::AppState;

/// Maps an engine failure onto its HTTP representation.
fn api_error(err: EngineError) -> APIError {
	match err {
		EngineError::NotFound(_) => {
			APIError::new(ErrorKind::NotFound, "ORDER_NOT_FOUND", err.to_string())
		},
		EngineError::InvalidTransition(rejection) => APIError::new(
			ErrorKind::Conflict,
			"INVALID_TRANSITION",
			rejection.to_string(),
		)
		.with_details(serde_json::to_value(rejection).ok()),
		EngineError::Validation(message) => {
			APIError::new(ErrorKind::BadRequest, "INVALID_ORDER", message)
		},
		EngineError::Storage(_) => {
			warn!(error = %err, "Order storage failure");
			APIError::new(
				ErrorKind::Internal,
				"INTERNAL_ERROR",
				"Order storage is unavailable",
			)
		},
	}
}

/// Parses the `{id}` path segment.
fn parse_order_id(id: &str) -> Result<u64, APIError> {
	id.parse().map_err(|_| {
		APIError::new(
			ErrorKind::BadRequest,
			"INVALID_ORDER_ID",
			format!("Order ID must be a non-negative integer: {}", id),
		)
	})
}

/// Handles GET /api/orders requests.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderView>>, APIError> {
	state.engine.list().await.map(Json).map_err(api_error)
}

/// Handles GET /api/orders/{id} requests.
pub async fn get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderView>, APIError> {
	let order_id = parse_order_id(&id)?;
	state.engine.get(order_id).await.map(Json).map_err(api_error)
}

/// Handles POST /api/orders requests.
///
/// A malformed body is reported like any other invalid order.
pub async fn create_order(
	State(state): State<AppState>,
	body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<Json<OrderView>, APIError> {
	let Json(new_order) = body.map_err(|rejection| {
		APIError::new(ErrorKind::BadRequest, "INVALID_ORDER", rejection.body_text())
	})?;
	state
		.engine
		.create(new_order)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles POST /api/orders/{id}/next requests.
pub async fn advance_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderView>, APIError> {
	let order_id = parse_order_id(&id)?;
	state
		.engine
		.advance(order_id)
		.await
		.map(Json)
		.map_err(api_error)
}

/// Handles DELETE /api/orders/{id} requests.
pub async fn delete_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<StatusCode, APIError> {
	let order_id = parse_order_id(&id)?;
	state
		.engine
		.delete(order_id)
		.await
		.map(|()| StatusCode::NO_CONTENT)
		.map_err(api_error)
}
