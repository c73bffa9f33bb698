//! HTTP payment backend.
//!
//! Queries the payment service REST API:
//!
//! - `GET {base_url}/payments/order/{order_id}` returns a JSON array of
//!   payment records, `404` when the service knows nothing about the order.
//!
//! Only the `status` of the first record is read. The other fields the
//! payment service attaches are ignored whatever their shape.

use crate::{PaymentError, PaymentInterface};
use async_trait::async_trait;
use oms_types::{
	BackendTable, ConfigSchema, ImplementationRegistry, PaymentRecord, PaymentStatus,
	ValidationError,
};
use serde::Deserialize;
use std::time::Duration;

/// Default client-side timeout for requests to the payment service.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// The one field read from a payment record.
#[derive(Deserialize)]
struct RecordStatus {
	status: PaymentStatus,
}

/// Payment backend talking to the payment service over HTTP.
pub struct HttpPayments {
	client: reqwest::Client,
	base_url: String,
}

impl HttpPayments {
	/// Creates a backend for the payment service at `base_url`.
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PaymentError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(10)
			.timeout(timeout)
			.build()
			.map_err(|e| PaymentError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		})
	}

	fn payments_url(&self, order_id: u64) -> String {
		format!("{}/payments/order/{}", self.base_url, order_id)
	}
}

#[async_trait]
impl PaymentInterface for HttpPayments {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpPaymentsSchema)
	}

	async fn payments_for_order(&self, order_id: u64) -> Result<Vec<PaymentRecord>, PaymentError> {
		let url = self.payments_url(order_id);
		tracing::debug!("Fetching payments from: {}", url);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| PaymentError::Network(e.to_string()))?;

		let status = response.status();
		if status == reqwest::StatusCode::NOT_FOUND {
			return Err(PaymentError::NotFound);
		}
		if !status.is_success() {
			return Err(PaymentError::InvalidResponse(format!(
				"payment service returned {}",
				status
			)));
		}

		let body = response
			.bytes()
			.await
			.map_err(|e| PaymentError::Network(e.to_string()))?;
		let payments: Vec<serde_json::Value> = serde_json::from_slice(&body)
			.map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

		match payments.into_iter().next() {
			Some(first) => {
				let RecordStatus { status } = serde_json::from_value(first)
					.map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
				Ok(vec![PaymentRecord::with_status(status)])
			},
			None => Ok(Vec::new()),
		}
	}
}

/// Settings read from an `http` payment table.
struct HttpSettings<'a> {
	base_url: &'a str,
	timeout_ms: u64,
}

fn parse_settings(config: &toml::Value) -> Result<HttpSettings<'_>, ValidationError> {
	let table = BackendTable::new(config)?;
	let base_url = table.required_string("base_url")?;
	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(ValidationError::invalid(
			"base_url",
			"must start with http:// or https://",
		));
	}
	let timeout_ms = table
		.integer_in("timeout_ms", 1..=300_000)?
		.map_or(DEFAULT_REQUEST_TIMEOUT_MS, |ms| ms as u64);

	Ok(HttpSettings {
		base_url,
		timeout_ms,
	})
}

/// Configuration schema for HttpPayments.
pub struct HttpPaymentsSchema;

impl ConfigSchema for HttpPaymentsSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		parse_settings(config).map(|_| ())
	}
}

/// Factory function to create an HTTP payment backend from configuration.
///
/// Configuration parameters:
/// - `base_url`: Payment service root, e.g. "http://localhost:8082" (required)
/// - `timeout_ms`: Request timeout in milliseconds (default: 5000)
pub fn create_payments(config: &toml::Value) -> Result<Box<dyn PaymentInterface>, PaymentError> {
	let settings =
		parse_settings(config).map_err(|e| PaymentError::Configuration(e.to_string()))?;

	Ok(Box::new(HttpPayments::new(
		settings.base_url,
		Duration::from_millis(settings.timeout_ms),
	)?))
}

/// Registry for the HTTP payment backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::PaymentFactory;

	fn factory() -> Self::Factory {
		create_payments
	}
}

impl crate::PaymentRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::PaymentService;
	use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Router};
	use oms_types::PaymentStatus;
	use std::sync::Arc;

	/// Fake payment service. The order id selects the behaviour.
	async fn payments_by_order(Path(order_id): Path<u64>) -> axum::response::Response {
		match order_id {
			1 => (
				StatusCode::OK,
				r#"[{"paymentId":10,"orderId":1,"status":"COMPLETED"},{"paymentId":11,"status":"FAILED"}]"#,
			)
				.into_response(),
			2 => (StatusCode::OK, r#"[{"paymentId":12,"orderId":2,"status":"FAILED"}]"#).into_response(),
			3 => (StatusCode::OK, "[]").into_response(),
			4 => StatusCode::NOT_FOUND.into_response(),
			5 => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
			6 => (StatusCode::OK, "<html>not json</html>").into_response(),
			7 => (StatusCode::OK, r#"[{"status":"REFUNDED"}]"#).into_response(),
			8 => {
				tokio::time::sleep(Duration::from_secs(2)).await;
				(StatusCode::OK, r#"[{"status":"COMPLETED"}]"#).into_response()
			},
			10 => (
				StatusCode::OK,
				r#"[{"paymentId":"pay-7f3a","orderId":-1,"paymentDate":"2024-05-02T10:15:00","totalAmount":"n/a","status":"COMPLETED"}]"#,
			)
				.into_response(),
			_ => (StatusCode::OK, "null").into_response(),
		}
	}

	async fn spawn_payment_service() -> String {
		let app = Router::new().route("/payments/order/{order_id}", get(payments_by_order));
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{}", addr)
	}

	fn service_for(base_url: &str) -> PaymentService {
		let backend = HttpPayments::new(base_url, Duration::from_secs(5)).unwrap();
		PaymentService::new(Arc::new(backend), Duration::from_millis(300))
	}

	#[tokio::test]
	async fn test_backend_returns_first_record() {
		let base_url = spawn_payment_service().await;
		let backend = HttpPayments::new(format!("{}/", base_url), Duration::from_secs(5)).unwrap();

		let payments = backend.payments_for_order(1).await.unwrap();
		assert_eq!(payments, vec![PaymentRecord::with_status(PaymentStatus::Completed)]);

		assert!(matches!(
			backend.payments_for_order(4).await,
			Err(PaymentError::NotFound)
		));
		assert!(matches!(
			backend.payments_for_order(5).await,
			Err(PaymentError::InvalidResponse(_))
		));
	}

	#[tokio::test]
	async fn test_gateway_statuses_against_remote_service() {
		let base_url = spawn_payment_service().await;
		let svc = service_for(&base_url);

		assert_eq!(svc.status_for(1).await, PaymentStatus::Completed);
		assert_eq!(svc.status_for(2).await, PaymentStatus::Failed);
	}

	#[tokio::test]
	async fn test_status_read_despite_unexpected_fields() {
		let base_url = spawn_payment_service().await;
		assert_eq!(
			service_for(&base_url).status_for(10).await,
			PaymentStatus::Completed
		);
	}

	#[tokio::test]
	async fn test_remote_failures_match_no_payments() {
		let base_url = spawn_payment_service().await;
		let svc = service_for(&base_url);

		let no_payments = svc.status_for(3).await;
		assert_eq!(no_payments, PaymentStatus::Pending);

		// not found, 5xx, malformed body, unknown status, timeout, null body
		for order_id in [4, 5, 6, 7, 8, 9] {
			assert_eq!(svc.status_for(order_id).await, no_payments, "order {}", order_id);
		}
	}

	#[tokio::test]
	async fn test_unreachable_service_is_pending() {
		// Bind then drop to get a port nobody listens on
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);

		let svc = service_for(&format!("http://{}", addr));
		assert_eq!(svc.status_for(1).await, PaymentStatus::Pending);
	}

	#[test]
	fn test_factory_validates_config() {
		let missing: toml::Value = toml::from_str("timeout_ms = 100").unwrap();
		assert!(matches!(
			create_payments(&missing),
			Err(PaymentError::Configuration(_))
		));

		let bad_scheme: toml::Value = toml::from_str(r#"base_url = "localhost:8082""#).unwrap();
		assert!(matches!(
			create_payments(&bad_scheme),
			Err(PaymentError::Configuration(_))
		));

		let ok: toml::Value = toml::from_str(
			r#"
base_url = "http://localhost:8082"
timeout_ms = 250
"#,
		)
		.unwrap();
		assert!(create_payments(&ok).is_ok());
	}
}
