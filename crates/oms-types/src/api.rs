//! Error body of the order HTTP API.
//!
//! Every failing endpoint answers with an [`ErrorResponse`]: a stable
//! machine-readable `error` code, a human message and optional structured
//! `details`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// HTTP class of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	BadRequest,
	NotFound,
	Conflict,
	Internal,
}

impl ErrorKind {
	pub fn status_code(self) -> u16 {
		match self {
			ErrorKind::BadRequest => 400,
			ErrorKind::NotFound => 404,
			ErrorKind::Conflict => 409,
			ErrorKind::Internal => 500,
		}
	}
}

/// A failure ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct APIError {
	pub kind: ErrorKind,
	pub code: &'static str,
	pub message: String,
	pub details: Option<serde_json::Value>,
}

impl APIError {
	pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
		Self {
			kind,
			code,
			message: message.into(),
			details: None,
		}
	}

	pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
		self.details = details;
		self
	}

	pub fn status_code(&self) -> u16 {
		self.kind.status_code()
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		ErrorResponse {
			error: self.code.to_string(),
			message: self.message.clone(),
			details: self.details.clone(),
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({}): {}", self.code, self.status_code(), self.message)
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
