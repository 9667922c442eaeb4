// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of batches to the collector.
//!
//! The pipeline only cares whether an upload succeeded, failed transiently
//! ([`TransportErrorKind::Network`]) or failed for good
//! ([`TransportErrorKind::Other`]). Everything about HTTP lives behind the
//! [`Transport`] trait.

use loom_analytics_core::Batch;
use loom_common_http::{is_retryable_status, RetryableError};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// How an upload failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
	/// Transient failure; the batch is retried after a backoff.
	Network,
	/// Any other failure; the batch is dropped.
	Other,
}

impl std::fmt::Display for TransportErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TransportErrorKind::Network => f.write_str("network"),
			TransportErrorKind::Other => f.write_str("other"),
		}
	}
}

/// A categorized upload failure.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
	kind: TransportErrorKind,
	message: String,
}

impl TransportError {
	pub fn network(message: impl Into<String>) -> Self {
		Self {
			kind: TransportErrorKind::Network,
			message: message.into(),
		}
	}

	pub fn other(message: impl Into<String>) -> Self {
		Self {
			kind: TransportErrorKind::Other,
			message: message.into(),
		}
	}

	pub fn kind(&self) -> TransportErrorKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl RetryableError for TransportError {
	fn is_retryable(&self) -> bool {
		self.kind == TransportErrorKind::Network
	}
}

impl From<reqwest::Error> for TransportError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_retryable() {
			TransportError::network(err.to_string())
		} else {
			TransportError::other(err.to_string())
		}
	}
}

/// Delivers one batch per call.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Makes exactly one delivery attempt for `batch`.
	async fn upload(&self, batch: &Batch) -> Result<(), TransportError>;
}

/// Uploads batches as JSON to `{base_url}/v1/batch`.
///
/// The write key is sent as the basic-auth username with an empty password.
pub struct HttpTransport {
	http_client: Client,
	write_key: String,
	url: String,
}

impl HttpTransport {
	pub fn new(http_client: Client, write_key: impl Into<String>, base_url: &str) -> Self {
		Self {
			http_client,
			write_key: write_key.into(),
			url: format!("{}/v1/batch", base_url.trim_end_matches('/')),
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn upload(&self, batch: &Batch) -> Result<(), TransportError> {
		debug!(
			url = %self.url,
			sequence = batch.sequence(),
			size = batch.len(),
			"Sending analytics batch"
		);

		let response = self
			.http_client
			.post(&self.url)
			.basic_auth(&self.write_key, Some(""))
			.json(batch)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}

		let body = response.text().await.unwrap_or_default();
		let message = format!("server returned {}: {}", status.as_u16(), body);
		if is_retryable_status(status) {
			Err(TransportError::network(message))
		} else {
			Err(TransportError::other(message))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_display() {
		assert_eq!(
			TransportError::network("connection reset").to_string(),
			"network error: connection reset"
		);
		assert_eq!(
			TransportError::other("rejected").to_string(),
			"other error: rejected"
		);
	}

	#[test]
	fn test_only_network_is_retryable() {
		assert!(TransportError::network("timeout").is_retryable());
		assert!(!TransportError::other("bad request").is_retryable());
	}

	#[test]
	fn test_url_normalizes_trailing_slash() {
		let client = loom_common_http::builder().build().unwrap();
		let transport = HttpTransport::new(client, "key", "https://collector.example.com/");
		assert_eq!(transport.url(), "https://collector.example.com/v1/batch");
	}
}
