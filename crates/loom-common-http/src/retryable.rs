// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Classification of HTTP failures into retryable and permanent.

use reqwest::StatusCode;

const RETRYABLE_STATUSES: [StatusCode; 6] = [
	StatusCode::TOO_MANY_REQUESTS,
	StatusCode::REQUEST_TIMEOUT,
	StatusCode::INTERNAL_SERVER_ERROR,
	StatusCode::BAD_GATEWAY,
	StatusCode::SERVICE_UNAVAILABLE,
	StatusCode::GATEWAY_TIMEOUT,
];

/// Errors that know whether repeating the request could succeed.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() || self.is_request() {
			return true;
		}

		self.status().is_some_and(is_retryable_status)
	}
}

/// Returns true for statuses that signal a transient server-side condition.
pub fn is_retryable_status(status: StatusCode) -> bool {
	RETRYABLE_STATUSES.contains(&status)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_retryable_statuses() {
		for status in [429, 408, 500, 502, 503, 504] {
			let status = StatusCode::from_u16(status).unwrap();
			assert!(is_retryable_status(status), "{status} should be retryable");
		}
	}

	#[test]
	fn test_permanent_statuses() {
		for status in [400, 401, 403, 404, 413, 422, 501] {
			let status = StatusCode::from_u16(status).unwrap();
			assert!(!is_retryable_status(status), "{status} should not be retryable");
		}
	}
}
