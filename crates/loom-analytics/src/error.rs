// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics SDK.
//!
//! Only client construction reports errors to the caller. Once a message is
//! handed to [`AnalyticsClient::enqueue`](crate::AnalyticsClient::enqueue),
//! delivery failures are handled inside the pipeline and surface in logs only.

use loom_analytics_core::MessageError;
use thiserror::Error;

/// Analytics SDK errors.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// No write key was configured and no custom transport was supplied.
	#[error("missing write key")]
	MissingWriteKey,

	/// Base URL is missing or cannot be parsed.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	/// A construction-time option is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The HTTP client could not be built.
	#[error("HTTP client error: {0}")]
	HttpClient(#[from] reqwest::Error),

	/// A message failed validation.
	#[error("invalid message: {0}")]
	InvalidMessage(#[from] MessageError),
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
