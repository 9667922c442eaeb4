// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for message construction.

use thiserror::Error;

/// Errors raised while building a [`Message`](crate::Message).
///
/// Construction fails fast: a builder either yields a fully valid message or
/// one of these errors, never a partially valid message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
	#[error("{0} cannot be empty")]
	EmptyField(&'static str),

	#[error("either user_id or anonymous_id must be provided")]
	MissingIdentity,

	#[error("{field} too large: {size} bytes (max {max})")]
	TooLarge {
		field: &'static str,
		size: usize,
		max: usize,
	},

	#[error("{field} is not supported on {kind} messages")]
	UnsupportedField {
		field: &'static str,
		kind: &'static str,
	},

	#[error("serialization error: {0}")]
	Serialization(String),
}

impl From<serde_json::Error> for MessageError {
	fn from(err: serde_json::Error) -> Self {
		MessageError::Serialization(err.to_string())
	}
}

/// A specialized `Result` type for message construction.
pub type Result<T> = std::result::Result<T, MessageError>;
