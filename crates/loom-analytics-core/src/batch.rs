// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batches of messages handed to the transport as one upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::properties::Properties;

/// An ordered, immutable group of messages uploaded together.
///
/// Messages keep the order in which they were enqueued. `sequence` counts
/// batches produced by one client, starting at 0, so batches can be put back
/// in creation order even when their uploads complete out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
	batch: Vec<Message>,
	#[serde(rename = "sentAt")]
	created_at: DateTime<Utc>,
	sequence: u64,
	#[serde(default, skip_serializing_if = "Properties::is_empty")]
	context: Properties,
}

impl Batch {
	pub fn new(messages: Vec<Message>, sequence: u64, context: Properties) -> Self {
		Self {
			batch: messages,
			created_at: Utc::now(),
			sequence,
			context,
		}
	}

	pub fn messages(&self) -> &[Message] {
		&self.batch
	}

	pub fn created_at(&self) -> DateTime<Utc> {
		self.created_at
	}

	pub fn sequence(&self) -> u64 {
		self.sequence
	}

	pub fn context(&self) -> &Properties {
		&self.context
	}

	pub fn len(&self) -> usize {
		self.batch.len()
	}

	pub fn is_empty(&self) -> bool {
		self.batch.is_empty()
	}

	pub fn into_messages(self) -> Vec<Message> {
		self.batch
	}
}

impl std::fmt::Display for Batch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Batch{{sequence={}, size={}, sent_at={}}}",
			self.sequence,
			self.batch.len(),
			self.created_at.to_rfc3339()
		)
	}
}
