// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test doubles shared by the pipeline's unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use loom_analytics_core::{Batch, Message, MessageBuilder};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::transport::{Transport, TransportError};

pub fn track(event: &str) -> Message {
	MessageBuilder::track(event)
		.user_id("user_1")
		.build()
		.unwrap()
}

pub fn event_names(batch: &Batch) -> Vec<String> {
	batch
		.messages()
		.iter()
		.map(|m| match m.kind() {
			loom_analytics_core::MessageKind::Track { event, .. } => event.clone(),
			other => format!("{:?}", other.message_type()),
		})
		.collect()
}

/// Succeeds on every upload and forwards each batch to a channel.
pub struct RecordingTransport {
	tx: mpsc::UnboundedSender<Batch>,
}

impl RecordingTransport {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<Batch>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
	async fn upload(&self, batch: &Batch) -> Result<(), TransportError> {
		let _ = self.tx.send(batch.clone());
		Ok(())
	}
}

/// Replays a fixed script of results, then succeeds.
pub struct ScriptedTransport {
	script: Mutex<VecDeque<Result<(), TransportError>>>,
	attempts: AtomicUsize,
	attempt_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
	pub fn new(script: Vec<Result<(), TransportError>>) -> Self {
		Self {
			script: Mutex::new(script.into()),
			attempts: AtomicUsize::new(0),
			attempt_times: Mutex::new(Vec::new()),
		}
	}

	pub fn failing_network(times: usize) -> Self {
		Self::new(
			(0..times)
				.map(|i| Err(TransportError::network(format!("connection refused #{i}"))))
				.collect(),
		)
	}

	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub fn attempt_times(&self) -> Vec<Instant> {
		self.attempt_times.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
	async fn upload(&self, _batch: &Batch) -> Result<(), TransportError> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		self.attempt_times.lock().unwrap().push(Instant::now());
		self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
	}
}
