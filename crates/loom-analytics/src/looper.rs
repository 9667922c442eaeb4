// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The single consumer that turns queued messages into batches.

use std::sync::Arc;

use loom_analytics_core::{Batch, Message, Properties};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{Consumer, Item};
use crate::upload::UploadPool;

/// Drains the channel, buffers messages and hands full batches to the pool.
///
/// A batch is cut when the buffer reaches `max_batch_size` or when a flush
/// request arrives with a non-empty buffer. The buffer belongs to the looper
/// alone. When cancelled, buffered and still-queued messages are dropped.
pub struct Looper {
	consumer: Consumer,
	pool: Arc<UploadPool>,
	max_batch_size: usize,
	context: Properties,
	cancel: CancellationToken,
	next_sequence: u64,
}

impl Looper {
	pub fn new(
		consumer: Consumer,
		pool: Arc<UploadPool>,
		max_batch_size: usize,
		context: Properties,
		cancel: CancellationToken,
	) -> Self {
		Self {
			consumer,
			pool,
			max_batch_size: max_batch_size.max(1),
			context,
			cancel,
			next_sequence: 0,
		}
	}

	pub async fn run(mut self) {
		info!(
			max_batch_size = self.max_batch_size,
			"Starting analytics looper"
		);

		let mut pending: Vec<Message> = Vec::new();

		while let Some(item) = self.consumer.take(&self.cancel).await {
			let flush_requested = match item {
				Item::Message(message) => {
					pending.push(message);
					false
				}
				Item::Flush if pending.is_empty() => {
					debug!("No messages to flush");
					continue;
				}
				Item::Flush => true,
			};

			if flush_requested || pending.len() >= self.max_batch_size {
				let messages = std::mem::take(&mut pending);
				self.dispatch(messages);
			}
		}

		if !pending.is_empty() {
			warn!(dropped = pending.len(), "Dropping buffered messages on shutdown");
		}
		let discarded = self.consumer.close_and_clear();
		if discarded > 0 {
			warn!(dropped = discarded, "Dropping queued items on shutdown");
		}

		info!(batches = self.next_sequence, "Analytics looper stopped");
	}

	fn dispatch(&mut self, messages: Vec<Message>) {
		let batch = Batch::new(messages, self.next_sequence, self.context.clone());
		self.next_sequence += 1;

		debug!(
			sequence = batch.sequence(),
			size = batch.len(),
			"Uploading batch"
		);
		self.pool.submit(batch);
	}
}
