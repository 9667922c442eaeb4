// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The message channel between callers and the looper.
//!
//! Producers are cheap to clone and never block. There is exactly one
//! [`Consumer`]; it sees items in the order they were sent, across all
//! producers. Flush requests travel through the same channel as messages, so a
//! flush only ever covers messages sent before it.

use loom_analytics_core::Message;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An element of the channel.
#[derive(Debug)]
pub enum Item {
	Message(Message),
	/// Request to upload whatever is buffered.
	Flush,
}

/// Creates an unbounded channel.
pub fn channel() -> (Producer, Consumer) {
	let (tx, rx) = mpsc::unbounded_channel();
	(Producer { tx }, Consumer { rx })
}

/// Sending half. Cloned freely by the client and the flush scheduler.
#[derive(Debug, Clone)]
pub struct Producer {
	tx: mpsc::UnboundedSender<Item>,
}

impl Producer {
	/// Appends a message to the tail of the channel.
	pub fn enqueue(&self, message: Message) {
		self.send(Item::Message(message));
	}

	/// Appends a flush request to the tail of the channel.
	pub fn flush(&self) {
		self.send(Item::Flush);
	}

	/// True once the consumer is gone; anything sent afterwards is dropped.
	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}

	fn send(&self, item: Item) {
		if let Err(mpsc::error::SendError(item)) = self.tx.send(item) {
			debug!(item = ?item, "Channel closed, dropping item");
		}
	}
}

/// Receiving half, owned by the looper.
#[derive(Debug)]
pub struct Consumer {
	rx: mpsc::UnboundedReceiver<Item>,
}

impl Consumer {
	/// Waits for the next item.
	///
	/// Returns `None` when `cancel` fires or every producer is gone. A
	/// cancelled token wins over an item that is already available.
	pub async fn take(&mut self, cancel: &CancellationToken) -> Option<Item> {
		tokio::select! {
			biased;
			_ = cancel.cancelled() => None,
			item = self.rx.recv() => item,
		}
	}

	/// Closes the channel and discards everything still queued. Returns the
	/// number of discarded items.
	pub fn close_and_clear(&mut self) -> usize {
		self.rx.close();
		let mut discarded = 0;
		while self.rx.try_recv().is_ok() {
			discarded += 1;
		}
		discarded
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::track;

	#[tokio::test]
	async fn test_preserves_insertion_order_across_producers() {
		let (producer, mut consumer) = channel();
		let other = producer.clone();
		let cancel = CancellationToken::new();

		producer.enqueue(track("a"));
		other.flush();
		producer.enqueue(track("b"));

		assert!(matches!(consumer.take(&cancel).await, Some(Item::Message(_))));
		assert!(matches!(consumer.take(&cancel).await, Some(Item::Flush)));
		match consumer.take(&cancel).await {
			Some(Item::Message(m)) => assert_eq!(m.user_id(), Some("user_1")),
			other => panic!("expected message, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_cancellation_wins_over_ready_items() {
		let (producer, mut consumer) = channel();
		let cancel = CancellationToken::new();

		producer.enqueue(track("a"));
		cancel.cancel();

		assert!(consumer.take(&cancel).await.is_none());
	}

	#[tokio::test]
	async fn test_take_wakes_on_cancel() {
		let (_producer, mut consumer) = channel();
		let cancel = CancellationToken::new();

		let waiter = {
			let cancel = cancel.clone();
			tokio::spawn(async move { consumer.take(&cancel).await.is_none() })
		};
		cancel.cancel();

		assert!(waiter.await.unwrap());
	}

	#[tokio::test]
	async fn test_close_and_clear_discards_and_closes() {
		let (producer, mut consumer) = channel();
		producer.enqueue(track("a"));
		producer.flush();
		producer.enqueue(track("b"));

		assert_eq!(consumer.close_and_clear(), 3);
		assert!(producer.is_closed());

		// Sends after close are silently dropped.
		producer.enqueue(track("c"));
		assert_eq!(consumer.close_and_clear(), 0);
	}
}
