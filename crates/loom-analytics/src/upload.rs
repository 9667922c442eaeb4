// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retrying batch uploads and the pool they run on.
//!
//! An [`UploadTask`] owns one batch and drives it through a small state
//! machine:
//!
//! ```text
//! Attempting --success--> Done
//! Attempting --network--> BackingOff --slept--> Attempting
//! Attempting --other----> Abandoned
//! BackingOff --aborted--> Abandoned
//! ```
//!
//! Transient failures are retried without an attempt limit; only the sleep
//! between attempts is capped, by the [`Backoff`] policy.

use std::sync::Arc;

use loom_analytics_core::Batch;
use loom_common_http::{Backoff, RetryableError};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::transport::{Transport, TransportError};

/// Classified result of a single upload attempt.
#[derive(Debug)]
pub enum UploadOutcome {
	Success,
	Retryable(TransportError),
	Permanent(TransportError),
}

impl From<Result<(), TransportError>> for UploadOutcome {
	fn from(result: Result<(), TransportError>) -> Self {
		match result {
			Ok(()) => UploadOutcome::Success,
			Err(err) if err.is_retryable() => UploadOutcome::Retryable(err),
			Err(err) => UploadOutcome::Permanent(err),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
	Attempting,
	BackingOff,
	Done,
	Abandoned,
}

/// How an upload task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
	/// `Done` or `Abandoned`.
	pub state: UploadState,
	/// Number of calls made to the transport.
	pub attempts: u32,
}

/// Delivers one batch, retrying transient failures.
pub struct UploadTask {
	transport: Arc<dyn Transport>,
	batch: Batch,
	backoff: Backoff,
	abort: CancellationToken,
}

impl UploadTask {
	pub fn new(
		transport: Arc<dyn Transport>,
		batch: Batch,
		backoff: Backoff,
		abort: CancellationToken,
	) -> Self {
		Self {
			transport,
			batch,
			backoff,
			abort,
		}
	}

	pub async fn run(self) -> UploadReport {
		let mut retries: u32 = 0;
		let mut attempts: u32 = 0;
		let mut state = UploadState::Attempting;

		loop {
			state = match state {
				UploadState::Attempting => {
					attempts += 1;
					match UploadOutcome::from(self.transport.upload(&self.batch).await) {
						UploadOutcome::Success => {
							debug!(
								sequence = self.batch.sequence(),
								size = self.batch.len(),
								attempts,
								"Uploaded batch"
							);
							UploadState::Done
						}
						UploadOutcome::Retryable(err) => {
							error!(
								error = %err,
								batch = %self.batch,
								attempts,
								"Could not upload batch, retrying"
							);
							UploadState::BackingOff
						}
						UploadOutcome::Permanent(err) => {
							error!(
								error = %err,
								batch = %self.batch,
								attempts,
								"Could not upload batch, dropping it"
							);
							UploadState::Abandoned
						}
					}
				}
				UploadState::BackingOff => {
					let delay = self.backoff.duration(retries);
					debug!(
						sequence = self.batch.sequence(),
						retry = retries,
						delay_ms = delay.as_millis() as u64,
						"Backing off before retry"
					);
					tokio::select! {
						biased;
						_ = self.abort.cancelled() => {
							error!(
								batch = %self.batch,
								"Interrupted while backing off, dropping batch"
							);
							UploadState::Abandoned
						}
						_ = tokio::time::sleep(delay) => {
							retries = retries.saturating_add(1);
							UploadState::Attempting
						}
					}
				}
				UploadState::Done | UploadState::Abandoned => {
					return UploadReport { state, attempts };
				}
			};
		}
	}
}

/// Runs upload tasks with bounded concurrency.
///
/// Batches are independent: the pool imposes no ordering between them, and
/// a later batch may finish before an earlier one.
pub struct UploadPool {
	transport: Arc<dyn Transport>,
	backoff: Backoff,
	permits: Arc<Semaphore>,
	tracker: TaskTracker,
	abort: CancellationToken,
}

impl UploadPool {
	pub fn new(transport: Arc<dyn Transport>, backoff: Backoff, concurrency: usize) -> Self {
		Self {
			transport,
			backoff,
			permits: Arc::new(Semaphore::new(concurrency.max(1))),
			tracker: TaskTracker::new(),
			abort: CancellationToken::new(),
		}
	}

	/// Schedules an upload for `batch`. Returns false, dropping the batch, once
	/// the pool is shut down.
	pub fn submit(&self, batch: Batch) -> bool {
		if self.tracker.is_closed() {
			warn!(batch = %batch, "Upload pool is shut down, dropping batch");
			return false;
		}

		let permits = Arc::clone(&self.permits);
		let abort = self.abort.clone();
		let task = UploadTask::new(
			Arc::clone(&self.transport),
			batch,
			self.backoff.clone(),
			self.abort.clone(),
		);

		self.tracker.spawn(async move {
			let _permit = tokio::select! {
				biased;
				_ = abort.cancelled() => {
					warn!(batch = %task.batch, "Upload pool aborted before batch started, dropping it");
					return;
				}
				permit = permits.acquire_owned() => match permit {
					Ok(permit) => permit,
					Err(_) => return,
				},
			};
			task.run().await;
		});
		true
	}

	/// Stops accepting batches. Uploads already submitted keep running,
	/// including their retries.
	pub fn shutdown(&self) {
		self.tracker.close();
	}

	/// Like [`shutdown`](Self::shutdown), and also interrupts backoff sleeps so
	/// retrying uploads give up.
	pub fn abort(&self) {
		self.shutdown();
		self.abort.cancel();
	}

	pub fn is_shutdown(&self) -> bool {
		self.tracker.is_closed()
	}

	/// Number of submitted uploads that have not finished.
	pub fn in_flight(&self) -> usize {
		self.tracker.len()
	}

	/// Waits until the pool is shut down and every submitted upload finished.
	pub async fn wait(&self) {
		self.tracker.wait().await;
	}
}
