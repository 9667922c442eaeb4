// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic flush requests.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::channel::Producer;

/// Pushes a flush request into the channel once per `interval`.
///
/// The first request is sent one interval after [`run`](Self::run) starts.
/// The scheduler never uploads anything itself; the looper handles the
/// request in channel order like any manual flush.
pub struct FlushScheduler {
	producer: Producer,
	interval: Duration,
	cancel: CancellationToken,
}

impl FlushScheduler {
	pub fn new(producer: Producer, interval: Duration, cancel: CancellationToken) -> Self {
		Self {
			producer,
			interval,
			cancel,
		}
	}

	pub async fn run(self) {
		info!(
			flush_interval_ms = self.interval.as_millis() as u64,
			"Starting analytics flush scheduler"
		);

		let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				biased;
				_ = self.cancel.cancelled() => break,
				_ = ticker.tick() => {
					debug!("Scheduled flush");
					self.producer.flush();
				}
			}
		}

		info!("Analytics flush scheduler stopped");
	}
}
