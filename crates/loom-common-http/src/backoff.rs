// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Capped exponential backoff with jitter.

use std::time::Duration;

/// Exponent beyond which every supported factor has already hit any cap.
const MAX_EXPONENT: u32 = 64;

/// Maps a retry attempt number to a sleep duration.
///
/// The undelayed curve is `base_delay * factor^attempt`, clamped to
/// `max_delay`. Jitter then randomizes the realized delay downwards: with
/// `jitter = 1.0` (full jitter) the delay is uniform in `[0, ceiling]`, with
/// `jitter = 0.0` it is exactly the ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub factor: f64,
	pub jitter: f64,
}

impl Default for Backoff {
	fn default() -> Self {
		Self {
			base_delay: Duration::from_secs(30),
			max_delay: Duration::from_secs(60 * 60),
			factor: 2.0,
			jitter: 1.0,
		}
	}
}

impl Backoff {
	/// Upper bound of the delay for `attempt`, before jitter.
	///
	/// Non-decreasing in `attempt` and never above `max_delay`.
	pub fn ceiling(&self, attempt: u32) -> Duration {
		let factor = self.factor.max(1.0);
		let exponent = attempt.min(MAX_EXPONENT) as i32;
		let exponential = self.base_delay.as_secs_f64() * factor.powi(exponent);
		let capped = exponential.min(self.max_delay.as_secs_f64());
		Duration::from_secs_f64(capped)
	}

	/// True when `factor` and `jitter` are finite and `jitter` is in `[0, 1]`.
	pub fn is_valid(&self) -> bool {
		self.factor.is_finite() && self.jitter.is_finite() && (0.0..=1.0).contains(&self.jitter)
	}

	/// Jittered delay to sleep before retry number `attempt` (0-based).
	///
	/// A non-finite `jitter` is treated as zero.
	pub fn duration(&self, attempt: u32) -> Duration {
		let ceiling = self.ceiling(attempt);
		let jitter = if self.jitter.is_finite() {
			self.jitter.clamp(0.0, 1.0)
		} else {
			0.0
		};
		if jitter == 0.0 {
			return ceiling;
		}

		let scale = 1.0 - jitter * fastrand::f64();
		ceiling.mul_f64(scale)
	}
}
