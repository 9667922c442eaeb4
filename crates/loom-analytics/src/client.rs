// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics client: owns the channel, the looper, the flush scheduler and
//! the upload pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loom_analytics_core::{Message, Properties};
use loom_common_http::Backoff;
use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::channel::{channel, Producer};
use crate::error::{AnalyticsError, Result};
use crate::looper::Looper;
use crate::scheduler::FlushScheduler;
use crate::transport::{HttpTransport, Transport};
use crate::upload::UploadPool;

/// SDK version reported in each batch's library context.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
/// SDK name reported in each batch's library context.
const SDK_NAME: &str = "loom-analytics";

/// Construction-time configuration for the analytics client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Number of buffered messages that triggers an upload.
	pub max_batch_size: usize,
	/// Interval between automatic flush requests.
	pub flush_interval: Duration,
	/// Number of batches uploaded concurrently.
	pub upload_concurrency: usize,
	/// Timeout for each HTTP upload request.
	pub request_timeout: Duration,
	/// Delay policy between retries of a failed upload.
	pub backoff: Backoff,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			max_batch_size: 250,
			flush_interval: Duration::from_secs(10),
			upload_concurrency: 1,
			request_timeout: Duration::from_secs(10),
			backoff: Backoff::default(),
		}
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<()> {
		if self.max_batch_size == 0 {
			return Err(AnalyticsError::InvalidConfig(
				"max_batch_size must be at least 1".to_string(),
			));
		}
		if self.upload_concurrency == 0 {
			return Err(AnalyticsError::InvalidConfig(
				"upload_concurrency must be at least 1".to_string(),
			));
		}
		if self.flush_interval.is_zero() {
			return Err(AnalyticsError::InvalidConfig(
				"flush_interval must be greater than zero".to_string(),
			));
		}
		if !self.backoff.is_valid() {
			return Err(AnalyticsError::InvalidConfig(
				"backoff factor must be finite and jitter within [0, 1]".to_string(),
			));
		}
		Ok(())
	}
}

/// Builder for constructing an [`AnalyticsClient`].
pub struct AnalyticsClientBuilder {
	write_key: Option<String>,
	base_url: Option<String>,
	transport: Option<Arc<dyn Transport>>,
	config: ClientConfig,
}

impl AnalyticsClientBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			write_key: None,
			base_url: None,
			transport: None,
			config: ClientConfig::default(),
		}
	}

	/// Sets the write key used to authenticate uploads.
	pub fn write_key(mut self, key: impl Into<String>) -> Self {
		self.write_key = Some(key.into());
		self
	}

	/// Sets the base URL of the collector.
	///
	/// Example: `https://collector.example.com`
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	/// Replaces the HTTP transport. The write key and base URL are then
	/// not required.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Sets the number of buffered messages that triggers an upload.
	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.config.max_batch_size = size;
		self
	}

	/// Sets the interval between automatic flushes.
	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.config.flush_interval = interval;
		self
	}

	/// Sets how many batches may be uploaded at the same time.
	pub fn upload_concurrency(mut self, concurrency: usize) -> Self {
		self.config.upload_concurrency = concurrency;
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets the retry backoff policy.
	pub fn backoff(mut self, backoff: Backoff) -> Self {
		self.config.backoff = backoff;
		self
	}

	/// Builds the client and starts its background tasks.
	///
	/// Must be called from within a Tokio runtime.
	pub fn build(self) -> Result<AnalyticsClient> {
		self.config.validate()?;

		let transport = match self.transport {
			Some(transport) => transport,
			None => {
				let write_key = self
					.write_key
					.filter(|key| !key.is_empty())
					.ok_or(AnalyticsError::MissingWriteKey)?;
				let base_url = self
					.base_url
					.ok_or_else(|| AnalyticsError::InvalidBaseUrl("missing".to_string()))?;
				let base_url = base_url.trim_end_matches('/').to_string();
				Url::parse(&base_url)
					.map_err(|e| AnalyticsError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

				let http_client = loom_common_http::builder()
					.timeout(self.config.request_timeout)
					.build()?;

				info!(base_url = %base_url, "Using HTTP transport");
				Arc::new(HttpTransport::new(http_client, write_key, &base_url)) as Arc<dyn Transport>
			}
		};

		Ok(AnalyticsClient::start(transport, self.config))
	}
}

impl Default for AnalyticsClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Client for dispatching analytics messages.
///
/// `enqueue` and `flush` are fire-and-forget: they never block and never
/// report delivery problems. Failures are retried or dropped in the
/// background and show up only in logs.
///
/// Shutdown is lossy. Messages not yet batched are discarded, and batches
/// still uploading may not finish.
///
/// # Example
///
/// ```ignore
/// use loom_analytics::{AnalyticsClient, MessageBuilder, Properties};
/// use std::time::Duration;
///
/// let client = AnalyticsClient::builder()
///     .write_key("wk_live_xxx")
///     .base_url("https://collector.example.com")
///     .max_batch_size(100)
///     .flush_interval(Duration::from_secs(10))
///     .build()?;
///
/// client.enqueue(
///     MessageBuilder::track("Order Completed")
///         .user_id("user_123")
///         .properties(Properties::new().insert("total", 99.99))
///         .build()?,
/// );
///
/// client.flush();
/// client.shutdown();
/// ```
pub struct AnalyticsClient {
	producer: Producer,
	pool: Arc<UploadPool>,
	cancel: CancellationToken,
	background: TaskTracker,
	config: ClientConfig,
	closed: AtomicBool,
}

impl AnalyticsClient {
	/// Creates a new builder for constructing an AnalyticsClient.
	pub fn builder() -> AnalyticsClientBuilder {
		AnalyticsClientBuilder::new()
	}

	fn start(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
		let (producer, consumer) = channel();
		let cancel = CancellationToken::new();
		let pool = Arc::new(UploadPool::new(
			transport,
			config.backoff.clone(),
			config.upload_concurrency,
		));

		let looper = Looper::new(
			consumer,
			Arc::clone(&pool),
			config.max_batch_size,
			library_context(),
			cancel.clone(),
		);
		let scheduler = FlushScheduler::new(producer.clone(), config.flush_interval, cancel.clone());

		let background = TaskTracker::new();
		background.spawn(looper.run());
		background.spawn(scheduler.run());
		background.close();

		info!(
			max_batch_size = config.max_batch_size,
			flush_interval_ms = config.flush_interval.as_millis() as u64,
			upload_concurrency = config.upload_concurrency,
			"Analytics client initialized"
		);

		Self {
			producer,
			pool,
			cancel,
			background,
			config,
			closed: AtomicBool::new(false),
		}
	}

	/// Queues a message for delivery. Dropped silently after shutdown.
	pub fn enqueue(&self, message: Message) {
		if self.is_shutdown() {
			debug!(
				message_id = %message.message_id(),
				"Client is shut down, dropping message"
			);
			return;
		}
		self.producer.enqueue(message);
	}

	/// Requests an upload of everything queued before this call.
	///
	/// A flush with nothing buffered does nothing.
	pub fn flush(&self) {
		if self.is_shutdown() {
			return;
		}
		self.producer.flush();
	}

	/// Stops consuming messages, discards queued ones and stops the flush
	/// timer. Uploads already running continue, including their retries, but
	/// no new uploads start. Calling it again has no effect.
	pub fn shutdown(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}

		info!("Shutting down analytics client");
		self.cancel.cancel();
		self.pool.shutdown();
	}

	/// Like [`shutdown`](Self::shutdown), and also interrupts retry backoffs
	/// so batches waiting to retry are dropped.
	pub fn shutdown_now(&self) {
		self.shutdown();
		self.pool.abort();
	}

	/// Waits up to `timeout` for the background tasks and every submitted
	/// upload to finish after shutdown. Returns false on timeout.
	pub async fn await_termination(&self, timeout: Duration) -> bool {
		let all = async {
			self.background.wait().await;
			self.pool.wait().await;
		};
		tokio::time::timeout(timeout, all).await.is_ok()
	}

	/// Returns true if the client has been shut down.
	pub fn is_shutdown(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}
}

impl Drop for AnalyticsClient {
	fn drop(&mut self) {
		self.shutdown();
	}
}

fn library_context() -> Properties {
	Properties::new().insert(
		"library",
		serde_json::json!({ "name": SDK_NAME, "version": SDK_VERSION }),
	)
}
