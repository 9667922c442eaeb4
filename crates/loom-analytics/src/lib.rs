// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for dispatching Loom analytics messages.
//!
//! Callers enqueue [`Message`]s; a background looper groups them into
//! batches and hands each batch to an upload pool that delivers it to the
//! collector, retrying transient failures with capped exponential backoff.
//!
//! # Quick Start
//!
//! ```ignore
//! use loom_analytics::{AnalyticsClient, MessageBuilder, Properties};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnalyticsClient::builder()
//!         .write_key("wk_live_xxx")
//!         .base_url("https://collector.example.com")
//!         .max_batch_size(100)
//!         .flush_interval(Duration::from_secs(10))
//!         .build()?;
//!
//!     client.enqueue(
//!         MessageBuilder::identify()
//!             .user_id("user_123")
//!             .traits(Properties::new().insert("plan", "pro"))
//!             .build()?,
//!     );
//!
//!     client.enqueue(
//!         MessageBuilder::group("initech")
//!             .user_id("user_123")
//!             .traits(Properties::new().insert("employees", 329))
//!             .build()?,
//!     );
//!
//!     client.flush();
//!     client.shutdown();
//!     client.await_termination(Duration::from_secs(5)).await;
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! | Stage | Type | Notes |
//! |-------|------|-------|
//! | Channel | [`channel::Producer`] / [`channel::Consumer`] | Unbounded FIFO of messages and flush requests |
//! | Looper | [`looper::Looper`] | Cuts a batch at `max_batch_size` or on a flush request |
//! | Scheduler | [`scheduler::FlushScheduler`] | Sends a flush request every `flush_interval` |
//! | Upload | [`upload::UploadPool`] / [`upload::UploadTask`] | Concurrent uploads, unbounded retries on network errors |
//! | Transport | [`Transport`] / [`HttpTransport`] | One delivery attempt per call |
//!
//! # Delivery Semantics
//!
//! Delivery is best effort. `enqueue` and `flush` never fail and never
//! block; delivery problems appear only in `tracing` output. Network errors
//! are retried forever with backoff; any other error drops the batch.
//! [`AnalyticsClient::shutdown`] discards messages that have not been batched
//! yet, and batches uploaded concurrently may arrive in any order.

pub mod channel;
pub mod client;
pub mod error;
pub mod looper;
pub mod scheduler;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod test_utils;

pub use client::{AnalyticsClient, AnalyticsClientBuilder, ClientConfig};
pub use error::{AnalyticsError, Result};
pub use transport::{HttpTransport, Transport, TransportError, TransportErrorKind};
pub use upload::{UploadOutcome, UploadReport, UploadState};

pub use loom_analytics_core::{
	Batch, Message, MessageBuilder, MessageError, MessageId, MessageKind, MessageType, Properties,
};
pub use loom_common_http::Backoff;
