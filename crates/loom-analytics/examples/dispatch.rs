// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: dispatch a few analytics messages to a collector.
//!
//! Run with:
//!   LOOM_WRITE_KEY=wk_xxx RUST_LOG=loom_analytics=debug \
//!     cargo run --example dispatch -p loom-analytics

use std::time::Duration;

use loom_analytics::{AnalyticsClient, MessageBuilder, Properties};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let write_key = std::env::var("LOOM_WRITE_KEY")?;
	let base_url = std::env::var("LOOM_COLLECTOR_URL")
		.unwrap_or_else(|_| "http://localhost:8080".to_string());

	let client = AnalyticsClient::builder()
		.write_key(write_key)
		.base_url(&base_url)
		.max_batch_size(2)
		.flush_interval(Duration::from_secs(5))
		.build()?;

	client.enqueue(
		MessageBuilder::identify()
			.user_id("user_example_123")
			.traits(Properties::new().insert("plan", "pro"))
			.build()?,
	);
	client.enqueue(
		MessageBuilder::group("initech")
			.user_id("user_example_123")
			.traits(Properties::new().insert("employees", 329))
			.build()?,
	);
	client.enqueue(
		MessageBuilder::track("Example Ran")
			.user_id("user_example_123")
			.integration("All", true)
			.build()?,
	);
	client.flush();

	// Give the uploads a moment before shutting down; shutdown discards
	// anything not yet batched.
	tokio::time::sleep(Duration::from_secs(2)).await;
	client.shutdown();

	if !client.await_termination(Duration::from_secs(10)).await {
		println!("Some uploads were still running at exit");
	}
	Ok(())
}
