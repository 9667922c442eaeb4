// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport and end-to-end dispatch against a mock collector.

use std::sync::Arc;
use std::time::Duration;

use loom_analytics::{
	AnalyticsClient, Backoff, Batch, HttpTransport, MessageBuilder, Properties, Transport,
	TransportErrorKind,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WRITE_KEY: &str = "wk_test";
const BASIC_AUTH: &str = "Basic d2tfdGVzdDo=";

fn sample_batch() -> Batch {
	let messages = vec![
		MessageBuilder::track("Signed Up")
			.user_id("user_1")
			.properties(Properties::new().insert("plan", "pro"))
			.build()
			.unwrap(),
		MessageBuilder::group("initech")
			.user_id("user_1")
			.traits(Properties::new().insert("employees", 329))
			.build()
			.unwrap(),
	];
	Batch::new(messages, 0, Properties::new())
}

fn transport(server: &MockServer) -> HttpTransport {
	let client = loom_common_http::builder()
		.timeout(Duration::from_secs(5))
		.build()
		.unwrap();
	HttpTransport::new(client, WRITE_KEY, &server.uri())
}

fn fast_backoff() -> Backoff {
	Backoff {
		base_delay: Duration::from_millis(10),
		max_delay: Duration::from_millis(50),
		factor: 2.0,
		jitter: 0.0,
	}
}

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
	for _ in 0..200 {
		let requests = server.received_requests().await.unwrap_or_default();
		if requests.len() >= count {
			return requests;
		}
		tokio::time::sleep(Duration::from_millis(25)).await;
	}
	panic!("collector did not receive {count} requests");
}

#[tokio::test]
async fn upload_posts_batch_with_basic_auth() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.and(header("authorization", BASIC_AUTH))
		.and(body_partial_json(serde_json::json!({
			"sequence": 0,
			"batch": [
				{"type": "track", "event": "Signed Up", "userId": "user_1"},
				{"type": "group", "groupId": "initech"}
			]
		})))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let result = transport(&server).upload(&sample_batch()).await;
	assert!(result.is_ok(), "upload failed: {result:?}");
}

#[tokio::test]
async fn server_errors_are_transient() {
	let server = MockServer::start().await;
	for status in [429, 500, 503] {
		server.reset().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(status).set_body_string("busy"))
			.mount(&server)
			.await;

		let err = transport(&server)
			.upload(&sample_batch())
			.await
			.unwrap_err();
		assert_eq!(err.kind(), TransportErrorKind::Network, "status {status}");
		assert!(err.message().contains("busy"));
	}
}

#[tokio::test]
async fn client_errors_are_permanent() {
	let server = MockServer::start().await;
	for status in [400, 401, 413] {
		server.reset().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(status))
			.mount(&server)
			.await;

		let err = transport(&server)
			.upload(&sample_batch())
			.await
			.unwrap_err();
		assert_eq!(err.kind(), TransportErrorKind::Other, "status {status}");
	}
}

#[tokio::test]
async fn connection_refused_is_transient() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let client = loom_common_http::builder()
		.timeout(Duration::from_secs(5))
		.build()
		.unwrap();
	let transport = HttpTransport::new(client, WRITE_KEY, &format!("http://{addr}"));

	let err = transport.upload(&sample_batch()).await.unwrap_err();
	assert_eq!(err.kind(), TransportErrorKind::Network);
}

#[tokio::test]
async fn client_delivers_full_batch_over_http() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/batch"))
		.and(header("authorization", BASIC_AUTH))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	let client = AnalyticsClient::builder()
		.write_key(WRITE_KEY)
		.base_url(server.uri())
		.max_batch_size(3)
		.flush_interval(Duration::from_secs(3600))
		.build()
		.unwrap();

	for i in 0..3 {
		client.enqueue(
			MessageBuilder::page(format!("page_{i}"))
				.anonymous_id("anon_1")
				.build()
				.unwrap(),
		);
	}

	let requests = wait_for_requests(&server, 1).await;
	let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
	let names: Vec<&str> = body["batch"]
		.as_array()
		.unwrap()
		.iter()
		.map(|m| m["name"].as_str().unwrap())
		.collect();
	assert_eq!(names, vec!["page_0", "page_1", "page_2"]);
	assert_eq!(body["context"]["library"]["name"], "loom-analytics");

	client.shutdown();
	assert!(client.await_termination(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn client_retries_transient_failure_then_succeeds() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503))
		.up_to_n_times(2)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	let client = AnalyticsClient::builder()
		.transport(Arc::new(transport(&server)))
		.backoff(fast_backoff())
		.flush_interval(Duration::from_secs(3600))
		.build()
		.unwrap();

	client.enqueue(
		MessageBuilder::alias("anon_1")
			.user_id("user_1")
			.build()
			.unwrap(),
	);
	client.flush();

	let requests = wait_for_requests(&server, 3).await;
	assert_eq!(requests.len(), 3);
	for request in &requests {
		let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
		assert_eq!(body["batch"][0]["previousId"], "anon_1");
	}

	client.shutdown();
	assert!(client.await_termination(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn client_drops_batch_on_permanent_failure() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(400))
		.mount(&server)
		.await;

	let client = AnalyticsClient::builder()
		.transport(Arc::new(transport(&server)))
		.backoff(fast_backoff())
		.flush_interval(Duration::from_secs(3600))
		.build()
		.unwrap();

	client.enqueue(
		MessageBuilder::screen("Home")
			.user_id("user_1")
			.build()
			.unwrap(),
	);
	client.flush();

	wait_for_requests(&server, 1).await;
	client.shutdown();
	assert!(client.await_termination(Duration::from_secs(5)).await);

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests.len(), 1);
}
