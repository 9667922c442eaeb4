// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Loom.
//!
//! This crate provides:
//! - A pre-configured HTTP client builder with a consistent User-Agent header
//! - A capped exponential backoff policy with jitter
//! - Classification of HTTP failures into retryable and permanent

mod backoff;
mod client;
mod retryable;

pub use backoff::Backoff;
pub use client::{builder, user_agent};
pub use retryable::{is_retryable_status, RetryableError};
