// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom analytics dispatch pipeline.
//!
//! This crate holds the data shapes shared by the SDK and anything that
//! inspects what the SDK sends: [`Message`] (track, identify, group, alias,
//! screen and page calls), the [`Properties`] maps they carry, and the
//! [`Batch`] envelope that groups messages for upload.
//!
//! # Example
//!
//! ```
//! use loom_analytics_core::{Batch, MessageBuilder, Properties};
//!
//! let signup = MessageBuilder::track("Signed Up")
//!     .user_id("user_123")
//!     .properties(Properties::new().insert("plan", "pro"))
//!     .build()?;
//!
//! let company = MessageBuilder::group("initech")
//!     .user_id("user_123")
//!     .traits(Properties::new().insert("employees", 329))
//!     .build()?;
//!
//! let batch = Batch::new(vec![signup, company], 0, Properties::new());
//! assert_eq!(batch.len(), 2);
//! # Ok::<(), loom_analytics_core::MessageError>(())
//! ```

pub mod batch;
pub mod error;
pub mod message;
pub mod properties;

pub use batch::Batch;
pub use error::{MessageError, Result};
pub use message::{
	Message, MessageBuilder, MessageId, MessageKind, MessageType, MAX_PAYLOAD_SIZE,
};
pub use properties::Properties;
