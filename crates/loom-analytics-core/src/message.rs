// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics messages.
//!
//! A [`Message`] is one analytics call: track, identify, group, alias, screen
//! or page. Every variant shares the same envelope (id, timestamp, user and
//! anonymous identifiers, context, integrations) and carries its own payload
//! in [`MessageKind`]. Messages are immutable; they are created through
//! [`MessageBuilder`], which validates required fields before anything is
//! produced.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MessageError, Result};
use crate::properties::Properties;

/// Maximum encoded size of a properties, traits or context map (1 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Unique identifier for a message.
///
/// UUIDv7, so ids sort roughly by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
	pub fn new() -> Self {
		let uuid7_val = uuid7::uuid7();
		Self(Uuid::from_bytes(*uuid7_val.as_bytes()))
	}
}

impl Default for MessageId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for MessageId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::str::FromStr for MessageId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// The `type` discriminator of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
	Track,
	Identify,
	Group,
	Alias,
	Screen,
	Page,
}

impl MessageType {
	pub fn as_str(&self) -> &'static str {
		match self {
			MessageType::Track => "track",
			MessageType::Identify => "identify",
			MessageType::Group => "group",
			MessageType::Alias => "alias",
			MessageType::Screen => "screen",
			MessageType::Page => "page",
		}
	}
}

impl std::fmt::Display for MessageType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Variant-specific payload of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageKind {
	/// An action the user performed.
	Track {
		event: String,
		#[serde(default, skip_serializing_if = "Properties::is_empty")]
		properties: Properties,
	},
	/// Who the user is, with traits about them.
	Identify {
		#[serde(default, skip_serializing_if = "Properties::is_empty")]
		traits: Properties,
	},
	/// Associates the user with a group (company, team, account, ...).
	Group {
		#[serde(rename = "groupId")]
		group_id: String,
		#[serde(default, skip_serializing_if = "Properties::is_empty")]
		traits: Properties,
	},
	/// Merges a previous identity into the current one.
	Alias {
		#[serde(rename = "previousId")]
		previous_id: String,
	},
	/// A screen view in a mobile app.
	Screen {
		name: String,
		#[serde(default, skip_serializing_if = "Properties::is_empty")]
		properties: Properties,
	},
	/// A page view on a website.
	Page {
		name: String,
		#[serde(default, skip_serializing_if = "Properties::is_empty")]
		properties: Properties,
	},
}

impl MessageKind {
	pub fn message_type(&self) -> MessageType {
		match self {
			MessageKind::Track { .. } => MessageType::Track,
			MessageKind::Identify { .. } => MessageType::Identify,
			MessageKind::Group { .. } => MessageType::Group,
			MessageKind::Alias { .. } => MessageType::Alias,
			MessageKind::Screen { .. } => MessageType::Screen,
			MessageKind::Page { .. } => MessageType::Page,
		}
	}
}

/// One analytics event, ready to be queued.
///
/// # Example
///
/// ```
/// use loom_analytics_core::{MessageBuilder, MessageType, Properties};
///
/// let message = MessageBuilder::group("initech")
///     .user_id("user_123")
///     .traits(Properties::new().insert("employees", 329))
///     .build()
///     .unwrap();
///
/// assert_eq!(message.message_type(), MessageType::Group);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	message_id: MessageId,
	timestamp: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	anonymous_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	context: Option<Properties>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	integrations: Option<BTreeMap<String, bool>>,
	#[serde(flatten)]
	kind: MessageKind,
}

impl Message {
	pub fn message_id(&self) -> MessageId {
		self.message_id
	}

	pub fn timestamp(&self) -> DateTime<Utc> {
		self.timestamp
	}

	pub fn user_id(&self) -> Option<&str> {
		self.user_id.as_deref()
	}

	pub fn anonymous_id(&self) -> Option<&str> {
		self.anonymous_id.as_deref()
	}

	pub fn context(&self) -> Option<&Properties> {
		self.context.as_ref()
	}

	pub fn integrations(&self) -> Option<&BTreeMap<String, bool>> {
		self.integrations.as_ref()
	}

	pub fn kind(&self) -> &MessageKind {
		&self.kind
	}

	pub fn message_type(&self) -> MessageType {
		self.kind.message_type()
	}

	/// Starts a builder pre-filled with this message's fields.
	///
	/// The rebuilt message gets a fresh id and, unless overridden, a fresh
	/// timestamp.
	pub fn to_builder(&self) -> MessageBuilder {
		let (kind, payload) = match &self.kind {
			MessageKind::Track { event, properties } => (
				MessageKind::Track {
					event: event.clone(),
					properties: Properties::new(),
				},
				Some(properties.clone()),
			),
			MessageKind::Identify { traits } => (
				MessageKind::Identify {
					traits: Properties::new(),
				},
				Some(traits.clone()),
			),
			MessageKind::Group { group_id, traits } => (
				MessageKind::Group {
					group_id: group_id.clone(),
					traits: Properties::new(),
				},
				Some(traits.clone()),
			),
			MessageKind::Alias { previous_id } => (
				MessageKind::Alias {
					previous_id: previous_id.clone(),
				},
				None,
			),
			MessageKind::Screen { name, properties } => (
				MessageKind::Screen {
					name: name.clone(),
					properties: Properties::new(),
				},
				Some(properties.clone()),
			),
			MessageKind::Page { name, properties } => (
				MessageKind::Page {
					name: name.clone(),
					properties: Properties::new(),
				},
				Some(properties.clone()),
			),
		};

		let mut builder = MessageBuilder::new(kind);
		builder.user_id = self.user_id.clone();
		builder.anonymous_id = self.anonymous_id.clone();
		builder.context = self.context.clone();
		builder.integrations = self.integrations.clone();
		match payload {
			Some(p) if matches!(kind_accepts(&builder.kind), Payload::Traits) => {
				builder.traits = Some(p)
			}
			Some(p) => builder.properties = Some(p),
			None => {}
		}
		builder
	}
}

enum Payload {
	Properties,
	Traits,
	Nothing,
}

fn kind_accepts(kind: &MessageKind) -> Payload {
	match kind {
		MessageKind::Track { .. } | MessageKind::Screen { .. } | MessageKind::Page { .. } => {
			Payload::Properties
		}
		MessageKind::Identify { .. } | MessageKind::Group { .. } => Payload::Traits,
		MessageKind::Alias { .. } => Payload::Nothing,
	}
}

/// Fluent builder for [`Message`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
	kind: MessageKind,
	user_id: Option<String>,
	anonymous_id: Option<String>,
	context: Option<Properties>,
	integrations: Option<BTreeMap<String, bool>>,
	properties: Option<Properties>,
	traits: Option<Properties>,
	timestamp: Option<DateTime<Utc>>,
}

impl MessageBuilder {
	fn new(kind: MessageKind) -> Self {
		Self {
			kind,
			user_id: None,
			anonymous_id: None,
			context: None,
			integrations: None,
			properties: None,
			traits: None,
			timestamp: None,
		}
	}

	/// Starts a track message for the named event.
	pub fn track(event: impl Into<String>) -> Self {
		Self::new(MessageKind::Track {
			event: event.into(),
			properties: Properties::new(),
		})
	}

	pub fn identify() -> Self {
		Self::new(MessageKind::Identify {
			traits: Properties::new(),
		})
	}

	/// Starts a group message. `group_id` is the group's id in your database.
	pub fn group(group_id: impl Into<String>) -> Self {
		Self::new(MessageKind::Group {
			group_id: group_id.into(),
			traits: Properties::new(),
		})
	}

	/// Starts an alias message merging `previous_id` into the current user.
	pub fn alias(previous_id: impl Into<String>) -> Self {
		Self::new(MessageKind::Alias {
			previous_id: previous_id.into(),
		})
	}

	pub fn screen(name: impl Into<String>) -> Self {
		Self::new(MessageKind::Screen {
			name: name.into(),
			properties: Properties::new(),
		})
	}

	pub fn page(name: impl Into<String>) -> Self {
		Self::new(MessageKind::Page {
			name: name.into(),
			properties: Properties::new(),
		})
	}

	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn anonymous_id(mut self, anonymous_id: impl Into<String>) -> Self {
		self.anonymous_id = Some(anonymous_id.into());
		self
	}

	pub fn context(mut self, context: Properties) -> Self {
		self.context = Some(context);
		self
	}

	/// Enables or disables delivery to a single destination.
	pub fn integration(mut self, name: impl Into<String>, enabled: bool) -> Self {
		self
			.integrations
			.get_or_insert_with(BTreeMap::new)
			.insert(name.into(), enabled);
		self
	}

	/// Sets event properties. Valid on track, screen and page messages.
	pub fn properties(mut self, properties: Properties) -> Self {
		self.properties = Some(properties);
		self
	}

	/// Sets traits. Valid on identify and group messages.
	pub fn traits(mut self, traits: Properties) -> Self {
		self.traits = Some(traits);
		self
	}

	/// Overrides the event time, e.g. when importing historical data.
	pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Validates the accumulated fields and produces the message.
	pub fn build(self) -> Result<Message> {
		let kind_name = self.kind.message_type().as_str();
		let accepts = kind_accepts(&self.kind);

		if self.properties.is_some() && !matches!(accepts, Payload::Properties) {
			return Err(MessageError::UnsupportedField {
				field: "properties",
				kind: kind_name,
			});
		}
		if self.traits.is_some() && !matches!(accepts, Payload::Traits) {
			return Err(MessageError::UnsupportedField {
				field: "traits",
				kind: kind_name,
			});
		}

		let user_id = self.user_id.filter(|id| !id.trim().is_empty());
		let anonymous_id = self.anonymous_id.filter(|id| !id.trim().is_empty());
		if user_id.is_none() && anonymous_id.is_none() {
			return Err(MessageError::MissingIdentity);
		}

		if let Some(context) = &self.context {
			check_size("context", context)?;
		}

		let kind = match self.kind {
			MessageKind::Track { event, .. } => {
				require("event", &event)?;
				let properties = self.properties.unwrap_or_default();
				check_size("properties", &properties)?;
				MessageKind::Track { event, properties }
			}
			MessageKind::Identify { .. } => {
				let traits = self.traits.unwrap_or_default();
				check_size("traits", &traits)?;
				MessageKind::Identify { traits }
			}
			MessageKind::Group { group_id, .. } => {
				require("group_id", &group_id)?;
				let traits = self.traits.unwrap_or_default();
				check_size("traits", &traits)?;
				MessageKind::Group { group_id, traits }
			}
			MessageKind::Alias { previous_id } => {
				require("previous_id", &previous_id)?;
				MessageKind::Alias { previous_id }
			}
			MessageKind::Screen { name, .. } => {
				require("name", &name)?;
				let properties = self.properties.unwrap_or_default();
				check_size("properties", &properties)?;
				MessageKind::Screen { name, properties }
			}
			MessageKind::Page { name, .. } => {
				require("name", &name)?;
				let properties = self.properties.unwrap_or_default();
				check_size("properties", &properties)?;
				MessageKind::Page { name, properties }
			}
		};

		Ok(Message {
			message_id: MessageId::new(),
			timestamp: self.timestamp.unwrap_or_else(Utc::now),
			user_id,
			anonymous_id,
			context: self.context,
			integrations: self.integrations,
			kind,
		})
	}
}

fn require(field: &'static str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(MessageError::EmptyField(field));
	}
	Ok(())
}

fn check_size(field: &'static str, props: &Properties) -> Result<()> {
	let size = props.encoded_len()?;
	if size > MAX_PAYLOAD_SIZE {
		return Err(MessageError::TooLarge {
			field,
			size,
			max: MAX_PAYLOAD_SIZE,
		});
	}
	Ok(())
}
