// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Free-form key/value maps carried by messages.
//!
//! The same shape is used for event properties, user and group traits, and
//! the message context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered JSON object used for properties, traits and context.
///
/// # Example
///
/// ```
/// use loom_analytics_core::Properties;
///
/// let traits = Properties::new()
///     .insert("name", "Initech")
///     .insert("employees", 329)
///     .insert("enterprise", true);
/// assert_eq!(traits.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
	inner: Map<String, Value>,
}

impl Properties {
	pub fn new() -> Self {
		Self { inner: Map::new() }
	}

	/// Inserts a key-value pair, replacing any previous value for the key.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Merges `other` into this map. Keys present in both take `other`'s value.
	pub fn merge(mut self, other: Properties) -> Self {
		self.inner.extend(other.inner);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.inner.get(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.inner.iter()
	}

	/// Length in bytes of the compact JSON encoding.
	pub fn encoded_len(&self) -> Result<usize, serde_json::Error> {
		serde_json::to_vec(&self.inner).map(|bytes| bytes.len())
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.inner)
	}
}

impl From<Properties> for Value {
	fn from(props: Properties) -> Self {
		props.into_value()
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self { inner: map }
	}
}

/// Non-object values have no keys to keep and convert to an empty map.
impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self { inner: map },
			_ => Self::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_new_is_empty() {
		let props = Properties::new();
		assert!(props.is_empty());
		assert_eq!(props.len(), 0);
	}

	#[test]
	fn test_insert_mixed_values() {
		let props = Properties::new()
			.insert("plan", "enterprise")
			.insert("seats", 42)
			.insert("trial", false);

		assert_eq!(props.len(), 3);
		assert_eq!(props.get("plan"), Some(&Value::String("enterprise".into())));
		assert_eq!(props.get("seats"), Some(&Value::Number(42.into())));
		assert_eq!(props.get("trial"), Some(&Value::Bool(false)));
	}

	#[test]
	fn test_merge_prefers_other() {
		let merged = Properties::new()
			.insert("a", 1)
			.insert("b", 2)
			.merge(Properties::new().insert("b", 20).insert("c", 3));

		assert_eq!(merged.len(), 3);
		assert_eq!(merged.get("b"), Some(&Value::Number(20.into())));
	}

	#[test]
	fn test_serializes_as_plain_object() {
		let props = Properties::new().insert("industry", "tech");
		let json = serde_json::to_string(&props).unwrap();
		assert_eq!(json, r#"{"industry":"tech"}"#);
	}

	#[test]
	fn test_encoded_len_matches_json() {
		let props = Properties::new().insert("k", "v");
		assert_eq!(props.encoded_len().unwrap(), r#"{"k":"v"}"#.len());
	}

	#[test]
	fn test_from_non_object_value_is_empty() {
		let props = Properties::from(Value::Array(vec![Value::Null]));
		assert!(props.is_empty());
	}

	proptest! {
		#[test]
		fn len_counts_unique_keys(keys in proptest::collection::vec("[a-z]{1,10}", 0..20)) {
			let unique: std::collections::HashSet<_> = keys.iter().cloned().collect();
			let props = keys
				.iter()
				.fold(Properties::new(), |props, key| props.insert(key.clone(), "value"));
			prop_assert_eq!(props.len(), unique.len());
		}
	}
}
