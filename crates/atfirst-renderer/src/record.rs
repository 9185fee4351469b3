//! Lenient typed views over untyped record payloads.
//!
//! Record values come from arbitrary repositories, so nothing here assumes a
//! field exists or has the right type. Every accessor returns `Option` and
//! callers substitute absence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::facet::Facet;

/// A record as returned by `com.atproto.repo.listRecords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub uri: String,
    #[serde(default)]
    pub value: Value,
}

impl RawRecord {
    pub fn rkey(&self) -> &str {
        crate::escape::rkey(&self.uri)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        str_field(&self.value, key)
    }
}

/// String field of an object, if present and string-typed.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Non-negative integer field of an object, if present and numeric.
pub fn u64_field(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}

/// Author block of a post view or quoted record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Author {
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

impl Author {
    /// `None` when there is no handle to link to.
    pub fn from_value(value: &Value) -> Option<Self> {
        let handle = str_field(value, "handle")?.to_string();
        Some(Self {
            handle,
            display_name: str_field(value, "displayName")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            avatar: str_field(value, "avatar").map(str::to_string),
        })
    }

    /// Display name, or the handle when the name is missing or empty.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.handle)
    }
}

/// The parts of an `app.bsky.feed.post` record the renderer uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostRecord {
    pub text: String,
    pub created_at: Option<String>,
    pub facets: Vec<Facet>,
    pub reply_parent: Option<String>,
}

impl PostRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            text: str_field(value, "text").unwrap_or_default().to_string(),
            created_at: str_field(value, "createdAt").map(str::to_string),
            facets: Facet::parse_all(value.get("facets")),
            reply_parent: value
                .pointer("/reply/parent/uri")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
