//! Account record type definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header / cookie bag: string keys mapped to structured JSON values
pub type HeaderMap = Map<String, Value>;

/// One managed sending account
///
/// Fields the store does not interpret are collected into `extra` and written
/// back unchanged, so other collaborators can persist their own data per record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    /// Identity key, unique within the account set
    pub account_id: String,
    /// Mailbox the account sends as
    pub email: String,
    /// Presentation name (may be empty)
    #[serde(default)]
    pub display_name: String,
    /// Request headers used when acting as this account
    #[serde(default)]
    pub headers: HeaderMap,
    /// Whether this is the active sending account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// Session cookies used when acting as this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<HeaderMap>,
    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountRecord {
    /// Build a record with the required fields and empty headers.
    pub fn new(account_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            email: email.into(),
            display_name: String::new(),
            headers: HeaderMap::new(),
            selected: None,
            cookies: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn is_selected(&self) -> bool {
        self.selected == Some(true)
    }

    /// Name to show for this account: the display name, or the ID when it is empty
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.account_id
        } else {
            &self.display_name
        }
    }

    /// Case-insensitive comparison against a sender address
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Redacted account view for listings
///
/// Carries no header or cookie contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: String,
    pub email: String,
    pub display_name: String,
    pub is_selected: bool,
    pub has_cookies: bool,
    pub has_headers: bool,
}

impl From<&AccountRecord> for AccountSummary {
    fn from(record: &AccountRecord) -> Self {
        Self {
            account_id: record.account_id.clone(),
            email: record.email.clone(),
            display_name: record.label().to_string(),
            is_selected: record.is_selected(),
            has_cookies: record.cookies.as_ref().is_some_and(|c| !c.is_empty()),
            has_headers: !record.headers.is_empty(),
        }
    }
}
