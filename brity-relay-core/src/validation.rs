//! Record validation
//!
//! Turns a loosely typed candidate (a decoded request body, a form submission,
//! a CLI argument) into a normalized [`AccountRecord`]. Pure and safe to call
//! with untrusted input; nothing here touches storage.

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::types::{AccountRecord, HeaderMap};

const KNOWN_FIELDS: [&str; 6] = [
    "account_id",
    "email",
    "display_name",
    "headers",
    "selected",
    "cookies",
];

/// Parse a candidate from JSON text.
pub fn parse_candidate(text: &str) -> CoreResult<Value> {
    serde_json::from_str(text).map_err(|_| CoreError::malformed("candidate"))
}

/// Validate a candidate and normalize it into an [`AccountRecord`].
///
/// - `account_id` and `email` must be non-empty strings after trimming.
/// - `headers` (and `cookies`, when present) must be a JSON object, or text
///   holding one. Blank text or an absent `headers` field yields an empty map.
/// - `display_name` is optional and trimmed; `selected` must be a boolean.
/// - Any other fields are carried into the record untouched.
pub fn validate_candidate(candidate: &Value) -> CoreResult<AccountRecord> {
    let fields = candidate.as_object().ok_or_else(CoreError::missing_field)?;

    let account_id = required_string(fields, "account_id")?;
    let email = required_string(fields, "email")?;

    let display_name = match fields.get("display_name") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(CoreError::malformed("display_name")),
    };

    let headers = decode_mapping(fields.get("headers"), "headers")?.unwrap_or_default();
    let cookies = decode_mapping(fields.get("cookies"), "cookies")?;

    let selected = match fields.get("selected") {
        None => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(_) => return Err(CoreError::Validation("malformed selected flag".to_string())),
    };

    let extra = fields
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<Map<_, _>>();

    Ok(AccountRecord {
        account_id,
        email,
        display_name,
        headers,
        selected,
        cookies,
        extra,
    })
}

/// Apply the candidate rules to an already typed record.
///
/// Identity and display name are trimmed the same way [`validate_candidate`]
/// trims them, so `" a1 "` and `"a1"` name the same account.
pub fn normalize_record(mut record: AccountRecord) -> CoreResult<AccountRecord> {
    record.account_id = record.account_id.trim().to_string();
    record.email = record.email.trim().to_string();
    record.display_name = record.display_name.trim().to_string();
    if record.account_id.is_empty() || record.email.is_empty() {
        return Err(CoreError::missing_field());
    }
    Ok(record)
}

fn required_string(fields: &Map<String, Value>, key: &str) -> CoreResult<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(CoreError::missing_field)
}

/// Decode a header-shaped field. `Ok(None)` means the field was absent.
fn decode_mapping(value: Option<&Value>, field: &str) -> CoreResult<Option<HeaderMap>> {
    match value {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(Some(HeaderMap::new())),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(CoreError::malformed(field)),
        },
        Some(_) => Err(CoreError::malformed(field)),
    }
}
