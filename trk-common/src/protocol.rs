//! # Wire Structures
//!
//! Purpose: Define the request object clients send and the uniform response
//! envelope the server writes back.
//!
//! ## Design Principles
//!
//! 1. **One Envelope**: Every response, success or failure, has the same four
//!    fields so clients never special-case error shapes.
//! 2. **External Casing**: Field names are lowerCamelCase on the wire
//!    regardless of Rust naming.
//! 3. **Lenient Input**: Incoming field names match in any ASCII casing
//!    (`userid`, `UserId`, `USERID`) once passed through
//!    [`canonicalize_keys`].
//!
//! ## Wire Example
//!
//! ```text
//! -> {"command":"ping","data":null}
//! <- {"success":true,"message":"Pong","data":{...},"errorCode":""}\n
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;

/// Byte appended after every encoded envelope.
pub const RESPONSE_DELIMITER: u8 = b'\n';

/// A request as it appears on the wire, before the payload is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    /// Command name; matched case-insensitively by the server.
    pub command: String,
    /// Command-specific payload, `null` for commands without one.
    #[serde(default)]
    pub data: Value,
}

impl WireRequest {
    /// Builds a request for the given command and payload.
    pub fn new(command: impl Into<String>, data: Value) -> Self {
        WireRequest {
            command: command.into(),
            data,
        }
    }
}

/// Every field name a request may carry, in its canonical spelling.
const FIELD_NAMES: &[&str] = &[
    "command",
    "data",
    "id",
    "name",
    "email",
    "password",
    "isLeader",
    "tripType",
    "userId",
    "userName",
    "message",
    "rating",
    "tripName",
    "tripId",
    "location",
    "latitude",
    "longitude",
    "description",
    "route",
    "duration",
    "breakSchedule",
    "restPlaces",
    "pointsOfInterest",
    "createdAt",
    "isActive",
    "isPredefined",
    "updatedBy",
];

/// Rewrites object keys, at every depth, that equal a known field name
/// ignoring ASCII case to that name's canonical spelling.
///
/// Unknown keys are left alone. When two keys collapse onto one name the
/// later one in map order wins.
pub fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, mut inner) in std::mem::take(map) {
                canonicalize_keys(&mut inner);
                let key = FIELD_NAMES
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(&key))
                    .map_or(key, |name| (*name).to_string());
                map.insert(key, inner);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize_keys),
        _ => {}
    }
}

/// The uniform response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Whether the command succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Command result; `null` on failure.
    #[serde(default)]
    pub data: Value,
    /// Stable error code on failure, empty on success.
    #[serde(default)]
    pub error_code: String,
}

impl Envelope {
    /// Builds a success envelope carrying `data`.
    pub fn success(data: Value, message: impl Into<String>) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data,
            error_code: String::new(),
        }
    }

    /// Builds a failure envelope with a typed error code.
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            message: message.into(),
            data: Value::Null,
            error_code: code.as_str().to_string(),
        }
    }

    /// Returns the typed error code, if the envelope carries a known one.
    pub fn code(&self) -> Option<ErrorCode> {
        ErrorCode::from_wire(&self.error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_camel_case_fields() {
        let envelope = Envelope::failure(ErrorCode::NotFound, "missing");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "message": "missing",
                "data": null,
                "errorCode": "NOT_FOUND"
            })
        );
    }

    #[test]
    fn success_envelope_has_empty_code() {
        let envelope = Envelope::success(json!([1, 2]), "ok");
        assert!(envelope.success);
        assert_eq!(envelope.error_code, "");
        assert_eq!(envelope.code(), None);
    }

    #[test]
    fn request_defaults_missing_data() {
        let request: WireRequest = serde_json::from_str(r#"{"command":"PING"}"#).unwrap();
        assert_eq!(request.command, "PING");
        assert_eq!(request.data, Value::Null);
    }

    #[test]
    fn keys_match_in_any_case_at_every_depth() {
        let mut value = json!({
            "COMMAND": "update_location",
            "Data": {
                "userid": "u1",
                "LOCATION": {"Latitude": 1.5, "longitude": 2.5},
                "route": [{"LATITUDE": 3.0}],
                "extra": {"Nested": true}
            }
        });
        canonicalize_keys(&mut value);
        assert_eq!(
            value,
            json!({
                "command": "update_location",
                "data": {
                    "userId": "u1",
                    "location": {"latitude": 1.5, "longitude": 2.5},
                    "route": [{"latitude": 3.0}],
                    "extra": {"Nested": true}
                }
            })
        );

        let request: WireRequest = serde_json::from_value(value).unwrap();
        assert_eq!(request.command, "update_location");
        assert_eq!(request.data["userId"], "u1");
    }

    #[test]
    fn string_values_are_not_rewritten() {
        let mut value = json!({"Name": "USERID"});
        canonicalize_keys(&mut value);
        assert_eq!(value, json!({"name": "USERID"}));
    }
}
