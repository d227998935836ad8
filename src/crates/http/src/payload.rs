//! Decoding of server error bodies.
//!
//! The API reports failures in several shapes: `{"message": ..}`,
//! `{"detail": ..}`, `{"error": ..}`, a bare JSON string, plain text, or a
//! field map (`{"email": ["already taken"]}`, optionally nested under
//! `errors`). [`ErrorPayload::decode`] tries those shapes in that order.

use serde_json::{Map, Value};

/// Messages attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    pub field: String,
    pub messages: Vec<String>,
}

/// A decoded error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// `{"message": "..."}`
    Message(String),
    /// `{"detail": "..."}`
    Detail(String),
    /// `{"error": "..."}`
    Error(String),
    /// A JSON string or a non-JSON text body.
    Raw(String),
    /// Per-field validation messages, in key order.
    Fields(Vec<FieldErrors>),
    /// Nothing usable.
    Empty,
}

impl ErrorPayload {
    /// Decode a response body.
    pub fn decode(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return ErrorPayload::Empty;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorPayload::Raw(trimmed.to_string()),
        }
    }

    /// Decode an already parsed JSON value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(s) = string_field(map, "message") {
                    return ErrorPayload::Message(s);
                }
                if let Some(s) = string_field(map, "detail") {
                    return ErrorPayload::Detail(s);
                }
                if let Some(s) = string_field(map, "error") {
                    return ErrorPayload::Error(s);
                }

                let fields = match map.get("errors") {
                    Some(Value::Object(nested)) => collect_fields(nested),
                    _ => collect_fields(map),
                };

                if fields.is_empty() {
                    ErrorPayload::Empty
                } else {
                    ErrorPayload::Fields(fields)
                }
            }
            Value::String(s) if !s.trim().is_empty() => ErrorPayload::Raw(s.clone()),
            Value::Array(items) => {
                let messages = string_list(items);
                if messages.is_empty() {
                    ErrorPayload::Empty
                } else {
                    ErrorPayload::Fields(vec![FieldErrors {
                        field: "non_field_errors".to_string(),
                        messages,
                    }])
                }
            }
            _ => ErrorPayload::Empty,
        }
    }

    /// The single most relevant message: the text of a message/detail/error/raw
    /// payload, or the first message of the first field.
    pub fn summary(&self) -> Option<String> {
        match self {
            ErrorPayload::Message(s)
            | ErrorPayload::Detail(s)
            | ErrorPayload::Error(s)
            | ErrorPayload::Raw(s) => Some(s.clone()),
            ErrorPayload::Fields(fields) => fields
                .iter()
                .find_map(|f| f.messages.first().cloned()),
            ErrorPayload::Empty => None,
        }
    }

    /// All field messages joined into one line. Non-field payloads behave
    /// like [`ErrorPayload::summary`].
    pub fn flatten(&self) -> Option<String> {
        match self {
            ErrorPayload::Fields(fields) => {
                let all: Vec<&str> = fields
                    .iter()
                    .flat_map(|f| f.messages.iter().map(String::as_str))
                    .collect();
                if all.is_empty() {
                    None
                } else {
                    Some(all.join(" "))
                }
            }
            other => other.summary(),
        }
    }

    /// Display string: payload summary, then the status table, then `fallback`.
    pub fn describe(&self, status: u16, fallback: &str) -> String {
        self.summary()
            .or_else(|| status_message(status).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Default message for a status code when the body carries nothing usable.
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Invalid data"),
        401 => Some("Login required"),
        403 => Some("Permission denied"),
        404 => Some("Not found"),
        409 => Some("Record already exists"),
        422 => Some("Validation error"),
        500 => Some("Server error"),
        _ => None,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn collect_fields(map: &Map<String, Value>) -> Vec<FieldErrors> {
    map.iter()
        .filter_map(|(field, value)| {
            let messages = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => string_list(items),
                _ => Vec::new(),
            };
            (!messages.is_empty()).then(|| FieldErrors {
                field: field.clone(),
                messages,
            })
        })
        .collect()
}

fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}
