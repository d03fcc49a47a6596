//! RFC 9457 Problem Details for HTTP APIs, as received from remote services.
//!
//! Remote APIs are not always strict about the format, so deserialization is
//! lenient: missing or `null` members fall back to defaults, unknown members
//! are kept as extensions, and validation errors are accepted both as a list
//! of violations and as a `field -> [messages]` map.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Default problem type when none is supplied.
pub const ABOUT_BLANK: &str = "about:blank";

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Accepts a numeric status or `null`; `null` keeps the default.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u16>::deserialize(deserializer)? {
        Some(code) => StatusCode::from_u16(code).map_err(serde::de::Error::custom),
        None => Ok(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn deserialize_type_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
        .map(|value| value.unwrap_or_else(|| ABOUT_BLANK.to_owned()))
}

/// Messages for one field in the map form; some servers send a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireViolations {
    List(Vec<ValidationViolation>),
    ByField(BTreeMap<String, FieldMessages>),
}

fn deserialize_violations<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<ValidationViolation>>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<WireViolations>::deserialize(deserializer)?;
    Ok(wire.map(|wire| match wire {
        WireViolations::List(list) => list,
        WireViolations::ByField(map) => map
            .into_iter()
            .flat_map(|(field, messages)| {
                let messages = match messages {
                    FieldMessages::Many(many) => many,
                    FieldMessages::One(one) => vec![one],
                };
                messages.into_iter().map(move |message| ValidationViolation {
                    field: field.clone(),
                    message,
                    code: None,
                })
            })
            .collect(),
    }))
}

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[must_use]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type", deserialize_with = "deserialize_type_url")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    #[serde(deserialize_with = "deserialize_nullable_string")]
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    /// Serializes as u16 for RFC 9457 compatibility.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    /// A human-readable explanation specific to this occurrence of the problem.
    #[serde(deserialize_with = "deserialize_nullable_string")]
    pub detail: String,
    /// A URI reference that identifies the specific occurrence of the problem.
    #[serde(deserialize_with = "deserialize_nullable_string")]
    pub instance: String,
    /// Optional machine-readable error code defined by the application.
    #[serde(deserialize_with = "deserialize_nullable_string")]
    pub code: String,
    /// Optional trace id useful for tracing.
    #[serde(alias = "traceId", skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Optional validation errors for 4xx problems.
    #[serde(
        deserialize_with = "deserialize_violations",
        skip_serializing_if = "Option::is_none"
    )]
    pub errors: Option<Vec<ValidationViolation>>,
    /// Extension members not covered by the fields above.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Individual validation violation for a specific field or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// field path, e.g. "email" or "user.email"
    #[serde(default, alias = "pointer")]
    pub field: String,
    /// Human-readable message describing the validation error
    #[serde(alias = "detail")]
    pub message: String,
    /// Optional machine-readable error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "", "")
    }
}

impl Problem {
    /// Create a new Problem with the given status, title, and detail.
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: ABOUT_BLANK.to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            trace_id: None,
            errors: None,
            extensions: Map::new(),
        }
    }

    /// Parse a problem document received with the given response status.
    ///
    /// The response status wins over any `status` member in the body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `body` is not a JSON object of the
    /// expected shape.
    pub fn from_response_body(status: StatusCode, body: &[u8]) -> Result<Self, serde_json::Error> {
        let problem: Self = serde_json::from_slice(body)?;
        Ok(problem.with_status(status))
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    #[must_use]
    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ValidationViolation>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Look up an extension member by name.
    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }
}
