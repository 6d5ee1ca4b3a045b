use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One offending input field, reported back to the client with 422.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Location of the field, e.g. `["body", "title"]`
    pub loc: Vec<String>,
    /// Human-readable reason
    pub msg: String,
    /// Machine-readable error kind
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: loc.iter().map(ToString::to_string).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }

    pub fn missing(loc: &[&str]) -> Self {
        Self::new(loc, "Field required", "missing")
    }

    pub fn string_type(loc: &[&str]) -> Self {
        Self::new(loc, "Input should be a valid string", "string_type")
    }

    pub fn int_parsing(loc: &[&str]) -> Self {
        Self::new(
            loc,
            "Input should be a valid integer, unable to parse string as an integer",
            "int_parsing",
        )
    }

    pub fn json_invalid(reason: &str) -> Self {
        Self::new(
            &["body"],
            format!("JSON decode error: {reason}"),
            "json_invalid",
        )
    }
}

/// Request bodies that are checked field by field before they are accepted.
///
/// Every offending field is collected, not just the first one.
pub trait Validate: Sized {
    fn validate(body: &Value) -> Result<Self, Vec<FieldError>>;
}

/// Top-level body must be a JSON object.
pub(crate) fn as_object(body: &Value) -> Result<&Map<String, Value>, Vec<FieldError>> {
    body.as_object().ok_or_else(|| {
        vec![FieldError::new(
            &["body"],
            "Input should be a valid dictionary or object to extract fields from",
            "model_attributes_type",
        )]
    })
}

pub(crate) fn required_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::string_type(&["body", field]));
            None
        }
        None => {
            errors.push(FieldError::missing(&["body", field]));
            None
        }
    }
}

/// `null` and absence both mean "not supplied".
pub(crate) fn optional_string(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match object.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            errors.push(FieldError::string_type(&["body", field]));
            None
        }
    }
}

/// Parses a non-negative integer query parameter, falling back to `default`.
pub(crate) fn non_negative_param(
    raw: Option<&String>,
    field: &str,
    default: i64,
    errors: &mut Vec<FieldError>,
) -> i64 {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 0 => value,
        Ok(_) => {
            errors.push(FieldError::new(
                &["query", field],
                "Input should be greater than or equal to 0",
                "greater_than_equal",
            ));
            default
        }
        Err(_) => {
            errors.push(FieldError::int_parsing(&["query", field]));
            default
        }
    }
}
