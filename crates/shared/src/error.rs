use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error payload returned by the document API on non-success responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }
}

/// What could be recovered from the body of a failed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// Well-formed JSON carrying a non-empty `detail` string.
    Detail(String),
    /// Well-formed JSON without a usable `detail`.
    Structured,
    /// Empty or not JSON at all.
    Unparsed,
}

impl ErrorBody {
    pub fn parse(raw: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<Value>(raw) else {
            return Self::Unparsed;
        };
        match serde_json::from_value::<ApiErrorBody>(value) {
            Ok(ApiErrorBody {
                detail: Some(Value::String(detail)),
            }) if !detail.is_empty() => Self::Detail(detail),
            _ => Self::Structured,
        }
    }
}
