//! Response envelope shared with the messenger service.
//!
//! Application codes are grouped by their first digit:
//! 1xxx rendering, 2xxx validation/auth, 3xxx request shape, 4xxx CRUD.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `null` and absent both deserialize to `None`.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    /// Best available explanation for a response without data.
    pub fn failure_reason(&self) -> String {
        let mut parts = Vec::new();
        if let Some(code) = self.code {
            let text = response_text("", code);
            if text.is_empty() {
                parts.push(format!("code {code}"));
            } else {
                parts.push(format!("{code} {text}"));
            }
        }
        if let Some(e) = self.error.as_deref().filter(|s| !s.is_empty()) {
            parts.push(e.to_string());
        } else if let Some(m) = self.message.as_deref().filter(|s| !s.is_empty()) {
            parts.push(m.to_string());
        }
        if parts.is_empty() {
            "response data is empty".to_string()
        } else {
            format!("response data is empty: {}", parts.join(": "))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    RenderFailed,
    InvalidRequestJson,
    RequestJsonExtractionFailed,
    InputValidationError,
    UnauthorizedAccess,
    BadRequest,
    InvalidLimitValue,
    InvalidOffsetValue,
    InvalidUrlParameters,
    CreateDataFailed,
    UpdateDataFailed,
    DeleteDataFailed,
}

impl ResponseCode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1001 => ResponseCode::RenderFailed,
            1002 => ResponseCode::InvalidRequestJson,
            1003 => ResponseCode::RequestJsonExtractionFailed,
            2001 => ResponseCode::InputValidationError,
            2002 => ResponseCode::UnauthorizedAccess,
            3001 => ResponseCode::BadRequest,
            3002 => ResponseCode::InvalidLimitValue,
            3003 => ResponseCode::InvalidOffsetValue,
            3004 => ResponseCode::InvalidUrlParameters,
            4001 => ResponseCode::CreateDataFailed,
            4002 => ResponseCode::UpdateDataFailed,
            4003 => ResponseCode::DeleteDataFailed,
            _ => return None,
        })
    }

    pub fn text(self) -> &'static str {
        match self {
            ResponseCode::RenderFailed => "failed to render a valid response body",
            ResponseCode::InvalidRequestJson => "failed to extract request body",
            ResponseCode::RequestJsonExtractionFailed => "failed to read JSON body from the request",
            ResponseCode::InputValidationError => "got input validation error",
            ResponseCode::UnauthorizedAccess => "identity is unauthorized to access this API",
            ResponseCode::BadRequest => "bad request",
            ResponseCode::InvalidLimitValue => "invalid limit value",
            ResponseCode::InvalidOffsetValue => "invalid offset value",
            ResponseCode::InvalidUrlParameters => "failed to extract URL parameters",
            ResponseCode::CreateDataFailed => "insert process failed",
            ResponseCode::UpdateDataFailed => "update process failed",
            ResponseCode::DeleteDataFailed => "delete process failed",
        }
    }
}

/// Text for an application code, tagged with `[identifier]` when one is given.
/// Unknown codes yield an empty text.
pub fn response_text(identifier: &str, code: i64) -> String {
    let text = ResponseCode::from_code(code)
        .map(ResponseCode::text)
        .unwrap_or("");
    if identifier.is_empty() {
        text.to_string()
    } else {
        format!("[{identifier}] {text}")
    }
}
