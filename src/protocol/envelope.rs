//! Consistent response envelope for every protocol reply.
//!
//! Every reply is either [`ApiResponse`] (success) or [`ApiErrorResponse`]
//! (error), ensuring a uniform JSON shape on each output line.

use chrono::Utc;
use serde::Serialize;

use crate::service::ServiceError;

/// Protocol version reported in every reply.
pub const PROTOCOL_VERSION: &str = "1";

/// Metadata included in every reply.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
    /// Echo of the request's `id`, when it carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

impl ResponseMeta {
    fn new(id: Option<serde_json::Value>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: PROTOCOL_VERSION,
            id,
        }
    }
}

/// Successful reply: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, id: Option<serde_json::Value>) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(id),
        }
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error reply: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(code: &str, msg: impl Into<String>, id: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::new(id),
        }
    }

    pub fn bad_request(msg: impl Into<String>, id: Option<serde_json::Value>) -> Self {
        Self::build("BAD_REQUEST", msg, id)
    }

    pub fn from_service(err: &ServiceError, id: Option<serde_json::Value>) -> Self {
        Self::build(err.code(), err.to_string(), id)
    }
}
