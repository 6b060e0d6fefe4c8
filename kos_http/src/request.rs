use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::KosError;

/// Outbound request descriptor. The body is opaque JSON to the gateway.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub id:      Uuid,
    pub method:  Method,
    pub path:    String,
    pub query:   Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body:    Option<Value>,
    retried:     bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id:      Uuid::new_v4(),
            method,
            path:    path.into(),
            query:   Vec::new(),
            headers: HeaderMap::new(),
            body:    None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, KosError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Overwrites `Authorization` with `Bearer <token>`. A token that cannot
    /// be a header value leaves the request untouched.
    pub fn set_bearer(&mut self, token: &str) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            self.headers.insert(AUTHORIZATION, value);
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    /// Set once the request has been through a refresh cycle.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// Whatever the backend answered, with the body kept as raw bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, KosError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Non-2xx answers become [`KosError::Api`] with the most specific
    /// message the backend provided.
    pub fn error_for_status(self) -> Result<Self, KosError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(KosError::Api {
            code: self.status.as_u16(),
            msg:  self.error_message(),
        })
    }

    /// `error`, then the first non-empty string in `details`, then `message`,
    /// then the status reason phrase.
    pub fn error_message(&self) -> String {
        #[derive(Deserialize)]
        struct Body {
            error:   Option<String>,
            message: Option<String>,
            details: Option<serde_json::Map<String, Value>>,
        }

        let parsed = serde_json::from_slice::<Body>(&self.body).ok();
        if let Some(body) = parsed {
            if let Some(error) = body.error.filter(|e| !e.is_empty()) {
                return error;
            }
            let detail = body.details.as_ref().and_then(|details| {
                details
                    .values()
                    .filter_map(Value::as_str)
                    .find(|s| !s.is_empty())
                    .map(str::to_owned)
            });
            if let Some(detail) = detail {
                return detail;
            }
            if let Some(message) = body.message.filter(|m| !m.is_empty()) {
                return message;
            }
        }
        self.status
            .canonical_reason()
            .unwrap_or("unexpected error")
            .to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_is_replaced_not_appended() {
        let mut req = ApiRequest::get("/drivers/me");
        req.set_bearer("A1");
        req.set_bearer("A2");
        assert_eq!(req.headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(req.bearer(), Some("A2"));
    }

    #[test]
    fn error_message_prefers_error_field() {
        let resp = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Ride not found","message":"ignored"}"#,
        );
        assert_eq!(resp.error_message(), "Ride not found");
    }

    #[test]
    fn error_message_falls_back_to_details_then_message() {
        let resp = ApiResponse::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"details":{"email":"","phone":"Phone is required"},"message":"Validation failed"}"#,
        );
        assert_eq!(resp.error_message(), "Phone is required");

        let resp = ApiResponse::new(StatusCode::CONFLICT, r#"{"message":"Already accepted"}"#);
        assert_eq!(resp.error_message(), "Already accepted");
    }

    #[test]
    fn error_for_status_uses_reason_for_opaque_bodies() {
        let err = ApiResponse::new(StatusCode::BAD_GATEWAY, "<html>")
            .error_for_status()
            .unwrap_err();
        match err {
            KosError::Api { code, msg } => {
                assert_eq!(code, 502);
                assert_eq!(msg, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
