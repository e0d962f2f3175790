//! # Gateway Transport Layer
//!
//! This module provides the backends that carry one serialized command to the
//! gateway and bring the raw reply body back.
//!
//! ## Available Transports
//!
//! - [`http`]: HTTP POST via `reqwest` (production)
//! - [`mock`]: scripted replies for tests, records every request
//!
//! A transport does no parsing and no retrying. Any failure to obtain a 2xx
//! body is reported as a [`TransportFailure`]; the client turns that into a
//! synthetic error [`Response`](crate::response::Response).

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

/// One outgoing POST.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: Url,
    /// JSON body, already free of `null`s.
    pub body: Value,
    /// Full `Authorization` header value, if credentials are configured.
    pub authorization: Option<String>,
    pub timeout: Duration,
}

/// Why no usable reply was obtained. The `Display` text is the status text
/// that follows `"Request failed: "` in the synthetic response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// The gateway answered with a non-2xx status, e.g. `401 Unauthorized`
    #[error("{0}")]
    Status(String),

    #[error("timeout")]
    Timeout,

    /// No connection could be made or it broke mid-exchange
    #[error("{0}")]
    Unreachable(String),

    /// A 2xx reply whose body is not a gateway response
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// A way to deliver a request to the gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the body of a 2xx reply.
    async fn post(&self, request: Request) -> Result<Vec<u8>, TransportFailure>;
}

/// Remove every `null` from a JSON value: object members whose value is
/// `null` and `null` array elements, at any depth.
pub fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(prune_nulls);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_prune_nested_nulls() {
        let mut value = json!({
            "Command": "RegisterCheck",
            "CashierName": null,
            "CheckStrings": [
                {"Register": {"Name": "Tea", "EGAIS": null}},
                null,
                {"PrintText": {"Text": "hi", "Font": null}}
            ],
            "Nested": {"Inner": {"Gone": null, "Kept": 0}}
        });
        prune_nulls(&mut value);
        assert_eq!(
            value,
            json!({
                "Command": "RegisterCheck",
                "CheckStrings": [
                    {"Register": {"Name": "Tea"}},
                    {"PrintText": {"Text": "hi"}}
                ],
                "Nested": {"Inner": {"Kept": 0}}
            })
        );
    }

    #[test]
    fn test_prune_keeps_falsy_values() {
        let mut value = json!({"NumDevice": 0, "Amount": 0.0, "Active": false, "Text": ""});
        let expected = value.clone();
        prune_nulls(&mut value);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_failure_status_text() {
        assert_eq!(TransportFailure::Timeout.to_string(), "timeout");
        assert_eq!(
            TransportFailure::Status("500 Internal Server Error".into()).to_string(),
            "500 Internal Server Error"
        );
        assert_eq!(
            TransportFailure::InvalidBody("eof".into()).to_string(),
            "invalid response body: eof"
        );
    }
}
