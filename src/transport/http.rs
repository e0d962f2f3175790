//! # HTTP Transport
//!
//! POSTs the command JSON to `{base_url}/Execute/sync` with `reqwest`.
//!
//! The per-request timeout bounds the whole exchange (connect, send, read);
//! when it elapses the call fails with [`TransportFailure::Timeout`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use crate::error::KkmError;

use super::{Request, Transport, TransportFailure};

const USER_AGENT: &str = concat!("kkmserver-client/", env!("CARGO_PKG_VERSION"));

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, KkmError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }

    /// Use an already configured client (proxies, TLS roots, ...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn classify(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Unreachable(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: Request) -> Result<Vec<u8>, TransportFailure> {
        let mut builder = self
            .http
            .post(request.url)
            .timeout(request.timeout)
            .json(&request.body);
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status.to_string()));
        }

        let body = response.bytes().await.map_err(classify)?;
        Ok(body.to_vec())
    }
}
