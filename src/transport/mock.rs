//! # Mock Transport
//!
//! In-memory transport for tests. Replies are served in the order they were
//! scripted; once the script runs out the transport either echoes an `Ok`
//! response for the submitted command or fails, depending on how it was
//! created.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Request, Transport, TransportFailure};

type Reply = Result<Vec<u8>, TransportFailure>;

/// Scripted transport that records what it was asked to send.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Request>>,
    echo: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Fails every request that has no scripted reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers unscripted requests with `Status: 0` for the same command.
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Queue a JSON reply body.
    pub fn reply_json(&self, body: Value) -> &Self {
        self.reply_body(body.to_string().into_bytes())
    }

    /// Queue a raw reply body.
    pub fn reply_body(&self, body: impl Into<Vec<u8>>) -> &Self {
        lock(&self.replies).push_back(Ok(body.into()));
        self
    }

    /// Queue a transport failure.
    pub fn fail(&self, failure: TransportFailure) -> &Self {
        lock(&self.replies).push_back(Err(failure));
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        lock(&self.requests).clone()
    }

    fn echo_reply(body: &Value) -> Vec<u8> {
        json!({
            "Status": 0,
            "Error": "",
            "Command": body.get("Command").cloned().unwrap_or(Value::Null),
            "IdCommand": body.get("IdCommand").cloned().unwrap_or(Value::Null),
        })
        .to_string()
        .into_bytes()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: Request) -> Result<Vec<u8>, TransportFailure> {
        let scripted = lock(&self.replies).pop_front();
        let reply = match scripted {
            Some(reply) => reply,
            None if self.echo => Ok(Self::echo_reply(&request.body)),
            None => Err(TransportFailure::Unreachable(
                "no scripted reply".to_string(),
            )),
        };
        lock(&self.requests).push(request);
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(body: Value) -> Request {
        Request {
            url: "http://localhost:5893/Execute/sync".parse().unwrap(),
            body,
            authorization: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockTransport::new();
        mock.reply_body("first").fail(TransportFailure::Timeout);

        assert_eq!(mock.post(request(json!({}))).await.unwrap(), b"first");
        assert_eq!(
            mock.post(request(json!({}))).await,
            Err(TransportFailure::Timeout)
        );
        assert!(matches!(
            mock.post(request(json!({}))).await,
            Err(TransportFailure::Unreachable(_))
        ));
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_echo() {
        let mock = MockTransport::echo();
        let body = mock
            .post(request(json!({"Command": "XReport", "IdCommand": "e1"})))
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["Status"], 0);
        assert_eq!(value["Command"], "XReport");
        assert_eq!(value["IdCommand"], "e1");
    }
}
