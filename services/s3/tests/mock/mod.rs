use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqsend_core::{Error, HttpSend, Result};

/// What the transport saw for one attempt.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: http::Method,
    pub uri: http::Uri,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

/// One scripted transport answer.
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond with this status and body.
    Respond(u16, &'static str),
    /// Fail with a transport error carrying this message.
    Fail(&'static str),
}

/// Transport that answers from a script and records every attempt.
///
/// Once the script is drained the `default` step repeats forever.
#[derive(Debug, Clone)]
pub struct MockHttpSend {
    seen: Arc<Mutex<Vec<Seen>>>,
    script: Arc<Mutex<Vec<Step>>>,
    default: Step,
}

impl MockHttpSend {
    /// Answer every attempt with `default`.
    pub fn always(default: Step) -> Self {
        Self::scripted(Vec::new(), default)
    }

    /// Play `script` front to back, then repeat `default`.
    pub fn scripted(script: Vec<Step>, default: Step) -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(script)),
            default,
        }
    }

    /// Everything recorded so far, in attempt order.
    pub fn attempts(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        self.seen.lock().unwrap().push(Seen {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });

        let step = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                self.default.clone()
            } else {
                script.remove(0)
            }
        };

        match step {
            Step::Respond(status, body) => Ok(http::Response::builder()
                .status(status)
                .body(Bytes::from_static(body.as_bytes()))
                .expect("response must be valid")),
            Step::Fail(message) => Err(Error::transport(message)),
        }
    }
}
