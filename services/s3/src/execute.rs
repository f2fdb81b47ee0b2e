use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, Method, Uri};
use log::{debug, warn};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use reqsend_core::{Context, Error, Result};

use crate::constants::URI_ENCODE_SET;
use crate::error_response::ErrorResponse;
use crate::retry::{
    is_http_status_retryable, is_net_err_retryable, is_s3_code_retryable, RetryTimer,
    MAX_ATTEMPTS, SUCCESS_STATUS,
};
use crate::{Credential, RequestSigner};

/// How a request gets signed before it is sent.
#[derive(Debug, Clone, Copy)]
pub enum SignStyle {
    /// `Authorization` header signing.
    Header,
    /// Query-embedded signature valid for the given duration.
    Presign(Duration),
    /// aws-chunked streaming signing with the given chunk size.
    Streaming {
        /// Bytes of body data per signed chunk.
        chunk_size: usize,
    },
}

/// A request body that can be replayed from the start.
///
/// Every attempt after the first rewinds the source before reading it
/// again; a source that cannot rewind makes the executor abort instead
/// of resending a half-consumed body.
pub trait BodySource: Debug + Send + 'static {
    /// Rewind to the first byte so the body can be sent again.
    fn reset(&mut self) -> Result<()>;

    /// Read everything from the current position into memory.
    fn read_to_bytes(&mut self) -> Result<Bytes>;
}

/// BodySource over an in-memory buffer. Reset never fails.
#[derive(Debug, Clone)]
pub struct BytesBody {
    data: Bytes,
    pos: usize,
}

impl BytesBody {
    /// Wrap a buffer as a replayable body.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }
}

impl BodySource for BytesBody {
    fn reset(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn read_to_bytes(&mut self) -> Result<Bytes> {
        let bs = self.data.slice(self.pos..);
        self.pos = self.data.len();
        Ok(bs)
    }
}

/// Logical description of a pending call against the endpoint.
#[derive(Debug)]
pub struct RequestSpec {
    /// Request path below the endpoint, e.g. `/bucket/object`.
    pub path: String,
    /// Query parameters to send, in caller order.
    pub query: Vec<(String, String)>,
    /// Extra headers to send.
    pub headers: HeaderMap,
    /// Request body, replayed from the start on every attempt.
    pub body: Option<Box<dyn BodySource>>,
    /// How the request gets signed.
    pub style: SignStyle,
}

impl RequestSpec {
    /// Describe a call to `path` with header signing and no body.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            style: SignStyle::Header,
        }
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a replayable body.
    pub fn with_body(mut self, body: impl BodySource) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Select the signing style.
    pub fn with_style(mut self, style: SignStyle) -> Self {
        self.style = style;
        self
    }
}

/// Drives signed attempts against one endpoint until an attempt
/// succeeds, fails terminally, or the attempts run out.
///
/// All configuration lives on the executor itself; nothing is shared
/// between calls except the read-only credential.
#[derive(Debug)]
pub struct Executor {
    ctx: Context,
    scheme: Scheme,
    authority: Authority,
    credential: Credential,
    signer: RequestSigner,
    max_attempts: usize,
    backoff_unit: Duration,
}

impl Executor {
    /// Create an executor for the given endpoint, e.g.
    /// `http://127.0.0.1:9000`.
    pub fn new(ctx: Context, endpoint: &str, credential: Credential) -> Result<Self> {
        let uri = Uri::from_str(endpoint)?;
        let parts = uri.into_parts();
        let authority = parts
            .authority
            .ok_or_else(|| Error::request_invalid("endpoint has no host"))?;

        Ok(Self {
            ctx,
            scheme: parts.scheme.unwrap_or(Scheme::HTTP),
            authority,
            credential,
            signer: RequestSigner::new(),
            max_attempts: MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// Change the number of attempts per call.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Change the base backoff unit between attempts.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Execute the request described by `spec`, re-signing and
    /// re-sending on retryable failures.
    ///
    /// Any received response ends the call: successes right away,
    /// terminal failures as-is for the caller to inspect (a 404 in a
    /// negative test is not an error here), and the last retryable
    /// response once the attempts run out. Only transport errors and
    /// non-replayable bodies surface as `Err`.
    pub async fn execute(
        &self,
        method: Method,
        mut spec: RequestSpec,
    ) -> Result<http::Response<Bytes>> {
        let (mut timer, _cancel) = RetryTimer::new(self.max_attempts, self.backoff_unit);
        let mut last_resp: Option<http::Response<Bytes>> = None;
        let mut last_err: Option<Error> = None;

        while let Some(attempt) = timer.next().await {
            // Replay the body from the start on every attempt after the
            // first. A body that cannot rewind must not be resent.
            if attempt > 1 {
                if let Some(body) = spec.body.as_mut() {
                    if let Err(err) = body.reset() {
                        return Err(Error::aborted(
                            "request body cannot be rewound for another attempt",
                        )
                        .with_source(err));
                    }
                }
            }

            // Fresh signature per attempt: the date headers must move.
            let req = match self.new_request(&method, &mut spec) {
                Ok(req) => req,
                Err(err) => {
                    if is_net_err_retryable(&err) {
                        warn!("attempt {attempt} failed to build: {err}, retrying");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            };

            let resp = match self.ctx.http_send(req).await {
                Ok(resp) => resp,
                Err(err) => {
                    if is_net_err_retryable(&err) {
                        warn!("attempt {attempt} failed to send: {err}, retrying");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            };

            if SUCCESS_STATUS.contains(&resp.status()) {
                return Ok(resp);
            }

            let er = ErrorResponse::from_response(resp.status(), resp.body(), &spec.path);
            if is_s3_code_retryable(&er.code) || is_http_status_retryable(resp.status()) {
                warn!(
                    "attempt {attempt} got {} ({}), retrying",
                    resp.status(),
                    er.code
                );
                // The response stays buffered so the caller can still
                // read it if the attempts run out.
                last_resp = Some(resp);
                continue;
            }

            debug!("terminal response {} ({})", resp.status(), er.code);
            return Ok(resp);
        }

        match (last_resp, last_err) {
            (Some(resp), _) => Ok(resp),
            (None, Some(err)) => Err(Error::exhausted(format!(
                "no response after {} attempts",
                self.max_attempts
            ))
            .with_source(err)),
            (None, None) => Err(Error::exhausted("retry loop made no attempts")),
        }
    }

    /// Build and sign one attempt's request.
    fn new_request(&self, method: &Method, spec: &mut RequestSpec) -> Result<http::Request<Bytes>> {
        let uri = self.target_url(&spec.path, &spec.query)?;

        let (mut parts, _) = http::Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(())?
            .into_parts();
        parts.headers = spec.headers.clone();

        let body = match spec.body.as_mut() {
            Some(body) => body.read_to_bytes()?,
            None => Bytes::new(),
        };

        let body = match spec.style {
            SignStyle::Header => {
                self.signer.sign(&mut parts, &self.credential)?;
                body
            }
            SignStyle::Presign(expires_in) => {
                self.signer.presign(&mut parts, &self.credential, expires_in)?;
                body
            }
            SignStyle::Streaming { chunk_size } => {
                self.signer
                    .sign_streaming(&mut parts, &self.credential, &body, chunk_size)?
            }
        };

        Ok(http::Request::from_parts(parts, body))
    }

    /// Path-style target URL below the configured endpoint.
    fn target_url(&self, path: &str, query: &[(String, String)]) -> Result<Uri> {
        let mut paq = encode_path_lossy(path);
        if !paq.starts_with('/') {
            paq.insert(0, '/');
        }
        if !query.is_empty() {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (k, v) in query {
                serializer.append_pair(k, v);
            }
            paq.push('?');
            paq.push_str(&serializer.finish());
        }

        let mut parts = http::uri::Parts::default();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);
        Ok(Uri::from_parts(parts)?)
    }
}

/// Percent-encode a path for the target URL.
///
/// Unlike the canonical-request encoder this one degrades: input that
/// does not percent-decode cleanly is kept as the caller wrote it.
fn encode_path_lossy(path: &str) -> String {
    match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => utf8_percent_encode(&decoded, &URI_ENCODE_SET).to_string(),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_body_consumes_and_resets() {
        let mut body = BytesBody::new(&b"hello"[..]);
        assert_eq!(body.read_to_bytes().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(body.read_to_bytes().unwrap(), Bytes::new());

        body.reset().unwrap();
        assert_eq!(body.read_to_bytes().unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_encode_path_lossy_encodes_segments() {
        assert_eq!(encode_path_lossy("/bucket/my file"), "/bucket/my%20file");
        assert_eq!(
            encode_path_lossy("/bucket/%E4%B8%96"),
            "/bucket/%E4%B8%96"
        );
    }

    #[test]
    fn test_encode_path_lossy_keeps_undecodable_input() {
        assert_eq!(encode_path_lossy("/bucket/%FF"), "/bucket/%FF");
    }

    #[test]
    fn test_target_url_is_path_style() {
        let exec = Executor::new(
            Context::new(),
            "http://127.0.0.1:9000",
            Credential::new("ak", "sk", "us-east-1"),
        )
        .unwrap();

        let uri = exec.target_url("/bucket/object", &[]).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:9000/bucket/object");

        let uri = exec
            .target_url(
                "/bucket",
                &[("list-type".to_string(), "2".to_string())],
            )
            .unwrap();
        assert_eq!(
            uri.to_string(),
            "http://127.0.0.1:9000/bucket?list-type=2"
        );
    }

    #[test]
    fn test_executor_rejects_endpoint_without_host() {
        let err = Executor::new(
            Context::new(),
            "/not-an-endpoint",
            Credential::new("ak", "sk", "us-east-1"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), reqsend_core::ErrorKind::RequestInvalid);
    }
}
