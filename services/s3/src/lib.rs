//! AWS SigV4 signing and resilient execution for S3-compatible
//! services.
//!
//! Three things live here:
//!
//! - [`RequestSigner`]: header-based, presigned-URL and aws-chunked
//!   streaming SigV4 signatures over `http::request::Parts`
//! - [`is_signed`] / [`verify_presign`]: recompute-and-compare
//!   verification of inbound requests
//! - [`Executor`]: a retry loop that re-signs and re-sends a request
//!   with exponential backoff, replaying the body safely and
//!   classifying failures into retryable and terminal ones
//!
//! ## Example
//!
//! ```no_run
//! use http::Method;
//! use reqsend_core::Context;
//! use reqsend_s3::{BytesBody, Credential, Executor, RequestSpec};
//!
//! # async fn example() -> reqsend_core::Result<()> {
//! let ctx = Context::new(); // plug in a transport with with_http_send
//! let cred = Credential::new("access_key", "secret_key", "us-east-1");
//! let executor = Executor::new(ctx, "http://127.0.0.1:9000", cred)?;
//!
//! let spec = RequestSpec::new("/bucket/object")
//!     .with_body(BytesBody::new(&b"hello"[..]));
//! let resp = executor.execute(Method::PUT, spec).await?;
//! assert!(resp.status().is_success());
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod streaming;
pub use streaming::{signed_chunk_length, stream_content_length};

mod verify;
pub use verify::{is_signed, verify_presign};

mod error_response;
pub use error_response::ErrorResponse;

mod retry;
pub use retry::{
    is_http_status_retryable, is_net_err_retryable, is_s3_code_retryable, RetryCancel,
    RetryTimer, MAX_ATTEMPTS, SUCCESS_STATUS,
};

mod execute;
pub use execute::{BodySource, BytesBody, Executor, RequestSpec, SignStyle};
