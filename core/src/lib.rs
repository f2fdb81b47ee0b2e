//! Core components for signing and resending API requests.
//!
//! This crate provides the foundational types shared by every service
//! crate in the reqsend workspace:
//!
//! - **Context**: a container holding the HTTP transport used to send
//!   requests, pluggable through the [`HttpSend`] trait
//! - **SigningRequest**: a decomposed view of an `http::request::Parts`
//!   that signers canonicalize and write back
//! - **Error**: the error type shared across the workspace
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use reqsend_core::{Context, HttpSend, Result};
//!
//! #[derive(Debug)]
//! struct MySend;
//!
//! #[async_trait::async_trait]
//! impl HttpSend for MySend {
//!     async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
//!         todo!("hand the request to your HTTP client of choice")
//!     }
//! }
//!
//! let ctx = Context::new().with_http_send(MySend);
//! ```
//!
//! Service crates (e.g. `reqsend-s3`) build the actual signing and
//! retry logic on top of these pieces.

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::HttpSend;
pub use context::NoopHttpSend;

mod error;
pub use error::{Error, ErrorKind, Result};

mod request;
pub use request::SigningRequest;
