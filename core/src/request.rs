use std::mem;
use std::str::FromStr;

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::Error;
use crate::Result;

/// Signing context for request.
///
/// A decomposed view of `http::request::Parts` that signers mutate
/// (canonicalize query, insert headers) and then write back.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters, percent-decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();

        // Take the headers out of the request to avoid copy.
        // We will return them when applying the context.
        Self::from_components(parts.method.clone(), uri, mem::take(&mut parts.headers))
    }

    /// Build a signing context by copying from http::request::Parts,
    /// leaving the parts untouched.
    ///
    /// Verification uses this since an inbound request must not be
    /// mutated while checking its signature.
    pub fn copied_from(parts: &http::request::Parts) -> Result<Self> {
        Self::from_components(
            parts.method.clone(),
            parts.uri.clone().into_parts(),
            parts.headers.clone(),
        )
    }

    fn from_components(
        method: Method,
        uri: http::uri::Parts,
        headers: HeaderMap,
    ) -> Result<Self> {
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method,
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers,
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        let query_size = self.query_size();

        // Return headers back.
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            // Return scheme back.
            uri_parts.scheme = Some(self.scheme);
            // Return authority back.
            uri_parts.authority = Some(self.authority);
            // Build path and query.
            uri_parts.path_and_query = {
                let paq = if query_size == 0 {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(query_size + self.query.len() * 2);

                    s.push('?');
                    for (i, (k, v)) in self.query.iter().enumerate() {
                        if i > 0 {
                            s.push('&');
                        }

                        s.push_str(k);
                        if !v.is_empty() {
                            s.push('=');
                            s.push_str(v);
                        }
                    }

                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Normalize header value by trimming leading and trailing spaces.
    pub fn header_value_normalize(v: &mut HeaderValue) {
        let bs = v.as_bytes();

        let starting_index = bs.iter().position(|b| *b != b' ').unwrap_or(0);
        let ending_offset = bs.iter().rev().position(|b| *b != b' ').unwrap_or(0);
        let ending_index = bs.len() - ending_offset;

        // This can't fail because we started with a valid HeaderValue and then only trimmed spaces
        *v = HeaderValue::from_bytes(&bs[starting_index..ending_index])
            .expect("invalid header value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parts_for(uri: &str) -> http::request::Parts {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(())
            .expect("request must be valid")
            .into_parts()
            .0
    }

    #[test]
    fn test_build_splits_path_and_query() {
        let mut parts = parts_for("http://127.0.0.1:9000/hello?list-type=2&prefix=a%20b");
        let req = SigningRequest::build(&mut parts).unwrap();

        assert_eq!(req.path, "/hello");
        assert_eq!(
            req.query,
            vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), "a b".to_string())
            ]
        );
        assert_eq!(req.authority.as_str(), "127.0.0.1:9000");
    }

    #[test]
    fn test_build_rejects_missing_authority() {
        let mut parts = parts_for("/hello");
        let err = SigningRequest::build(&mut parts).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_apply_round_trips_uri() {
        let mut parts = parts_for("http://127.0.0.1:9000/hello");
        let mut req = SigningRequest::build(&mut parts).unwrap();
        req.query.push(("marker".to_string(), "x".to_string()));
        req.apply(&mut parts).unwrap();

        assert_eq!(parts.uri.to_string(), "http://127.0.0.1:9000/hello?marker=x");
    }

    #[test]
    fn test_copied_from_leaves_parts_untouched() {
        let parts = parts_for("http://127.0.0.1:9000/hello?a=b");
        let req = SigningRequest::copied_from(&parts).unwrap();

        assert_eq!(req.path, "/hello");
        assert_eq!(parts.uri.to_string(), "http://127.0.0.1:9000/hello?a=b");
    }

    #[test]
    fn test_header_value_normalize_trims_spaces() {
        let mut v = HeaderValue::from_static("  trimmed  ");
        SigningRequest::header_value_normalize(&mut v);
        assert_eq!(v, HeaderValue::from_static("trimmed"));
    }
}
