use http::StatusCode;
use log::debug;
use serde::Deserialize;

/// Decoded S3 XML error body.
///
/// S3-compatible services report failures as an `<Error>` document; the
/// retry loop reads `code` to decide whether another attempt makes
/// sense, callers read the rest for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `NoSuchKey`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Bucket the error relates to, when reported.
    pub bucket_name: String,
    /// Object key the error relates to, when reported.
    pub key: String,
    /// Id of the failed request.
    pub request_id: String,
    /// Id of the host that served the failed request.
    pub host_id: String,
    /// Region the bucket lives in, reported on redirects.
    pub region: String,
}

impl ErrorResponse {
    /// Decode an error body, falling back to a status-derived error
    /// when the body is empty or not a decodable `<Error>` document
    /// (HEAD responses carry no body at all).
    pub fn from_response(status: StatusCode, body: &[u8], path: &str) -> Self {
        match quick_xml::de::from_reader::<_, ErrorResponse>(body) {
            Ok(er) if !er.code.is_empty() => return er,
            Ok(_) => {}
            Err(err) => debug!("error body is not decodable xml: {err}"),
        }

        let (bucket, object) = split_bucket_object(path);
        let (code, message) = match status {
            StatusCode::NOT_FOUND => {
                if object.is_empty() {
                    ("NoSuchBucket", "The specified bucket does not exist.")
                } else {
                    ("NoSuchKey", "The specified key does not exist.")
                }
            }
            StatusCode::FORBIDDEN => ("AccessDenied", "Access Denied."),
            _ => {
                let reason = status.canonical_reason().unwrap_or("Unknown");
                (reason, reason)
            }
        };

        ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            bucket_name: bucket.to_string(),
            key: object.to_string(),
            ..Default::default()
        }
    }
}

/// Split a path-style request path into bucket and object parts.
fn split_bucket_object(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    match path.split_once('/') {
        Some((bucket, object)) => (bucket, object),
        None => (path, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decodes_error_document() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchKey</Code>
  <Message>The resource you requested does not exist</Message>
  <BucketName>mybucket</BucketName>
  <Key>myfolder/myfile</Key>
  <RequestId>4442587FB7D0A2F9</RequestId>
  <HostId>uHnM+Gdf</HostId>
</Error>"#;

        let er = ErrorResponse::from_response(StatusCode::NOT_FOUND, body.as_bytes(), "/mybucket/myfolder/myfile");
        assert_eq!(
            er,
            ErrorResponse {
                code: "NoSuchKey".to_string(),
                message: "The resource you requested does not exist".to_string(),
                bucket_name: "mybucket".to_string(),
                key: "myfolder/myfile".to_string(),
                request_id: "4442587FB7D0A2F9".to_string(),
                host_id: "uHnM+Gdf".to_string(),
                region: String::new(),
            }
        );
    }

    #[test]
    fn test_synthesizes_no_such_key_for_bodyless_404() {
        let er = ErrorResponse::from_response(StatusCode::NOT_FOUND, b"", "/bucket/object");
        assert_eq!(er.code, "NoSuchKey");
        assert_eq!(er.bucket_name, "bucket");
        assert_eq!(er.key, "object");
    }

    #[test]
    fn test_synthesizes_no_such_bucket_for_bucket_level_404() {
        let er = ErrorResponse::from_response(StatusCode::NOT_FOUND, b"", "/bucket");
        assert_eq!(er.code, "NoSuchBucket");
        assert_eq!(er.key, "");
    }

    #[test]
    fn test_synthesizes_access_denied_for_403() {
        let er = ErrorResponse::from_response(StatusCode::FORBIDDEN, b"", "/bucket/object");
        assert_eq!(er.code, "AccessDenied");
    }

    #[test]
    fn test_falls_back_to_reason_phrase_for_garbage_body() {
        let er = ErrorResponse::from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            b"not xml at all",
            "/bucket",
        );
        assert_eq!(er.code, "Service Unavailable");
    }
}
