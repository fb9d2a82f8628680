use actix_web::HttpRequest;
use bytes::Bytes;

use crate::error::GatewayError;
use crate::registry::RegistryEntry;

/// Headers to strip from the client request before proxying.
const HEADERS_TO_STRIP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-length", // recalculated by the client
    // The caller identity must never leak to the origin
    "x-wallet-address",
    // Strip gateway metadata to prevent client spoofing
    "x-gateway-cost",
    "x-gateway-balance",
    "x-gateway-api",
];

/// Allowlist of response headers to forward from the origin.
/// Prevents leaking internal origin headers (e.g. Server, X-Powered-By).
pub const ALLOWED_RESPONSE_HEADERS: &[&str] = &[
    "content-type",
    "content-encoding",
    "cache-control",
    "etag",
    "last-modified",
    "date",
    "vary",
    "x-request-id",
    "x-ratelimit-limit",
    "x-ratelimit-remaining",
    "x-ratelimit-reset",
];

/// Maximum origin response body size (10 MB).
const MAX_RESPONSE_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Classification of a forward attempt.
///
/// Any response obtained from the origin is billable, including 4xx and 5xx:
/// the call was rendered even if its business result was an error. Only a
/// network-level failure (DNS, connect, timeout, truncated body) is free.
#[derive(Debug)]
pub enum ForwardOutcome {
    UpstreamResponse {
        status: u16,
        headers: Vec<(String, String)>,
        body: Bytes,
    },
    UpstreamUnreachable {
        reason: String,
    },
}

/// Everything the forwarder needs, extracted from the inbound request so the
/// forward+settle unit can run on a detached task after the caller is gone.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: String,
    pub target_url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ForwardRequest {
    pub fn from_request(
        req: &HttpRequest,
        target_url: String,
        body: Bytes,
    ) -> Result<Self, GatewayError> {
        let headers = req
            .headers()
            .iter()
            .filter(|(name, _)| !HEADERS_TO_STRIP.contains(&name.as_str().to_lowercase().as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(Self {
            method: req.method().as_str().to_string(),
            target_url,
            headers,
            body,
        })
    }
}

/// Sanitize a query string to prevent CRLF injection and fragment smuggling.
fn sanitize_query(query: &str) -> Result<String, GatewayError> {
    if query.contains('\r') || query.contains('\n') {
        return Err(GatewayError::InvalidUrl(
            "query string must not contain newlines".to_string(),
        ));
    }

    // Fragments should not be sent to the origin
    let sanitized = match query.find('#') {
        Some(idx) => &query[..idx],
        None => query,
    };

    if sanitized.contains('\0') {
        return Err(GatewayError::InvalidUrl(
            "query string must not contain null bytes".to_string(),
        ));
    }

    let decoded = urlencoding::decode(sanitized).unwrap_or(std::borrow::Cow::Borrowed(sanitized));
    if decoded.contains("..") {
        return Err(GatewayError::InvalidUrl(
            "query string must not contain path traversal sequences".to_string(),
        ));
    }

    Ok(sanitized.to_string())
}

/// Sanitize the remainder path (leading `/` included). Validates against the
/// decoded form but returns the original still-encoded path so decoded
/// URL-special characters cannot inject a query or fragment.
fn sanitize_remainder(remainder: &str) -> Result<String, GatewayError> {
    let decoded = urlencoding::decode(remainder)
        .map_err(|_| GatewayError::InvalidUrl("invalid URL encoding in path".to_string()))?;

    if decoded.contains("..") {
        return Err(GatewayError::InvalidUrl(
            "path traversal not allowed".to_string(),
        ));
    }
    // `//` after the slug would become a URL authority position
    if decoded.starts_with("//") {
        return Err(GatewayError::InvalidUrl(
            "path must not start with //".to_string(),
        ));
    }
    if decoded.contains('@') {
        return Err(GatewayError::InvalidUrl(
            "path must not contain @".to_string(),
        ));
    }
    if decoded.contains('\r') || decoded.contains('\n') || decoded.contains('\0') {
        return Err(GatewayError::InvalidUrl(
            "path contains forbidden control characters".to_string(),
        ));
    }

    Ok(remainder.to_string())
}

/// Build the outbound target URL: origin base + remainder + query string.
pub fn build_target_url(
    entry: &RegistryEntry,
    remainder: &str,
    query: Option<&str>,
) -> Result<String, GatewayError> {
    let remainder = sanitize_remainder(remainder)?;
    let mut url = format!(
        "{}{}",
        entry.origin_base_url.trim_end_matches('/'),
        remainder
    );
    if let Some(query) = query {
        let query = sanitize_query(query)?;
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
    }
    Ok(url)
}

fn unreachable_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "origin request timed out".to_string()
    } else if err.is_connect() {
        "connection to origin failed".to_string()
    } else {
        format!("origin request failed: {}", err)
    }
}

/// Issue the outbound request and classify the result.
///
/// The shared client carries the forward timeout; a timeout surfaces as
/// `UpstreamUnreachable` and is therefore not billed.
pub async fn forward(
    client: &reqwest::Client,
    fwd: &ForwardRequest,
) -> Result<ForwardOutcome, GatewayError> {
    let method = reqwest::Method::from_bytes(fwd.method.as_bytes())
        .map_err(|_| GatewayError::Internal(format!("unsupported HTTP method: {}", fwd.method)))?;

    let mut builder = client.request(method, &fwd.target_url);
    for (name, value) in &fwd.headers {
        builder = builder.header(name, value);
    }
    if !fwd.body.is_empty() {
        builder = builder.body(fwd.body.clone());
    }

    let mut response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, url = %fwd.target_url, "forward failed");
            return Ok(ForwardOutcome::UpstreamUnreachable {
                reason: unreachable_reason(&e),
            });
        }
    };

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter(|(name, _)| ALLOWED_RESPONSE_HEADERS.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    // Fast path: reject oversized responses before reading
    if let Some(cl) = response.content_length() {
        if cl > MAX_RESPONSE_BODY_SIZE as u64 {
            return Ok(ForwardOutcome::UpstreamUnreachable {
                reason: format!("origin response too large: {} bytes", cl),
            });
        }
    }

    // Stream the body with progressive size enforcement so chunked responses
    // without Content-Length cannot exhaust memory.
    let mut body_buf = Vec::with_capacity(
        response
            .content_length()
            .map(|cl| cl as usize)
            .unwrap_or(8192)
            .min(MAX_RESPONSE_BODY_SIZE),
    );
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if body_buf.len() + chunk.len() > MAX_RESPONSE_BODY_SIZE {
                    return Ok(ForwardOutcome::UpstreamUnreachable {
                        reason: format!(
                            "origin response too large (max {} bytes)",
                            MAX_RESPONSE_BODY_SIZE
                        ),
                    });
                }
                body_buf.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                // A truncated body means no complete response was obtained
                tracing::warn!(error = %e, "failed to read origin response body");
                return Ok(ForwardOutcome::UpstreamUnreachable {
                    reason: "failed to read origin response".to_string(),
                });
            }
        }
    }

    Ok(ForwardOutcome::UpstreamResponse {
        status,
        headers,
        body: Bytes::from(body_buf),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(origin: &str) -> RegistryEntry {
        RegistryEntry {
            slug: "weather".to_string(),
            origin_base_url: origin.to_string(),
            price_per_call: 50.0,
            owner: "P1".to_string(),
            listing_id: "api_weather".to_string(),
        }
    }

    #[test]
    fn identity_header_is_stripped() {
        assert!(HEADERS_TO_STRIP.contains(&"x-wallet-address"));
        assert!(HEADERS_TO_STRIP.contains(&"host"));
        assert!(!HEADERS_TO_STRIP.contains(&"content-type"));
    }

    #[test]
    fn response_allowlist_excludes_origin_internals() {
        assert!(ALLOWED_RESPONSE_HEADERS.contains(&"content-type"));
        assert!(ALLOWED_RESPONSE_HEADERS.contains(&"cache-control"));
        assert!(!ALLOWED_RESPONSE_HEADERS.contains(&"server"));
        assert!(!ALLOWED_RESPONSE_HEADERS.contains(&"x-powered-by"));
    }

    #[test]
    fn target_url_joins_origin_remainder_and_query() {
        let url =
            build_target_url(&entry("https://example.test"), "/today", Some("city=NYC")).unwrap();
        assert_eq!(url, "https://example.test/today?city=NYC");
    }

    #[test]
    fn target_url_trims_trailing_origin_slash() {
        let url = build_target_url(&entry("https://example.test/"), "/today", None).unwrap();
        assert_eq!(url, "https://example.test/today");
    }

    #[test]
    fn empty_query_is_dropped() {
        let url = build_target_url(&entry("https://example.test"), "/today", Some("")).unwrap();
        assert_eq!(url, "https://example.test/today");
    }

    #[test]
    fn fragment_is_stripped_from_query() {
        let url = build_target_url(
            &entry("https://example.test"),
            "/today",
            Some("city=NYC#frag"),
        )
        .unwrap();
        assert_eq!(url, "https://example.test/today?city=NYC");
    }

    #[test]
    fn traversal_and_injection_are_rejected() {
        let e = entry("https://example.test");
        assert!(build_target_url(&e, "/../secrets", None).is_err());
        assert!(build_target_url(&e, "/%2e%2e/secrets", None).is_err());
        assert!(build_target_url(&e, "//evil.test/x", None).is_err());
        assert!(build_target_url(&e, "/a@b", None).is_err());
        assert!(build_target_url(&e, "/ok", Some("a=1\r\nHost: evil")).is_err());
        assert!(build_target_url(&e, "/ok", Some("a=..%2F..")).is_err());
    }
}
