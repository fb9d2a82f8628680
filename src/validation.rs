use std::net::{Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::error::GatewayError;

/// Validate slug format for HTTP registration.
///
/// The registry itself accepts any key; these rules only gate what providers
/// can claim through the public register endpoint.
pub fn validate_slug(slug: &str) -> Result<(), GatewayError> {
    if slug.len() < 3 {
        return Err(GatewayError::InvalidSlug(
            "slug must be at least 3 characters".to_string(),
        ));
    }
    if slug.len() > 64 {
        return Err(GatewayError::InvalidSlug(
            "slug must be at most 64 characters".to_string(),
        ));
    }
    if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(GatewayError::InvalidSlug(
            "slug must contain only alphanumeric characters and hyphens".to_string(),
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(GatewayError::InvalidSlug(
            "slug cannot start or end with a hyphen".to_string(),
        ));
    }
    Ok(())
}

/// Check if an IPv4 address is private, loopback, or otherwise non-routable.
pub fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()          // 127.0.0.0/8
        || ip.is_private()    // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
        || ip.is_link_local() // 169.254.0.0/16
        || ip.is_broadcast()  // 255.255.255.255
        || ip.is_unspecified() // 0.0.0.0
        || ip.octets()[0] == 100 && (ip.octets()[1] & 0xC0) == 64 // 100.64.0.0/10 (CGNAT)
}

/// Check if an IPv6 address is private, loopback, or otherwise non-routable.
pub fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    ip.is_loopback()       // ::1
        || ip.is_unspecified() // ::
        || {
            let segments = ip.segments();
            // fc00::/7 (unique local)
            (segments[0] & 0xFE00) == 0xFC00
            // fe80::/10 (link-local)
            || (segments[0] & 0xFFC0) == 0xFE80
            // IPv4-mapped IPv6: check the mapped IPv4 address
            || match ip.to_ipv4_mapped() {
                Some(v4) => is_private_ipv4(&v4),
                None => false,
            }
        }
}

/// Validate an origin base URL at registration time.
///
/// Format only — reachability is deliberately not checked. Unless
/// `allow_private` is set (dev/test mode), the origin must be HTTPS and must
/// not point at a loopback or private address.
pub fn validate_origin_url(url: &str, allow_private: bool) -> Result<(), GatewayError> {
    let parsed =
        Url::parse(url).map_err(|_| GatewayError::InvalidUrl("invalid URL format".to_string()))?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(GatewayError::InvalidUrl(
            "origin must be an http(s) URL".to_string(),
        ));
    }

    if allow_private {
        if parsed.host().is_none() {
            return Err(GatewayError::InvalidUrl(
                "origin URL must have a host".to_string(),
            ));
        }
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(GatewayError::InvalidUrl(
            "origin must use HTTPS".to_string(),
        ));
    }

    // Prevent SSRF: the gateway forwards arbitrary caller traffic to this
    // host, so it must not be on the local network.
    match parsed.host() {
        Some(url::Host::Ipv4(ip)) => {
            if is_private_ipv4(&ip) {
                return Err(GatewayError::InvalidUrl(
                    "origin cannot be a private or loopback IP address".to_string(),
                ));
            }
        }
        Some(url::Host::Ipv6(ip)) => {
            if is_private_ipv6(&ip) {
                return Err(GatewayError::InvalidUrl(
                    "origin cannot be a private or loopback IP address".to_string(),
                ));
            }
        }
        Some(url::Host::Domain(domain)) => {
            let domain_lower = domain.to_lowercase();
            if domain_lower == "localhost"
                || domain_lower.ends_with(".localhost")
                || domain_lower.ends_with(".local")
                || domain_lower.ends_with(".internal")
            {
                return Err(GatewayError::InvalidUrl(
                    "origin cannot be localhost or a local domain".to_string(),
                ));
            }
        }
        None => {
            return Err(GatewayError::InvalidUrl(
                "origin URL must have a host".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug_valid() {
        assert!(validate_slug("my-api").is_ok());
        assert!(validate_slug("api123").is_ok());
        assert!(validate_slug("weather").is_ok());
        assert!(validate_slug("abc").is_ok());
    }

    #[test]
    fn test_validate_slug_invalid() {
        assert!(validate_slug("ab").is_err()); // too short
        assert!(validate_slug("-api").is_err()); // starts with hyphen
        assert!(validate_slug("api-").is_err()); // ends with hyphen
        assert!(validate_slug("my_api").is_err()); // underscore not allowed
        assert!(validate_slug("my api").is_err()); // space not allowed
        assert!(validate_slug(&"x".repeat(65)).is_err()); // too long
    }

    #[test]
    fn test_private_ipv4() {
        assert!(is_private_ipv4(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_ipv4(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_ipv4(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_ipv4(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_ipv4(&"0.0.0.0".parse().unwrap()));
        assert!(is_private_ipv4(&"100.64.0.1".parse().unwrap()));
        assert!(!is_private_ipv4(&"8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_private_ipv6() {
        assert!(is_private_ipv6(&"::1".parse().unwrap()));
        assert!(is_private_ipv6(&"::".parse().unwrap()));
        assert!(is_private_ipv6(&"fc00::1".parse().unwrap()));
        assert!(is_private_ipv6(&"fe80::1".parse().unwrap()));
        assert!(!is_private_ipv6(&"2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_validate_origin_url_strict() {
        assert!(validate_origin_url("https://api.example.com", false).is_ok());
        assert!(validate_origin_url("http://api.example.com", false).is_err());
        assert!(validate_origin_url("https://localhost", false).is_err());
        assert!(validate_origin_url("https://127.0.0.1", false).is_err());
        assert!(validate_origin_url("https://192.168.1.1", false).is_err());
        assert!(validate_origin_url("not-a-url", false).is_err());
    }

    #[test]
    fn test_validate_origin_url_private_allowed() {
        assert!(validate_origin_url("http://127.0.0.1:8080", true).is_ok());
        assert!(validate_origin_url("http://localhost:3000", true).is_ok());
        assert!(validate_origin_url("ftp://example.com", true).is_err());
        assert!(validate_origin_url("not-a-url", true).is_err());
    }
}
