use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug, Clone)]
pub enum GatewayError {
    /// No registered API matches the request path
    RouteNotFound(String),
    /// Missing or empty X-Wallet-Address header
    MissingIdentity,
    /// Balance below the per-call price at admission time
    InsufficientFunds { required: f64, available: f64 },
    /// Balance drained between admission and settlement; the origin call
    /// already happened and is unrecovered
    SettlementRace { required: f64, available: f64 },
    /// Invalid slug format
    InvalidSlug(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Invalid price
    InvalidPrice(String),
    /// Invalid top-up amount
    InvalidAmount(String),
    /// Malformed registration or top-up request
    InvalidRequest(String),
    /// Network-level failure reaching the origin (DNS, connect, timeout)
    UpstreamUnreachable(String),
    /// Internal error
    Internal(String),
}

impl GatewayError {
    /// Label used for the admission-rejection metric. None for errors that
    /// are not admission outcomes.
    pub fn admission_reason(&self) -> Option<&'static str> {
        match self {
            GatewayError::RouteNotFound(_) => Some("no_route"),
            GatewayError::MissingIdentity => Some("no_identity"),
            GatewayError::InsufficientFunds { .. } => Some("insufficient_funds"),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::RouteNotFound(path) => write!(f, "no route for path: {}", path),
            GatewayError::MissingIdentity => write!(f, "missing caller identity"),
            GatewayError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "insufficient funds: required {}, available {}",
                required, available
            ),
            GatewayError::SettlementRace {
                required,
                available,
            } => write!(
                f,
                "settlement failed after forward: required {}, available {}",
                required, available
            ),
            GatewayError::InvalidSlug(msg) => write!(f, "invalid slug: {}", msg),
            GatewayError::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
            GatewayError::InvalidPrice(msg) => write!(f, "invalid price: {}", msg),
            GatewayError::InvalidAmount(msg) => write!(f, "invalid amount: {}", msg),
            GatewayError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            GatewayError::UpstreamUnreachable(reason) => {
                write!(f, "origin unreachable: {}", reason)
            }
            GatewayError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::RouteNotFound(path) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "route_not_found",
                "message": format!("no API registered for '{}'", path),
                "hint": "GET /gateway/apis lists available APIs"
            })),
            GatewayError::MissingIdentity => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "authentication_required",
                "message": "caller identity is required",
                "hint": "include the X-Wallet-Address header"
            })),
            GatewayError::InsufficientFunds {
                required,
                available,
            } => HttpResponse::PaymentRequired().json(serde_json::json!({
                "error": "insufficient_funds",
                "required": required,
                "available": available,
                "message": format!("call costs {} but balance is {}", required, available)
            })),
            GatewayError::SettlementRace {
                required,
                available,
            } => {
                // The origin call was already made; the gateway ate its cost.
                tracing::warn!(
                    required = *required,
                    available = *available,
                    "settlement failed after origin call completed"
                );
                HttpResponse::PaymentRequired().json(serde_json::json!({
                    "error": "settlement_failed",
                    "required": required,
                    "available": available,
                    "message": "balance was drained before the call could be settled"
                }))
            }
            GatewayError::InvalidSlug(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_slug",
                "message": msg
            })),
            GatewayError::InvalidUrl(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_url",
                "message": msg
            })),
            GatewayError::InvalidPrice(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_price",
                "message": msg
            })),
            GatewayError::InvalidAmount(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_amount",
                "message": msg
            })),
            GatewayError::InvalidRequest(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_request",
                    "message": msg
                }))
            }
            GatewayError::UpstreamUnreachable(reason) => {
                tracing::error!(reason = %reason, "origin unreachable");
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "origin_unreachable",
                    "message": "failed to reach the origin API",
                    "details": reason
                }))
            }
            GatewayError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "an internal error occurred"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn status_codes_match_taxonomy() {
        let cases = [
            (
                GatewayError::RouteNotFound("/nope/x".into()),
                StatusCode::NOT_FOUND,
            ),
            (GatewayError::MissingIdentity, StatusCode::UNAUTHORIZED),
            (
                GatewayError::InsufficientFunds {
                    required: 50.0,
                    available: 10.0,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                GatewayError::SettlementRace {
                    required: 50.0,
                    available: 0.0,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                GatewayError::UpstreamUnreachable("connect refused".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                GatewayError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                GatewayError::InvalidSlug("too short".into()),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.error_response().status(), expected, "{}", err);
        }
    }

    #[test]
    fn insufficient_funds_body_carries_amounts() {
        let err = GatewayError::InsufficientFunds {
            required: 50.0,
            available: 10.0,
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn admission_reasons() {
        assert_eq!(
            GatewayError::RouteNotFound("/x".into()).admission_reason(),
            Some("no_route")
        );
        assert_eq!(
            GatewayError::MissingIdentity.admission_reason(),
            Some("no_identity")
        );
        assert_eq!(
            GatewayError::SettlementRace {
                required: 1.0,
                available: 0.0
            }
            .admission_reason(),
            None
        );
    }
}
