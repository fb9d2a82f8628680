use actix_web::{web, HttpResponse};

use crate::error::GatewayError;
use crate::metrics::ENDPOINTS_REGISTERED;
use crate::registry::RegistryEntry;
use crate::state::AppState;
use crate::validation::{validate_origin_url, validate_slug};

/// POST /gateway/register request body. Triggered externally when a listing
/// becomes active.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub slug: String,
    pub original_base_url: String,
    #[serde(deserialize_with = "crate::listings::de_price")]
    pub price_per_call: f64,
    pub owner: String,
    pub api_id: String,
}

/// POST /gateway/register — insert or replace the routing entry for a slug.
pub async fn register(
    body: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let body = body.into_inner();

    validate_slug(&body.slug)?;
    validate_origin_url(
        &body.original_base_url,
        state.config.allow_private_origins,
    )?;
    if !body.price_per_call.is_finite() || body.price_per_call < 0.0 {
        return Err(GatewayError::InvalidPrice(
            "price per call must be a non-negative number".to_string(),
        ));
    }
    if body.owner.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "owner wallet is required".to_string(),
        ));
    }
    if body.api_id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "apiId is required".to_string(),
        ));
    }

    state.registry.register(RegistryEntry {
        slug: body.slug.clone(),
        origin_base_url: body.original_base_url.clone(),
        price_per_call: body.price_per_call,
        owner: body.owner,
        listing_id: body.api_id,
    })?;
    ENDPOINTS_REGISTERED.inc();
    tracing::info!(
        slug = %body.slug,
        origin = %body.original_base_url,
        price = body.price_per_call,
        "registered API with gateway"
    );

    let gateway_url = format!(
        "{}/{}",
        state.config.public_url.trim_end_matches('/'),
        body.slug
    );
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "gatewayUrl": gateway_url,
        "message": "API registered with gateway"
    })))
}

/// GET /gateway/apis — full registry snapshot.
pub async fn list_apis(state: web::Data<AppState>) -> Result<HttpResponse, GatewayError> {
    let apis = state.registry.list()?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": apis.len(),
        "apis": apis,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/gateway/register", web::post().to(register))
        .route("/gateway/apis", web::get().to(list_apis));
}
