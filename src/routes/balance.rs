use actix_web::{web, HttpResponse};

use crate::error::GatewayError;
use crate::state::AppState;

/// GET /gateway/balance/{wallet} — 0 for unknown wallets.
pub async fn get_balance(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let wallet = path.into_inner();
    let balance = state.ledger.balance(&wallet)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "wallet": wallet,
        "balance": balance,
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct TopUpRequest {
    pub wallet: String,
    #[serde(deserialize_with = "crate::listings::de_price")]
    pub amount: f64,
}

/// POST /gateway/topup — admin/testing credit path; the only way money
/// enters the system.
pub async fn top_up(
    body: web::Json<TopUpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let body = body.into_inner();
    if body.wallet.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "wallet is required".to_string(),
        ));
    }

    let new_balance = state.ledger.top_up(&body.wallet, body.amount)?;
    tracing::info!(wallet = %body.wallet, amount = body.amount, "topped up balance");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "wallet": body.wallet,
        "newBalance": new_balance,
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/gateway/balance/{wallet}", web::get().to(get_balance))
        .route("/gateway/topup", web::post().to(top_up));
}
