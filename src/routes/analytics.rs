use actix_web::{web, HttpResponse};

use crate::error::GatewayError;
use crate::state::AppState;

/// GET /gateway/analytics — per-slug usage rollups.
pub async fn list_analytics(state: web::Data<AppState>) -> Result<HttpResponse, GatewayError> {
    let summaries = state.usage.summarize();

    let total_calls: u64 = summaries.iter().map(|s| s.calls).sum();
    let total_revenue: f64 = summaries.iter().map(|s| s.revenue).sum();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "endpoints": summaries,
        "total_calls": total_calls,
        "total_revenue": total_revenue,
    })))
}

/// GET /gateway/analytics/{slug} — rollup for a single slug.
pub async fn get_analytics(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let slug = path.into_inner();
    let summary = state
        .usage
        .summarize_slug(&slug)
        .ok_or_else(|| GatewayError::RouteNotFound(format!("/{}", slug)))?;

    Ok(HttpResponse::Ok().json(summary))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/gateway/analytics", web::get().to(list_analytics))
        .route("/gateway/analytics/{slug}", web::get().to(get_analytics));
}
