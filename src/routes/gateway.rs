use actix_web::{web, HttpRequest, HttpResponse};

use crate::admission::{self, WALLET_HEADER};
use crate::error::GatewayError;
use crate::metrics::{ADMISSION_REJECTED, PROXY_LATENCY, PROXY_REQUESTS_TOTAL};
use crate::proxy::{self, ForwardRequest};
use crate::settlement::{self, SettledReply};
use crate::state::AppState;

fn caller_identity(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn render(reply: SettledReply) -> HttpResponse {
    let mut builder = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(reply.status)
            .unwrap_or(actix_web::http::StatusCode::OK),
    );
    for (name, value) in &reply.headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }
    builder.body(reply.body)
}

/// ANY /{slug}/{...} — the metered proxy. Wired as the default service so
/// every path the explicit /gateway routes don't claim lands here.
pub async fn gateway_proxy(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let caller = caller_identity(&req);
    let admission = match admission::admit(
        &state.registry,
        &state.ledger,
        req.path(),
        caller.as_deref(),
    ) {
        Ok(admission) => admission,
        Err(e) => {
            if let Some(reason) = e.admission_reason() {
                ADMISSION_REJECTED.with_label_values(&[reason]).inc();
            }
            return Err(e);
        }
    };

    PROXY_REQUESTS_TOTAL
        .with_label_values(&[admission.entry.slug.as_str()])
        .inc();
    tracing::info!(
        slug = %admission.entry.slug,
        method = %req.method(),
        remainder = %admission.remainder,
        caller = %admission.caller,
        "admitted proxy request"
    );

    let target_url =
        proxy::build_target_url(&admission.entry, &admission.remainder, req.uri().query())?;
    let fwd = ForwardRequest::from_request(&req, target_url, body)?;

    // Detached task: if the caller disconnects mid-forward, the origin call
    // and its settlement still run to completion, so ledger and usage state
    // reflect what actually happened.
    let timer = PROXY_LATENCY.start_timer();
    let task = tokio::spawn(settlement::forward_and_settle(
        state.get_ref().clone(),
        admission,
        fwd,
    ));
    let reply = task
        .await
        .map_err(|e| GatewayError::Internal(format!("settlement task failed: {}", e)))??;
    timer.observe_duration();

    Ok(render(reply))
}
