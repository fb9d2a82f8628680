use bytes::Bytes;

use crate::admission::Admission;
use crate::error::GatewayError;
use crate::metrics::{SETTLEMENTS_TOTAL, SETTLEMENT_RACES, SLUG_REVENUE, UPSTREAM_UNREACHABLE};
use crate::proxy::{self, ForwardOutcome, ForwardRequest};
use crate::state::AppState;
use crate::usage::UsageEvent;

/// Transport-agnostic settled response, rendered into an actix response by
/// the gateway route. Kept plain so the forward+settle unit can cross a
/// spawned-task boundary.
#[derive(Debug)]
pub struct SettledReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Forward the admitted request and settle the outcome.
///
/// Billing policy: any response obtained from the origin settles the charge,
/// including origin 4xx/5xx. A network-level failure is free — 503, no ledger
/// mutation. A post-forward `InsufficientFunds` means a concurrent request
/// drained the balance after admission; the origin call already happened and
/// its cost is unrecovered, so it is surfaced as a distinct 402 and metric.
pub async fn forward_and_settle(
    state: AppState,
    admission: Admission,
    fwd: ForwardRequest,
) -> Result<SettledReply, GatewayError> {
    let outcome = proxy::forward(&state.http_client, &fwd).await?;
    let entry = &admission.entry;

    match outcome {
        ForwardOutcome::UpstreamUnreachable { reason } => {
            UPSTREAM_UNREACHABLE.inc();
            state
                .usage
                .record(UsageEvent::unbilled(entry, &admission.caller, reason.clone()));
            Err(GatewayError::UpstreamUnreachable(reason))
        }
        ForwardOutcome::UpstreamResponse {
            status,
            mut headers,
            body,
        } => {
            let transfer = match state.ledger.try_debit_and_credit(
                &admission.caller,
                &entry.owner,
                entry.price_per_call,
            ) {
                Ok(transfer) => transfer,
                Err(GatewayError::InsufficientFunds {
                    required,
                    available,
                }) => {
                    SETTLEMENT_RACES.inc();
                    state.usage.record(UsageEvent::unbilled(
                        entry,
                        &admission.caller,
                        "balance drained before settlement".to_string(),
                    ));
                    return Err(GatewayError::SettlementRace {
                        required,
                        available,
                    });
                }
                Err(e) => return Err(e),
            };

            SETTLEMENTS_TOTAL.inc();
            SLUG_REVENUE
                .with_label_values(&[entry.slug.as_str()])
                .inc_by(entry.price_per_call);
            state
                .usage
                .record(UsageEvent::billed(entry, &admission.caller, status));

            tracing::info!(
                slug = %entry.slug,
                caller = %admission.caller,
                cost = entry.price_per_call,
                balance = transfer.payer_balance,
                origin_status = status,
                "settled proxied call"
            );

            headers.push((
                "X-Gateway-Cost".to_string(),
                format_amount(entry.price_per_call),
            ));
            headers.push((
                "X-Gateway-Balance".to_string(),
                format_amount(transfer.payer_balance),
            ));
            headers.push(("X-Gateway-Api".to_string(), entry.slug.clone()));

            Ok(SettledReply {
                status,
                headers,
                body,
            })
        }
    }
}

/// Render a balance/cost amount without a trailing `.0` for whole numbers.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryEntry;

    fn test_state() -> AppState {
        AppState::new(crate::config::GatewayConfig {
            port: 0,
            public_url: "http://localhost:0".to_string(),
            forward_timeout: std::time::Duration::from_secs(1),
            listings_url: None,
            allowed_origins: vec![],
            allow_private_origins: true,
            metrics_token: None,
            demo_wallet: None,
            demo_balance: 0.0,
        })
    }

    fn admission(price: f64) -> Admission {
        Admission {
            entry: RegistryEntry {
                slug: "weather".to_string(),
                origin_base_url: "http://127.0.0.1:1".to_string(),
                price_per_call: price,
                owner: "P1".to_string(),
                listing_id: "api_weather".to_string(),
            },
            remainder: "/today".to_string(),
            caller: "C1".to_string(),
        }
    }

    #[test]
    fn format_amount_drops_trailing_zero() {
        assert_eq!(format_amount(50.0), "50");
        assert_eq!(format_amount(950.0), "950");
        assert_eq!(format_amount(0.05), "0.05");
        assert_eq!(format_amount(0.0), "0");
    }

    #[actix_rt::test]
    async fn unreachable_origin_is_free() {
        let state = test_state();
        state.ledger.top_up("C1", 1000.0).unwrap();

        let adm = admission(50.0);
        // Port 1 is never listening: the connect fails, nothing is billed
        let fwd = ForwardRequest {
            method: "GET".to_string(),
            target_url: "http://127.0.0.1:1/today".to_string(),
            headers: vec![],
            body: Bytes::new(),
        };

        let err = forward_and_settle(state.clone(), adm, fwd)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamUnreachable(_)));
        assert_eq!(state.ledger.balance("C1").unwrap(), 1000.0);
        assert_eq!(state.ledger.balance("P1").unwrap(), 0.0);

        let events = state.usage.snapshot();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert_eq!(events[0].cost, 0.0);
    }
}
