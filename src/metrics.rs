use prometheus::{
    CounterVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static PROXY_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gateway_proxy_requests_total",
            "Admitted proxy requests per slug",
        ),
        &["slug"],
    )
    .unwrap()
});

pub static ADMISSION_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gateway_admission_rejected_total",
            "Requests denied at admission control, by reason",
        ),
        &["reason"],
    )
    .unwrap()
});

pub static SETTLEMENTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_settlements_total",
        "Successful debit/credit settlements",
    )
    .unwrap()
});

pub static SETTLEMENT_RACES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_settlement_races_total",
        "Settlements that failed after the origin call completed",
    )
    .unwrap()
});

pub static UPSTREAM_UNREACHABLE: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_upstream_unreachable_total",
        "Forward attempts that failed at the network level",
    )
    .unwrap()
});

pub static ENDPOINTS_REGISTERED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gateway_endpoints_registered_total",
        "APIs registered with the gateway",
    )
    .unwrap()
});

pub static PROXY_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "gateway_proxy_latency_seconds",
            "Forward-and-settle latency",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

pub static SLUG_REVENUE: LazyLock<CounterVec> = LazyLock::new(|| {
    CounterVec::new(
        Opts::new("gateway_slug_revenue_total", "Settled revenue per slug"),
        &["slug"],
    )
    .unwrap()
});

/// Register all metrics with the registry
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(PROXY_REQUESTS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(ADMISSION_REJECTED.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SETTLEMENTS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SETTLEMENT_RACES.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(UPSTREAM_UNREACHABLE.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(ENDPOINTS_REGISTERED.clone()))
        .unwrap();
    REGISTRY.register(Box::new(PROXY_LATENCY.clone())).unwrap();
    REGISTRY.register(Box::new(SLUG_REVENUE.clone())).unwrap();
}
