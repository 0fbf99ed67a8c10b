//! # Members Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | member-token | issue, authenticate, audience matching |
//! | catalog | message lookup with placeholder substitution |
//! | pipeline | one authenticated `members.me` round trip |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use member_token::{match_audience, TokenService, TokenSettings};
use members_gateway::adapters::{InMemoryPrincipalStore, ManualClock, StaticIdentityProvider};
use members_gateway::domain::catalog::substitute;
use members_gateway::{GatewayConfig, InboundRequest, Locale, MembersGateway, Principal, PrincipalStore};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SECRET: &str = "bench-secret-0123456789abcdef";
const NOW: u64 = 1_760_000_000;

// ============================================================================
// Session tokens
// ============================================================================

fn bench_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("member-token");
    group.measurement_time(Duration::from_secs(5));

    let tokens = TokenService::new(TokenSettings::new(SECRET));
    let token = tokens
        .issue_for_at("alice@x.com", "tid-bench", None, false, NOW)
        .expect("issue");

    group.bench_function("issue", |b| {
        b.iter(|| {
            black_box(tokens.issue_for_at(
                black_box("alice@x.com"),
                "tid-bench",
                None,
                false,
                NOW,
            ))
        })
    });

    group.bench_function("authenticate", |b| {
        b.iter(|| black_box(tokens.authenticate_at(black_box(&token), Some("members.de4bi.com"), NOW)))
    });

    for depth in [2usize, 4, 8] {
        let required = (0..depth).map(|i| format!("s{i}")).collect::<Vec<_>>().join(".");
        let pattern = std::iter::once("*".to_string())
            .chain((1..depth).map(|i| format!("s{i}")))
            .collect::<Vec<_>>()
            .join(".");

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(
            BenchmarkId::new("audience_match", depth),
            &(pattern, required),
            |b, (pattern, required)| b.iter(|| black_box(match_audience(pattern, required).is_ok())),
        );
    }

    group.finish();
}

// ============================================================================
// Code catalog
// ============================================================================

fn bench_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    let template = "Fewer than 30 days have passed since deregistration. You can sign up again after {0}.";
    let params = vec!["2025-11-03T09:20:00Z".to_string()];
    group.bench_function("substitute", |b| {
        b.iter(|| black_box(substitute(black_box(template), &params)))
    });

    group.finish();
}

// ============================================================================
// Full pipeline
// ============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let mut config = GatewayConfig::default();
    config.token.secret = SECRET.to_string();
    config.catalog.dir =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../crates/members-gateway/resources/locale");
    config.catalog.default_locale = Locale::Ko;

    let store = Arc::new(InMemoryPrincipalStore::new());
    runtime
        .block_on(store.save(Principal::new("alice@x.com", "alice", NOW)))
        .expect("seed member");

    let gateway = MembersGateway::load(
        config,
        store,
        Arc::new(StaticIdentityProvider::new()),
        Arc::new(ManualClock::new(NOW)),
    )
    .expect("gateway");
    let token = gateway
        .tokens()
        .issue_for_at("alice@x.com", "tid-bench", None, false, NOW)
        .expect("issue");

    c.bench_function("pipeline/me", |b| {
        b.iter(|| {
            let req = InboundRequest::new("members.me", json!({})).with_header("member_jwt", token.clone());
            black_box(runtime.block_on(gateway.handle(req)))
        })
    });
}

criterion_group!(benches, bench_tokens, bench_catalog, bench_pipeline);
criterion_main!(benches);
