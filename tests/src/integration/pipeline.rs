//! # Pipeline Guarantees
//!
//! Properties every route gets from the layer stack regardless of its handler:
//! session checks before the handler runs, storage failures mapped without
//! leaking detail, per-request trace ids and the HTTP surface.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{config, gateway_over, gateway_with, Harness, PASSWORD, START};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use member_token::{TokenService, TokenSettings};
    use members_gateway::adapters::{handle_member_request, InMemoryPrincipalStore, ManualClock};
    use members_gateway::{codes, Insertion, Principal, PrincipalStore, Stage};
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct OfflineStore;

    #[async_trait]
    impl PrincipalStore for OfflineStore {
        async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<Principal>> {
            anyhow::bail!("member store offline at db-7:5432")
        }

        async fn find_by_handle(&self, _handle: &str) -> anyhow::Result<Option<Principal>> {
            anyhow::bail!("member store offline at db-7:5432")
        }

        async fn insert(&self, _principal: Principal, _replacing: Option<&Principal>) -> anyhow::Result<Insertion> {
            anyhow::bail!("member store offline at db-7:5432")
        }

        async fn save(&self, _principal: Principal) -> anyhow::Result<()> {
            anyhow::bail!("member store offline at db-7:5432")
        }
    }

    struct PanickingStore;

    #[async_trait]
    impl PrincipalStore for PanickingStore {
        async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<Principal>> {
            panic!("index corrupted")
        }

        async fn find_by_handle(&self, _handle: &str) -> anyhow::Result<Option<Principal>> {
            panic!("index corrupted")
        }

        async fn insert(&self, _principal: Principal, _replacing: Option<&Principal>) -> anyhow::Result<Insertion> {
            panic!("index corrupted")
        }

        async fn save(&self, _principal: Principal) -> anyhow::Result<()> {
            panic!("index corrupted")
        }
    }

    /// In-memory store whose id lookups stall.
    struct SlowStore {
        inner: InMemoryPrincipalStore,
        delay: Duration,
    }

    #[async_trait]
    impl PrincipalStore for SlowStore {
        async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Principal>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find_by_id(id).await
        }

        async fn find_by_handle(&self, handle: &str) -> anyhow::Result<Option<Principal>> {
            self.inner.find_by_handle(handle).await
        }

        async fn insert(&self, principal: Principal, replacing: Option<&Principal>) -> anyhow::Result<Insertion> {
            self.inner.insert(principal, replacing).await
        }

        async fn save(&self, principal: Principal) -> anyhow::Result<()> {
            self.inner.save(principal).await
        }
    }

    fn token_for(h: &Harness, subject: &str) -> String {
        h.gateway
            .tokens()
            .issue_for_at(subject, "tid-external", None, false, START)
            .unwrap()
    }

    // =============================================================================
    // ROUTING & SESSION CHECKS
    // =============================================================================

    #[tokio::test]
    async fn test_unknown_route() {
        let h = Harness::new();
        let out = h.send("members.delete_everything", json!({})).await;

        assert_eq!(out.status, StatusCode::BAD_REQUEST);
        assert_eq!(out.envelope.code, codes::A_FAIL);
        assert!(!out.envelope.result);
        assert!(!out.stages.contains(&Stage::HandlerExecuted));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let h = Harness::new();
        let out = h.send("members.me", json!({})).await;

        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_VALIDATION_FAIL);
        assert!(!out.stages.contains(&Stage::AuthChecked));
    }

    #[tokio::test]
    async fn test_bearer_header_accepted() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        let token = h.login("alice@x.com").await;

        let req = members_gateway::InboundRequest::new("members.me", json!({}))
            .with_header("Authorization", format!("Bearer {token}"));
        let out = h.gateway.handle(req).await;
        assert_eq!(out.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        let token = h.login("alice@x.com").await;

        h.clock.advance(3 * 60 * 60);
        let out = h.send_as("members.me", json!({}), &token).await;
        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_VALIDATION_FAIL);
    }

    #[tokio::test]
    async fn test_spliced_token() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        h.signup("mallory@x.com", "mallory").await;
        let alice = h.login("alice@x.com").await;
        let mallory = h.login("mallory@x.com").await;

        // Alice's claims under Mallory's signature.
        let (alice_input, _) = alice.rsplit_once('.').unwrap();
        let (_, mallory_sig) = mallory.rsplit_once('.').unwrap();
        let forged = format!("{alice_input}.{mallory_sig}");

        let out = h.send_as("members.me", json!({}), &forged).await;
        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_VALIDATION_FAIL);
    }

    #[tokio::test]
    async fn test_token_from_other_secret() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;

        let outsider = TokenService::new(TokenSettings::new("another-deployment-secret-000000"));
        let token = outsider
            .issue_for_at("alice@x.com", "tid", None, false, START)
            .unwrap();

        let out = h.send_as("members.me", json!({}), &token).await;
        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_VALIDATION_FAIL);
    }

    #[tokio::test]
    async fn test_audience_mismatch() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;

        let login = h
            .send(
                "members.login",
                json!({ "id": "alice@x.com", "password": PASSWORD, "audience": "shop.other.com" }),
            )
            .await;
        let token = login.envelope.data["member_jwt"].as_str().unwrap();

        let out = h.send_as("members.me", json!({}), token).await;
        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_INVALID_AUD);
    }

    #[tokio::test]
    async fn test_token_for_vanished_member() {
        let h = Harness::new();
        let token = token_for(&h, "ghost@x.com");

        let out = h.send_as("members.me", json!({}), &token).await;
        assert_eq!(out.status, StatusCode::UNAUTHORIZED);
        assert_eq!(out.envelope.code, codes::MA_TOKEN_VALIDATION_FAIL);
    }

    // =============================================================================
    // STORAGE FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_store_outage_hides_detail() {
        let clock = Arc::new(ManualClock::new(START));
        let gateway = gateway_over(Arc::new(OfflineStore), clock);
        let token = gateway
            .tokens()
            .issue_for_at("alice@x.com", "tid", None, false, START)
            .unwrap();

        let me = gateway
            .handle(members_gateway::InboundRequest::new("members.me", json!({})).with_header("member_jwt", token))
            .await;
        assert_eq!(me.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(me.envelope.code, codes::DB_ERROR);
        assert!(!me.envelope.message.contains("db-7"));
        assert!(me.envelope.data.is_null());

        let signup = gateway
            .handle(members_gateway::InboundRequest::new(
                "members.signup",
                json!({ "id": "a@x.com", "password": PASSWORD, "nickname": "a" }),
            ))
            .await;
        assert_eq!(signup.envelope.code, codes::DB_ERROR);
    }

    #[tokio::test]
    async fn test_store_panic_is_contained() {
        let clock = Arc::new(ManualClock::new(START));
        let gateway = gateway_over(Arc::new(PanickingStore), clock);

        let out = gateway
            .handle(members_gateway::InboundRequest::new(
                "members.login",
                json!({ "id": "a@x.com", "password": PASSWORD }),
            ))
            .await;
        assert_eq!(out.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(out.envelope.code, codes::DB_ERROR);
        assert_eq!(out.stages.last(), Some(&Stage::Responded));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let store = Arc::new(SlowStore {
            inner: InMemoryPrincipalStore::new(),
            delay: Duration::from_millis(200),
        });
        store
            .inner
            .save(Principal::new("alice@x.com", "alice", START))
            .await
            .unwrap();

        let mut config = config();
        config.timeouts.principal_lookup_ms = 20;
        let gateway = gateway_with(config, store, Arc::new(ManualClock::new(START)));
        let token = gateway
            .tokens()
            .issue_for_at("alice@x.com", "tid", None, false, START)
            .unwrap();

        let out = gateway
            .handle(members_gateway::InboundRequest::new("members.me", json!({})).with_header("member_jwt", token))
            .await;
        assert_eq!(out.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(out.envelope.code, codes::DB_ERROR);
    }

    // =============================================================================
    // ISOLATION
    // =============================================================================

    #[tokio::test]
    async fn test_concurrent_requests_keep_their_own_trace() {
        let h = Harness::new();
        let requests = (0..16).map(|i| h.signup_numbered(i));
        let results = futures::future::join_all(requests).await;

        let trace_ids: HashSet<String> = results
            .iter()
            .map(|out| out.envelope.trace_id.clone())
            .collect();
        assert_eq!(trace_ids.len(), 16);

        for out in &results {
            assert_eq!(out.envelope.code, codes::M_SUCCESS);
            assert_eq!(out.stages.first(), Some(&Stage::Received));
            assert_eq!(out.stages.last(), Some(&Stage::Responded));
        }
        assert_eq!(h.store.len(), 16);
    }

    // =============================================================================
    // HTTP SURFACE
    // =============================================================================

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_axum_route() {
        let h = Harness::new();
        let app = Router::new()
            .route("/members/:route", post(handle_member_request))
            .with_state(h.gateway.clone());

        let signup = app
            .clone()
            .oneshot(post_json(
                "/members/members.signup",
                json!({ "id": "alice@x.com", "password": PASSWORD, "nickname": "alice" }),
            ))
            .await
            .unwrap();
        assert_eq!(signup.status(), StatusCode::OK);
        let body = body_json(signup).await;
        assert_eq!(body["code"], codes::M_SUCCESS);
        assert_eq!(body["result"], true);

        let denied = app
            .oneshot(post_json("/members/members.me", json!({})))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(denied).await;
        assert_eq!(body["code"], codes::MA_TOKEN_VALIDATION_FAIL);
        assert!(body["tid"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_axum_route_without_json_body() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        let token = h.login("alice@x.com").await;
        let app = Router::new()
            .route("/members/:route", post(handle_member_request))
            .with_state(h.gateway.clone());

        let post_raw = |token: &str, body: &'static str| {
            Request::builder()
                .method("POST")
                .uri("/members/members.me")
                .header("member_jwt", token)
                .body(Body::from(body))
                .unwrap()
        };

        // No body and no content type: the token is still checked.
        let garbage = app.clone().oneshot(post_raw("garbage", "")).await.unwrap();
        assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(garbage).await;
        assert_eq!(body["code"], codes::MA_TOKEN_VALIDATION_FAIL);
        assert!(body["tid"].as_str().is_some_and(|t| !t.is_empty()));

        let me = app.clone().oneshot(post_raw(&token, "")).await.unwrap();
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(body_json(me).await["data"]["nickname"], "alice");

        let malformed = app.oneshot(post_raw(&token, "{\"nickname\":")).await.unwrap();
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        let body = body_json(malformed).await;
        assert_eq!(body["code"], codes::A_FAIL);
        assert_eq!(body["result"], false);
    }
}
