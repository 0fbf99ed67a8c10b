//! # Member Journeys
//!
//! Signup, login, profile and lookup as a client sees them: status code,
//! envelope code and the localized message.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{Harness, GOOGLE_CODE, GOOGLE_EMAIL, PASSWORD, START};
    use axum::http::StatusCode;
    use members_gateway::domain::principal::rfc3339;
    use members_gateway::{codes, Agency, InboundRequest, Locale, MemberStatus, PrincipalStore, Role};
    use serde_json::json;

    const DAY: u64 = 24 * 60 * 60;

    fn ko(h: &Harness, code: &str) -> String {
        h.gateway.catalog().message(code, &[], Locale::Ko)
    }

    // =============================================================================
    // SIGNUP → LOGIN → ME
    // =============================================================================

    #[tokio::test]
    async fn test_signup_login_me() {
        let h = Harness::new();

        let out = h.signup("alice@x.com", "alice").await;
        assert_eq!(out.status, StatusCode::OK);
        assert_eq!(out.envelope.code, codes::M_SUCCESS);
        assert_eq!(out.envelope.message, ko(&h, codes::M_SUCCESS));
        assert!(out.envelope.data.get("credential_hash").is_none());

        let login = h
            .send("members.login", json!({ "id": "alice@x.com", "password": PASSWORD }))
            .await;
        assert_eq!(login.envelope.code, codes::MA_SUCCESS);
        let token = login.envelope.data["member_jwt"].as_str().unwrap();

        // The token id is the trace id of the request that issued it.
        let claims = h.gateway.tokens().authenticate_at(token, None, START).unwrap();
        assert_eq!(claims.id(), login.envelope.trace_id);
        assert_eq!(claims.subject(), "alice@x.com");

        let me = h.send_as("members.me", json!({}), token).await;
        assert_eq!(me.status, StatusCode::OK);
        assert_eq!(me.envelope.data["nickname"], "alice");
        assert!(me.envelope.data["last_login_at"].is_string());
        assert_ne!(me.envelope.trace_id, login.envelope.trace_id);
    }

    #[tokio::test]
    async fn test_english_messages() {
        let h = Harness::new();
        let req = InboundRequest::new("members.login", json!({ "id": "nobody@x.com", "password": "x" }))
            .with_header("Accept-Language", "en-GB,en;q=0.8");

        let out = h.gateway.handle(req).await;
        assert_eq!(out.envelope.code, codes::M_NOT_EXIST_OR_WRONG_PW);
        assert_eq!(out.envelope.message, "No such member or the password does not match.");
    }

    // =============================================================================
    // SIGNUP RULES
    // =============================================================================

    #[tokio::test]
    async fn test_duplicate_signup() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;

        let again = h.signup("alice@x.com", "alice2").await;
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.envelope.code, codes::M_DUPLICATED_MEMBER);

        let nickname = h.signup("bob@x.com", "alice").await;
        assert_eq!(nickname.status, StatusCode::CONFLICT);
        assert_eq!(nickname.envelope.code, codes::M_DUPLICATED_NICKNAME);
        assert_eq!(nickname.envelope.message, ko(&h, codes::M_DUPLICATED_NICKNAME));
    }

    #[tokio::test]
    async fn test_rejoin_cooldown_message_names_date() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        h.update("alice@x.com", |m| {
            m.status = MemberStatus::Deregistered;
            m.deregistered_at = Some(START - 5 * DAY);
        })
        .await;

        let out = h.signup("alice@x.com", "alice").await;
        assert_eq!(out.envelope.code, codes::M_RECENTLY_DEREGISTERED);
        let rejoin = rfc3339(START + 25 * DAY);
        assert!(out.envelope.message.contains(&rejoin), "{}", out.envelope.message);
        assert!(!out.envelope.message.contains("{0}"));

        h.clock.advance(26 * DAY);
        let out = h.signup("alice@x.com", "alice").await;
        assert_eq!(out.envelope.code, codes::M_SUCCESS);
    }

    #[tokio::test]
    async fn test_deregister_then_rejoin_after_cooldown() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        let token = h.login("alice@x.com").await;

        let gone = h.send_as("members.deregister", json!({}), &token).await;
        assert_eq!(gone.status, StatusCode::OK);
        assert_eq!(gone.envelope.code, codes::M_SUCCESS);
        assert_eq!(gone.envelope.data["status"], "DEREGISTERED");

        // The session outlives the account only as a rejection.
        let me = h.send_as("members.me", json!({}), &token).await;
        assert_eq!(me.status, StatusCode::FORBIDDEN);
        assert_eq!(me.envelope.code, codes::M_DEREGISTERED_MEMBER);

        let early = h.signup("alice@x.com", "alice").await;
        assert_eq!(early.envelope.code, codes::M_RECENTLY_DEREGISTERED);
        let rejoin = rfc3339(START + 30 * DAY);
        assert!(early.envelope.message.contains(&rejoin), "{}", early.envelope.message);

        h.clock.advance(31 * DAY);
        let back = h.signup("alice@x.com", "alice").await;
        assert_eq!(back.envelope.code, codes::M_SUCCESS);
        let member = h.store.find_by_id("alice@x.com").await.unwrap().unwrap();
        assert_eq!(member.status, MemberStatus::Normal);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_profile_and_password() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        h.signup("bob@x.com", "bob").await;
        let token = h.login("alice@x.com").await;

        let taken = h.send_as("members.update", json!({ "nickname": "bob" }), &token).await;
        assert_eq!(taken.status, StatusCode::CONFLICT);
        assert_eq!(taken.envelope.code, codes::M_DUPLICATED_NICKNAME);

        let out = h
            .send_as(
                "members.update",
                json!({ "nickname": "ally", "name": " Alice ", "password": "fresh-password-1" }),
                &token,
            )
            .await;
        assert_eq!(out.status, StatusCode::OK);
        assert_eq!(out.envelope.data["nickname"], "ally");
        assert_eq!(out.envelope.data["name"], "Alice");
        assert!(out.envelope.data.get("credential_hash").is_none());

        let old = h
            .send("members.login", json!({ "id": "alice@x.com", "password": PASSWORD }))
            .await;
        assert_eq!(old.envelope.code, codes::M_NOT_EXIST_OR_WRONG_PW);
        let new = h
            .send("members.login", json!({ "id": "alice@x.com", "password": "fresh-password-1" }))
            .await;
        assert_eq!(new.envelope.code, codes::MA_SUCCESS);

        // The freed nickname is available again.
        assert_eq!(h.signup("carol@x.com", "alice").await.envelope.code, codes::M_SUCCESS);
    }

    #[tokio::test]
    async fn test_deregister_others_needs_admin() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        h.signup("root@x.com", "root").await;
        let alice = h.login("alice@x.com").await;
        let root = h.login("root@x.com").await;

        let denied = h
            .send_as("members.deregister", json!({ "id": "root@x.com" }), &alice)
            .await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.envelope.code, codes::M_NO_PERMISSION);

        h.promote("root@x.com", Role::Admin).await;
        let out = h
            .send_as("members.deregister", json!({ "id": "alice@x.com" }), &root)
            .await;
        assert_eq!(out.envelope.code, codes::M_SUCCESS);
        let alice = h.store.find_by_id("alice@x.com").await.unwrap().unwrap();
        assert_eq!(alice.status, MemberStatus::Deregistered);
        assert_eq!(alice.deregistered_at, Some(START));
    }

    #[tokio::test]
    async fn test_signup_rejects_blank_fields() {
        let h = Harness::new();
        let out = h
            .send("members.signup", json!({ "id": "", "password": PASSWORD, "nickname": "x" }))
            .await;
        assert_eq!(out.status, StatusCode::BAD_REQUEST);
        assert_eq!(out.envelope.code, codes::A_FAIL);

        let out = h.send("members.signup", json!({ "id": "a@x.com" })).await;
        assert_eq!(out.status, StatusCode::BAD_REQUEST);
    }

    // =============================================================================
    // LOGIN RULES
    // =============================================================================

    #[tokio::test]
    async fn test_login_failures_look_alike() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;

        let unknown = h
            .send("members.login", json!({ "id": "ghost@x.com", "password": PASSWORD }))
            .await;
        let wrong = h
            .send("members.login", json!({ "id": "alice@x.com", "password": "wrong-password" }))
            .await;

        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status, wrong.status);
        assert_eq!(unknown.envelope.code, wrong.envelope.code);
        assert_eq!(unknown.envelope.message, wrong.envelope.message);
        assert_eq!(unknown.envelope.data, wrong.envelope.data);
    }

    #[tokio::test]
    async fn test_status_blocks_login_and_session() {
        let cases = [
            (MemberStatus::Banned, codes::M_BANNED_MEMBER),
            (MemberStatus::Deregistered, codes::M_DEREGISTERED_MEMBER),
            (MemberStatus::Sleeping, codes::M_SLEEPING_MEMBER),
        ];

        for (status, code) in cases {
            let h = Harness::new();
            h.signup("alice@x.com", "alice").await;
            let token = h.login("alice@x.com").await;
            h.update("alice@x.com", |m| m.status = status).await;

            let login = h
                .send("members.login", json!({ "id": "alice@x.com", "password": PASSWORD }))
                .await;
            assert_eq!(login.status, StatusCode::FORBIDDEN);
            assert_eq!(login.envelope.code, code);

            // Sessions issued before the status change stop working too.
            let me = h.send_as("members.me", json!({}), &token).await;
            assert_eq!(me.status, StatusCode::FORBIDDEN);
            assert_eq!(me.envelope.code, code);
        }
    }

    #[tokio::test]
    async fn test_keep_logged_in_outlives_normal_session() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;

        let short = h.login("alice@x.com").await;
        let long = h
            .send(
                "members.login",
                json!({ "id": "alice@x.com", "password": PASSWORD, "keep_logged_in": true }),
            )
            .await
            .envelope
            .data["member_jwt"]
            .as_str()
            .unwrap()
            .to_string();

        h.clock.advance(DAY);
        assert_eq!(
            h.send_as("members.me", json!({}), &short).await.status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(h.send_as("members.me", json!({}), &long).await.status, StatusCode::OK);
    }

    // =============================================================================
    // ROLE-GATED LOOKUP
    // =============================================================================

    #[tokio::test]
    async fn test_find_member_requires_manager() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        h.signup("boss@x.com", "boss").await;
        let alice = h.login("alice@x.com").await;
        let boss = h.login("boss@x.com").await;

        let denied = h
            .send_as("members.find", json!({ "nickname": "boss" }), &alice)
            .await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.envelope.code, codes::M_NO_PERMISSION);
        assert!(denied.envelope.data.is_null());

        // Role is read from the store on every request, not from the token.
        h.promote("boss@x.com", Role::Manager).await;
        let found = h
            .send_as("members.find", json!({ "nickname": "alice" }), &boss)
            .await;
        assert_eq!(found.status, StatusCode::OK);
        assert_eq!(found.envelope.data["id"], "alice@x.com");

        let missing = h
            .send_as("members.find", json!({ "id": "ghost@x.com" }), &boss)
            .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.envelope.code, codes::M_NOT_EXIST_MEMBER);
    }

    // =============================================================================
    // SOCIAL LOGIN & TOKEN VERIFICATION
    // =============================================================================

    #[tokio::test]
    async fn test_social_login_signs_up_once() {
        let h = Harness::new();

        let first = h.send("members.social_login", json!({ "code": GOOGLE_CODE })).await;
        assert_eq!(first.envelope.code, codes::MA_SUCCESS);
        assert_eq!(first.envelope.data["member"]["agency"], "GOOGLE");

        let second = h.send("members.social_login", json!({ "code": GOOGLE_CODE })).await;
        assert_eq!(second.envelope.code, codes::MA_SUCCESS);
        assert_eq!(h.store.len(), 1);

        let member = h.store.find_by_id(GOOGLE_EMAIL).await.unwrap().unwrap();
        assert_eq!(member.agency, Agency::Google);

        let token = second.envelope.data["member_jwt"].as_str().unwrap();
        let me = h.send_as("members.me", json!({}), token).await;
        assert_eq!(me.envelope.data["id"], GOOGLE_EMAIL);

        let rejected = h.send("members.social_login", json!({ "code": "stolen" })).await;
        assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejected.envelope.code, codes::MA_FAIL);
    }

    #[tokio::test]
    async fn test_verify_token_route() {
        let h = Harness::new();
        h.signup("alice@x.com", "alice").await;
        let token = h.login("alice@x.com").await;

        let out = h
            .send(
                "members.verify_token",
                json!({ "token": token, "audience": "blog.de4bi.com" }),
            )
            .await;
        assert_eq!(out.envelope.code, codes::MA_SUCCESS);
        assert_eq!(out.envelope.data["claims"]["sub"], "alice@x.com");
        assert_eq!(out.envelope.data["claims"]["aud"], "*.de4bi.com");

        let foreign = h
            .send(
                "members.verify_token",
                json!({ "token": token, "audience": "blog.example.com" }),
            )
            .await;
        assert_eq!(foreign.envelope.code, codes::MA_TOKEN_INVALID_AUD);
    }
}
