//! Session routes: login, social login, token verification.

use crate::adapters::password;
use crate::domain::correlation::TraceId;
use crate::domain::envelope::ResultEnvelope;
use crate::domain::error::{codes, MemberError, MemberResult};
use crate::domain::principal::{Agency, Principal};
use crate::handlers::required;
use crate::middleware::GuardedStore;
use crate::ports::outbound::{IdentityAssertion, IdentityProvider, Insertion, TimeSource};
use member_token::{SessionClaims, TokenService};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Attempts at a free nickname before an auto-signup gives up.
const NICKNAME_ATTEMPTS: usize = 5;

#[derive(Deserialize)]
pub struct LoginParams {
    pub id: String,
    pub password: String,
    #[serde(default)]
    pub keep_logged_in: bool,
    #[serde(default)]
    pub audience: Option<String>,
}

impl std::fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginParams")
            .field("id", &self.id)
            .field("keep_logged_in", &self.keep_logged_in)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct SocialLoginParams {
    pub code: String,
    #[serde(default)]
    pub keep_logged_in: bool,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    pub token: String,
    #[serde(default)]
    pub audience: Option<String>,
}

impl std::fmt::Debug for VerifyParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyParams")
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

/// Session route handler
pub struct SessionHandlers {
    tokens: Arc<TokenService>,
    store: GuardedStore,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn TimeSource>,
}

impl SessionHandlers {
    pub fn new(
        tokens: Arc<TokenService>,
        store: GuardedStore,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            tokens,
            store,
            identity,
            clock,
        }
    }

    /// Password login. Unknown ids and wrong passwords are indistinguishable.
    #[instrument(skip(self, trace_id))]
    pub async fn login(&self, trace_id: TraceId, params: LoginParams) -> MemberResult<ResultEnvelope> {
        let id = required("id", &params.id)?;

        // Every rejection below costs one argon2 verification.
        let found = self.store.find_by_id(id).await?;
        let stored = found.as_ref().and_then(|m| m.credential_hash.as_deref());
        let matched = password::verify_or_decoy(&params.password, stored);

        let member = match found {
            Some(member) if matched => member,
            Some(_) => {
                return Err(MemberError::login_rejected(format!(
                    "password mismatch or no password credential for '{id}'"
                )))
            }
            None => return Err(MemberError::login_rejected(format!("no member '{id}'"))),
        };

        self.start_session(member, trace_id, params.audience.as_deref(), params.keep_logged_in)
            .await
    }

    /// Identity-provider login; unknown emails are signed up on the spot.
    #[instrument(skip(self, trace_id))]
    pub async fn social_login(
        &self,
        trace_id: TraceId,
        params: SocialLoginParams,
    ) -> MemberResult<ResultEnvelope> {
        let code = required("code", &params.code)?;
        let assertion = self.identity.exchange(code).await.map_err(|e| {
            MemberError::authentication(format!("identity exchange failed: {e:#}")).with_code(codes::MA_FAIL)
        })?;
        let email = required("email", &assertion.email)?.to_string();

        let member = match self.store.find_by_id(&email).await? {
            Some(member) => member,
            None => self.auto_signup(&email, &assertion).await?,
        };

        self.start_session(member, trace_id, params.audience.as_deref(), params.keep_logged_in)
            .await
    }

    async fn auto_signup(&self, email: &str, assertion: &IdentityAssertion) -> MemberResult<Principal> {
        let base = match assertion.display_name.trim() {
            "" => email.split('@').next().unwrap_or(email).to_string(),
            name => name.to_string(),
        };

        let mut nickname = base.clone();
        for _ in 0..NICKNAME_ATTEMPTS {
            let mut member = Principal::new(email, nickname, self.clock.now());
            member.name = assertion.display_name.trim().to_string();
            member.agency = Agency::Google;

            match self.store.insert(member.clone(), None).await? {
                Insertion::Inserted => {
                    info!(member = %member.id, nickname = %member.nickname, "Member signed up through identity provider");
                    return Ok(member);
                }
                // A concurrent login for the same email created the account first.
                Insertion::IdTaken => {
                    return self.store.find_by_id(email).await?.ok_or_else(|| {
                        MemberError::storage(format!("'{email}' reported taken but not found"))
                    })
                }
                Insertion::HandleTaken => {}
            }
            nickname = format!("{base}{:04}", rand::thread_rng().gen_range(0..10_000));
        }

        Err(MemberError::conflict(
            codes::M_DUPLICATED_NICKNAME,
            format!("no free nickname derived from '{base}'"),
        ))
    }

    async fn start_session(
        &self,
        mut member: Principal,
        trace_id: TraceId,
        audience: Option<&str>,
        keep_logged_in: bool,
    ) -> MemberResult<ResultEnvelope> {
        member.ensure_loginable()?;

        let now = self.clock.now();
        let token = self.tokens.issue_for_at(
            &member.id,
            &trace_id.to_string(),
            audience,
            keep_logged_in,
            now,
        )?;

        member.last_login_at = Some(now);
        let view = member.view();
        self.store.save(member).await?;

        debug!(member = %view.id, keep_logged_in, "Session issued");
        Ok(ResultEnvelope::success()
            .with_code(codes::MA_SUCCESS)
            .with_data(json!({ "member_jwt": token, "member": view })))
    }

    /// Validate a presented token and report its claims and owner.
    #[instrument(skip(self))]
    pub async fn verify_token(&self, params: VerifyParams) -> MemberResult<ResultEnvelope> {
        let token = required("token", &params.token)?;
        let claims = self
            .tokens
            .authenticate_at(token, params.audience.as_deref(), self.clock.now())?;

        let member = self
            .store
            .find_by_id(claims.subject())
            .await?
            .ok_or_else(|| {
                MemberError::authentication(format!("no member for subject '{}'", claims.subject()))
            })?;
        member.ensure_loginable()?;

        Ok(ResultEnvelope::success()
            .with_code(codes::MA_SUCCESS)
            .with_data(json!({ "claims": claims_json(&claims), "member": member.view() })))
    }
}

fn claims_json(claims: &SessionClaims) -> Value {
    json!({
        "jti": claims.id(),
        "sub": claims.subject(),
        "iss": claims.issuer(),
        "aud": claims.audience(),
        "iat": claims.issued_at(),
        "exp": claims.expiration(),
        "nbf": claims.not_before(),
    })
}
