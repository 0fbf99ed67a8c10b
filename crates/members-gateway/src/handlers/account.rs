//! Account routes: signup, own profile, member lookup.

use crate::adapters::password;
use crate::domain::config::SignupConfig;
use crate::domain::context::RequestContext;
use crate::domain::envelope::ResultEnvelope;
use crate::domain::error::{codes, MemberError, MemberResult};
use crate::domain::principal::{rfc3339, MemberStatus, Principal, Role};
use crate::handlers::required;
use crate::middleware::GuardedStore;
use crate::ports::outbound::{Insertion, TimeSource};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Deserialize)]
pub struct SignupParams {
    pub id: String,
    pub password: String,
    pub nickname: String,
    #[serde(default)]
    pub name: String,
}

// Password stays out of span fields.
impl std::fmt::Debug for SignupParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupParams")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}

/// Fields left out stay unchanged.
#[derive(Default, Deserialize)]
pub struct UpdateParams {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for UpdateParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateParams")
            .field("nickname", &self.nickname)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeregisterParams {
    /// Another member's id; admins only.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindParams {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Account route handler
pub struct AccountHandlers {
    store: GuardedStore,
    clock: Arc<dyn TimeSource>,
    signup: SignupConfig,
}

impl AccountHandlers {
    pub fn new(store: GuardedStore, clock: Arc<dyn TimeSource>, signup: SignupConfig) -> Self {
        Self {
            store,
            clock,
            signup,
        }
    }

    /// Create a member account with an argon2 credential hash.
    #[instrument(skip(self))]
    pub async fn signup(&self, params: SignupParams) -> MemberResult<ResultEnvelope> {
        let id = required("id", &params.id)?;
        let nickname = required("nickname", &params.nickname)?;
        self.check_password_len(&params.password)?;

        let now = self.clock.now();
        let existing = self.store.find_by_id(id).await?;
        if let Some(existing) = &existing {
            self.check_rejoin(existing, now)?;
        }

        if let Some(owner) = self.store.find_by_handle(nickname).await? {
            if owner.id != id {
                return Err(nickname_taken(nickname));
            }
        }

        let mut member = Principal::new(id, nickname, now);
        member.name = params.name.trim().to_string();
        member.credential_hash = Some(hash_password(&params.password)?);
        let view = member.view();

        match self.store.insert(member, existing.as_ref()).await? {
            Insertion::Inserted => {}
            Insertion::IdTaken => {
                return Err(MemberError::conflict(
                    codes::M_DUPLICATED_MEMBER,
                    format!("member '{id}' was created by a concurrent signup"),
                ))
            }
            Insertion::HandleTaken => return Err(nickname_taken(nickname)),
        }

        info!(member = %view.id, "Member signed up");
        Ok(ResultEnvelope::success()
            .with_code(codes::M_SUCCESS)
            .with_data(json!(view)))
    }

    /// Change the caller's nickname, name or password.
    #[instrument(skip(self, context))]
    pub async fn update(&self, context: &RequestContext, params: UpdateParams) -> MemberResult<ResultEnvelope> {
        let current = caller(context)?;
        let mut member = Principal::clone(&current);

        if let Some(nickname) = params.nickname.as_deref() {
            let nickname = required("nickname", nickname)?;
            if nickname != member.nickname {
                if let Some(owner) = self.store.find_by_handle(nickname).await? {
                    if owner.id != member.id {
                        return Err(nickname_taken(nickname));
                    }
                }
                member.nickname = nickname.to_string();
            }
        }
        if let Some(name) = params.name.as_deref() {
            member.name = name.trim().to_string();
        }
        if let Some(password) = params.password.as_deref() {
            self.check_password_len(password)?;
            member.credential_hash = Some(hash_password(password)?);
        }

        let view = member.view();
        if member != *current {
            let nickname = member.nickname.clone();
            self.replace(member, &current, &nickname).await?;
            info!(member = %view.id, "Member profile updated");
        }

        Ok(ResultEnvelope::success()
            .with_code(codes::M_SUCCESS)
            .with_data(json!(view)))
    }

    /// Deregister the caller, or any member when the caller is an admin.
    ///
    /// The record stays so the id can be held back for the rejoin cooldown.
    #[instrument(skip(self, context))]
    pub async fn deregister(
        &self,
        context: &RequestContext,
        params: DeregisterParams,
    ) -> MemberResult<ResultEnvelope> {
        let caller = caller(context)?;
        let target_id = match params.id.as_deref() {
            Some(id) => required("id", id)?,
            None => caller.id.as_str(),
        };

        if target_id != caller.id && !caller.has_role(Role::Admin) {
            return Err(MemberError::authorization(format!(
                "member '{}' may not deregister '{target_id}'",
                caller.id
            )));
        }

        let current = self
            .store
            .find_by_id(target_id)
            .await?
            .filter(|m| m.status != MemberStatus::Deregistered)
            .ok_or_else(|| MemberError::not_found(format!("no active member '{target_id}'")))?;

        let mut member = current.clone();
        member.status = MemberStatus::Deregistered;
        member.deregistered_at = Some(self.clock.now());
        let view = member.view();
        let nickname = member.nickname.clone();
        self.replace(member, &current, &nickname).await?;

        info!(member = %view.id, by = %caller.id, "Member deregistered");
        Ok(ResultEnvelope::success()
            .with_code(codes::M_SUCCESS)
            .with_data(json!(view)))
    }

    /// Swap `current` for `next` unless someone else wrote in between.
    async fn replace(&self, next: Principal, current: &Principal, nickname: &str) -> MemberResult<()> {
        match self.store.insert(next, Some(current)).await? {
            Insertion::Inserted => Ok(()),
            Insertion::IdTaken => Err(MemberError::conflict(
                codes::M_FAIL,
                format!("member '{}' changed concurrently", current.id),
            )),
            Insertion::HandleTaken => Err(nickname_taken(nickname)),
        }
    }

    fn check_password_len(&self, password: &str) -> MemberResult<()> {
        if password.chars().count() < self.signup.min_password_len {
            return Err(MemberError::validation(format!(
                "password shorter than {} characters",
                self.signup.min_password_len
            )));
        }
        Ok(())
    }

    /// An id may only be reused after deregistration plus the cooldown.
    fn check_rejoin(&self, existing: &Principal, now: u64) -> MemberResult<()> {
        match (existing.status, existing.deregistered_at) {
            (MemberStatus::Deregistered, Some(at)) => {
                let rejoin_at = at.saturating_add(self.signup.rejoin_cooldown_secs());
                if now < rejoin_at {
                    return Err(MemberError::conflict(
                        codes::M_RECENTLY_DEREGISTERED,
                        format!("'{}' deregistered at {at}, rejoin from {rejoin_at}", existing.id),
                    )
                    .with_params([rfc3339(rejoin_at)]));
                }
                Ok(())
            }
            (MemberStatus::Deregistered, None) => Ok(()),
            _ => Err(MemberError::conflict(
                codes::M_DUPLICATED_MEMBER,
                format!("member '{}' already exists", existing.id),
            )),
        }
    }

    /// Profile of the authenticated caller.
    pub async fn me(&self, context: &RequestContext) -> MemberResult<ResultEnvelope> {
        let member = caller(context)?;
        Ok(ResultEnvelope::success()
            .with_code(codes::M_SUCCESS)
            .with_data(json!(member.view())))
    }

    /// Look a member up by id or nickname.
    #[instrument(skip(self))]
    pub async fn find(&self, params: FindParams) -> MemberResult<ResultEnvelope> {
        let found = match (params.id.as_deref(), params.nickname.as_deref()) {
            (Some(id), _) => self.store.find_by_id(required("id", id)?).await?,
            (None, Some(nickname)) => {
                self.store
                    .find_by_handle(required("nickname", nickname)?)
                    .await?
            }
            (None, None) => return Err(MemberError::validation("'id' or 'nickname' is required")),
        };

        let member = found.ok_or_else(|| MemberError::not_found("no matching member"))?;
        Ok(ResultEnvelope::success()
            .with_code(codes::M_SUCCESS)
            .with_data(json!(member.view())))
    }
}

fn caller(context: &RequestContext) -> MemberResult<Arc<Principal>> {
    context
        .principal()
        .ok_or_else(|| MemberError::authentication("no authenticated member in context"))
}

fn nickname_taken(nickname: &str) -> MemberError {
    MemberError::conflict(
        codes::M_DUPLICATED_NICKNAME,
        format!("nickname '{nickname}' belongs to another member"),
    )
}

fn hash_password(password: &str) -> MemberResult<String> {
    password::hash(password).map_err(|e| MemberError::unhandled(format!("password hashing failed: {e}")))
}
