//! Guard for protected views. A check moves `Checking` to either `Authorized`
//! or `Unauthorized`; an unauthorized outcome has already navigated away when it
//! is published. This is a UX gate only, the backend enforces access.

use super::UserRecord;
use crate::{
    api::Envelope,
    client::{endpoints, ApiClient, ApiRequest, ClientError},
    config::DEFAULT_DENIED_ROUTE,
};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Which verification endpoint the guard calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerifyScope {
    #[default]
    User,
    Admin,
}

impl VerifyScope {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::User => endpoints::VERIFY_PATH,
            Self::Admin => endpoints::ADMIN_VERIFY_PATH,
        }
    }
}

/// Roles allowed through the guard, matched against `user_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleRequirement {
    allowed: Vec<String>,
}

impl RoleRequirement {
    #[must_use]
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: roles
                .into_iter()
                .map(Into::into)
                .filter(|role: &String| !role.trim().is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn allows(&self, user: &UserRecord) -> bool {
        self.allowed.iter().any(|role| user.has_role(role))
    }
}

#[derive(Clone, Debug)]
pub struct GuardOptions {
    pub scope: VerifyScope,
    pub requirement: Option<RoleRequirement>,
    /// Where authenticated users without the required role are sent.
    pub denied_route: String,
    /// Cache the user record from the verify payload when none is stored.
    pub hydrate_from_verify: bool,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            scope: VerifyScope::default(),
            requirement: None,
            denied_route: DEFAULT_DENIED_ROUTE.to_string(),
            hydrate_from_verify: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum GuardState {
    #[default]
    Checking,
    Authorized(UserRecord),
    Unauthorized { redirect_to: String },
}

impl GuardState {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

pub struct SessionGuard {
    client: ApiClient,
    options: GuardOptions,
    state: watch::Sender<GuardState>,
}

impl SessionGuard {
    #[must_use]
    pub fn new(client: ApiClient, options: GuardOptions) -> Self {
        let (state, _) = watch::channel(GuardState::Checking);
        Self {
            client,
            options,
            state,
        }
    }

    /// Receiver for state changes, starting with the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Verifies the session and publishes the outcome.
    #[instrument(skip(self), fields(scope = ?self.options.scope))]
    pub async fn check(&self) -> GuardState {
        self.state.send_replace(GuardState::Checking);

        let session = self.client.session();
        let navigations = session.navigations();

        let outcome = match self.verify().await {
            Ok(payload) => self.authorize(&payload),
            Err(err) => {
                warn!("session verification failed: {err}");
                session.expire();
                // an earlier expiry leaves the flag set, so navigate unless this
                // check already did
                let redirect_to = session.entry_route().to_string();
                if session.navigations() == navigations {
                    session.redirect(&redirect_to);
                }
                GuardState::Unauthorized { redirect_to }
            }
        };

        self.state.send_replace(outcome.clone());
        outcome
    }

    async fn verify(&self) -> Result<Value, ClientError> {
        let response = self
            .client
            .send(ApiRequest::get(self.options.scope.path()))
            .await?;

        let payload: Value = response.json().unwrap_or(Value::Null);
        let envelope: Envelope = Envelope::from_value(payload.clone())
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")))?;
        if !envelope.is_ok() {
            return Err(ClientError::Http {
                status: envelope.status.unwrap_or(401),
                message: envelope.failure_message(),
            });
        }

        Ok(payload)
    }

    fn authorize(&self, payload: &Value) -> GuardState {
        let session = self.client.session();

        let mut user = session.user().unwrap_or_else(|err| {
            error!("failed to read cached user record: {err}");
            None
        });

        if user.is_none() && self.options.hydrate_from_verify {
            user = user_from_payload(payload);
            if let Some(record) = &user {
                if let Err(err) = session.save_user(record) {
                    error!("failed to cache user record: {err}");
                }
            }
        }

        let Some(user) = user else {
            debug!("no cached user record");
            let redirect_to = session.entry_route().to_string();
            session.redirect(&redirect_to);
            return GuardState::Unauthorized { redirect_to };
        };

        if let Some(requirement) = &self.options.requirement {
            if !requirement.allows(&user) {
                info!("user type {} lacks the required role", user.user_type);
                session.redirect(&self.options.denied_route);
                return GuardState::Unauthorized {
                    redirect_to: self.options.denied_route.clone(),
                };
            }
        }

        GuardState::Authorized(user)
    }
}

/// Finds a user record in a verify payload: `data.user`, `data`, or `user`.
fn user_from_payload(payload: &Value) -> Option<UserRecord> {
    [
        payload.pointer("/data/user"),
        payload.get("data"),
        payload.get("user"),
    ]
    .into_iter()
    .flatten()
    .find_map(|value| serde_json::from_value(value.clone()).ok())
}
