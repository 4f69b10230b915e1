//! SDK facade wiring the stores, gateway, and flows together.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::ApiGateway;
use crate::config::ClientConfig;
use crate::entitlement::EntitlementClient;
use crate::error::ClientError;
use crate::gate::{self, AccessDecision};
use crate::models::User;
use crate::onboarding::OnboardingFlow;
use crate::session::{SessionPhase, SessionStore};
use crate::storage::{FileStore, KeyValueStore};
use crate::subscription::SubscriptionStore;

const LOGIN_PATH: &str = "auth/login";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: User,
}

/// The TutorHub client.
///
/// Owns the process-wide singleton stores and the request pipeline. All
/// state is shared: clones of the individual stores handed out by the
/// accessors observe the same session and subscription.
pub struct TutorHub {
    config: ClientConfig,
    session: SessionStore,
    subscriptions: SubscriptionStore,
    gateway: ApiGateway,
    entitlements: EntitlementClient,
    onboarding: OnboardingFlow,
}

impl TutorHub {
    /// Create a client with file-backed durable storage at the configured
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file exists but cannot be read.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let storage = Arc::new(FileStore::open(&config.storage_path)?);
        Ok(Self::with_storage(config, storage))
    }

    /// Create a client over an explicit storage implementation.
    #[must_use]
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = SessionStore::new(storage);
        let subscriptions = SubscriptionStore::new();
        let gateway = ApiGateway::new(&config, session.clone(), subscriptions.clone());
        let entitlements = EntitlementClient::new(
            &config,
            gateway.clone(),
            session.clone(),
            subscriptions.clone(),
        );
        let onboarding =
            OnboardingFlow::new(gateway.clone(), subscriptions.clone(), entitlements.clone());

        Self {
            config,
            session,
            subscriptions,
            gateway,
            entitlements,
            onboarding,
        }
    }

    /// Restore the session from durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage cannot be read.
    pub fn restore(&self) -> Result<SessionPhase, ClientError> {
        Ok(self.session.restore()?)
    }

    /// Authenticate against the platform and establish a session.
    ///
    /// # Errors
    ///
    /// Returns an API error on rejected credentials, or a session error if
    /// the account is an admin (admin sessions are never held on this
    /// client).
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let data: LoginData = self
            .gateway
            .post_json(LOGIN_PATH, &LoginRequest { email, password })
            .await?;
        self.session.login(data.user.clone(), data.token)?;
        Ok(data.user)
    }

    /// Tear down the session: best-effort remote logout, then unconditional
    /// local teardown.
    pub async fn logout(&self) {
        self.session.logout(&self.gateway, &self.subscriptions).await;
    }

    /// Evaluate the access gate for the current state.
    #[must_use]
    pub fn access_decision(&self) -> AccessDecision {
        gate::decide(
            &self.session.current(),
            &self.subscriptions.entitlement(),
            self.subscriptions.subscription_required(),
        )
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session store.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The subscription store.
    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionStore {
        &self.subscriptions
    }

    /// The API gateway.
    #[must_use]
    pub const fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// The entitlement query.
    #[must_use]
    pub const fn entitlements(&self) -> &EntitlementClient {
        &self.entitlements
    }

    /// The onboarding flow.
    #[must_use]
    pub const fn onboarding(&self) -> &OnboardingFlow {
        &self.onboarding
    }
}
