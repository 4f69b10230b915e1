//! Entitlement query: "what is my subscription standing?"
//!
//! The query is gated (only a parent holding a token ever fetches), cached
//! and de-duplicated per session token, non-retrying on failure, and
//! pollable on a fixed interval while the pending-approval screen is shown.
//! Its observable state is recorded in the subscription store, so session
//! teardown resets it along with the rest of the subscription state.

use std::sync::Arc;

use moka::future::Cache;
use tokio::time::MissedTickBehavior;

use crate::api::ApiGateway;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{EntitlementData, Subscription, User};
use crate::session::{SessionPhase, SessionStore};
use crate::subscription::SubscriptionStore;

const MY_SUBSCRIPTION_PATH: &str = "subscriptions/my-subscription";

/// Observable state of the entitlement query.
///
/// Lives in the subscription store's snapshot; the access gate consults it on
/// every decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EntitlementState {
    /// Never executed this session.
    #[default]
    Idle,
    /// First fetch in flight; no resolved record exists yet.
    Loading,
    /// A subscription record is resolved, by a fetch or a committed payment.
    Ready(Subscription),
    /// Last fetch failed with no resolved record to fall back on. The access
    /// gate treats this as "no subscription". Not retried automatically.
    Failed,
}

/// Outcome of the pending-approval polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The subscription became active; the approval callback has fired.
    Approved,
    /// The session ended (logout or invalidation) while polling.
    SessionEnded,
}

struct EntitlementInner {
    gateway: ApiGateway,
    session: SessionStore,
    subscriptions: SubscriptionStore,
    /// Results cached per session token; concurrent callers for the same
    /// token coalesce into one request.
    cache: Cache<String, Subscription>,
    poll_interval: std::time::Duration,
}

/// Cached, de-duplicated, pollable entitlement query.
#[derive(Clone)]
pub struct EntitlementClient {
    inner: Arc<EntitlementInner>,
}

impl EntitlementClient {
    /// Create a query bound to the given session.
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        gateway: ApiGateway,
        session: SessionStore,
        subscriptions: SubscriptionStore,
    ) -> Self {
        Self {
            inner: Arc::new(EntitlementInner {
                gateway,
                session,
                subscriptions,
                cache: Cache::builder()
                    .max_capacity(4)
                    .time_to_live(config.entitlement_cache_ttl)
                    .build(),
                poll_interval: config.poll_interval,
            }),
        }
    }

    /// Current query state, as recorded in the subscription store.
    #[must_use]
    pub fn state(&self) -> EntitlementState {
        self.inner.subscriptions.entitlement()
    }

    /// Execute the query if it applies to the current session.
    ///
    /// Returns `Ok(None)` without touching the network when no token exists
    /// or the user's role is not subject to entitlement checks. On success
    /// the result is written to the subscription store; results that resolve
    /// after the session epoch has moved on are returned but not applied.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. A failed fetch is not retried automatically.
    pub async fn refresh(&self) -> Result<Option<Subscription>, ApiError> {
        self.fetch(false).await
    }

    /// Execute the query, bypassing the per-token cache.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. A failed fetch is not retried automatically.
    pub async fn refresh_uncached(&self) -> Result<Option<Subscription>, ApiError> {
        self.fetch(true).await
    }

    async fn fetch(&self, bypass_cache: bool) -> Result<Option<Subscription>, ApiError> {
        let SessionPhase::Authenticated { user, token } = self.inner.session.current() else {
            return Ok(None);
        };
        if !user.role.requires_entitlement() {
            return Ok(None);
        }

        let epoch = self.inner.session.epoch();

        if matches!(self.inner.subscriptions.entitlement(), EntitlementState::Idle) {
            self.inner
                .subscriptions
                .set_entitlement(EntitlementState::Loading);
            // A fresh session must never be served a result cached under a
            // previous session's credential.
            self.inner.cache.invalidate(&token).await;
        }

        if bypass_cache {
            self.inner.cache.invalidate(&token).await;
        }

        let gateway = self.inner.gateway.clone();
        let result = self
            .inner
            .cache
            .try_get_with(token, fetch_subscription(gateway, user))
            .await;

        match result {
            Ok(subscription) => {
                if self.inner.session.epoch() == epoch {
                    self.inner
                        .subscriptions
                        .set_entitlement(EntitlementState::Ready(subscription.clone()));
                } else {
                    tracing::debug!("discarding entitlement result from a previous session epoch");
                }
                Ok(Some(subscription))
            }
            Err(shared) => {
                let err: ApiError = (*shared).clone();
                // Keep a resolved record if one exists; only the no-record
                // case degrades to Failed.
                if self.inner.session.epoch() == epoch
                    && !matches!(
                        self.inner.subscriptions.entitlement(),
                        EntitlementState::Ready(_)
                    )
                {
                    self.inner
                        .subscriptions
                        .set_entitlement(EntitlementState::Failed);
                }
                Err(err)
            }
        }
    }

    /// Poll the query on the configured interval until the subscription
    /// becomes active, then fire `on_approved` exactly once and stop.
    ///
    /// Fetch failures do not abort the loop; the next interval polls again.
    /// The loop also stops, without firing the callback, if the session
    /// epoch changes (logout or invalidation mid-poll).
    pub async fn poll_until_active(&self, on_approved: impl FnOnce()) -> PollOutcome {
        let epoch = self.inner.session.epoch();
        let mut on_approved = Some(on_approved);

        let mut ticker = tokio::time::interval(self.inner.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately, so the first poll is not delayed
        // by a full interval.
        ticker.tick().await;

        loop {
            if self.inner.session.epoch() != epoch {
                return PollOutcome::SessionEnded;
            }

            match self.refresh_uncached().await {
                Ok(Some(subscription)) if subscription.status.is_active() => {
                    if let Some(callback) = on_approved.take() {
                        callback();
                    }
                    return PollOutcome::Approved;
                }
                Ok(Some(_)) => {}
                Ok(None) => return PollOutcome::SessionEnded,
                Err(err) => {
                    tracing::debug!(error = %err, "entitlement poll failed; retrying next interval");
                }
            }

            ticker.tick().await;
        }
    }
}

async fn fetch_subscription(gateway: ApiGateway, user: User) -> Result<Subscription, ApiError> {
    let data: EntitlementData = gateway.get_json(MY_SUBSCRIPTION_PATH).await?;
    Ok(data.into_subscription(user.subscription_status))
}
