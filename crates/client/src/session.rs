//! Session lifecycle: restore, login, logout.
//!
//! Exactly one session exists process-wide; this store is the sole authority
//! other components consult for "who is logged in". The in-memory state is
//! mirrored to durable storage (keys `auth_token` and `user`) so it survives
//! process restarts. Subscription state is deliberately *not* mirrored; it is
//! always re-derived from the network after a restore.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;

use tutorhub_core::Role;

use crate::api::ApiGateway;
use crate::models::User;
use crate::storage::{KeyValueStore, StorageError, keys};
use crate::subscription::SubscriptionStore;

/// Session state machine.
///
/// `Unknown` exists only before the first `restore()`; the `Authenticated`
/// variant carries both the user and the token, so "authenticated with only
/// one of the two present" is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Pre-restore: durable storage has not been consulted yet.
    Unknown,
    /// No session is held.
    Unauthenticated,
    /// A session is held.
    Authenticated {
        user: User,
        token: String,
    },
}

impl SessionPhase {
    /// Whether a session is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// The logged-in user's role, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Admin accounts are issued sessions on other clients; this client must
    /// never hold one.
    #[error("admin accounts cannot hold a session on this client")]
    AdminSession,

    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

struct SessionInner {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionPhase>,
    /// Bumped by login, logout, and invalidation. In-flight results captured
    /// under an older epoch are discarded instead of being applied to the
    /// next session's state.
    epoch: AtomicU64,
}

/// Process-wide reactive session store.
///
/// Cheaply cloneable; all clones observe the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Create a store in the pre-restore `Unknown` phase.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                storage,
                state: watch::Sender::new(SessionPhase::Unknown),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Current session phase.
    #[must_use]
    pub fn current(&self) -> SessionPhase {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.inner.state.subscribe()
    }

    /// Current session epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Restore the session from durable storage.
    ///
    /// Yields `Authenticated` iff both the token and a parseable user record
    /// are present. A stored `admin` user is treated as invalid: storage is
    /// wiped and the result is `Unauthenticated`, so an admin credential can
    /// never survive in local storage.
    ///
    /// # Errors
    ///
    /// Returns an error only if durable storage cannot be read.
    pub fn restore(&self) -> Result<SessionPhase, SessionError> {
        let token = self.inner.storage.get(keys::AUTH_TOKEN)?;
        let user_json = self.inner.storage.get(keys::USER)?;

        let phase = match (token, user_json) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) if user.role == Role::Admin => {
                    tracing::warn!("stored session belongs to an admin account; wiping it");
                    self.wipe_storage();
                    SessionPhase::Unauthenticated
                }
                Ok(user) => SessionPhase::Authenticated { user, token },
                Err(err) => {
                    tracing::warn!(error = %err, "stored user record is corrupt; wiping session");
                    self.wipe_storage();
                    SessionPhase::Unauthenticated
                }
            },
            _ => SessionPhase::Unauthenticated,
        };

        self.inner.state.send_replace(phase.clone());
        tracing::debug!(authenticated = phase.is_authenticated(), "session restored");
        Ok(phase)
    }

    /// Establish a session.
    ///
    /// Both fields are persisted durably first; the in-memory state then
    /// flips in a single update so consumers never observe a half-set
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AdminSession`] for admin users (nothing is
    /// persisted), or a storage error if persistence fails.
    pub fn login(&self, user: User, token: String) -> Result<(), SessionError> {
        if user.role == Role::Admin {
            return Err(SessionError::AdminSession);
        }

        let user_json = serde_json::to_string(&user)
            .map_err(|e| StorageError::Serde(e.to_string()))?;
        self.inner.storage.set(keys::AUTH_TOKEN, &token)?;
        self.inner.storage.set(keys::USER, &user_json)?;

        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner
            .state
            .send_replace(SessionPhase::Authenticated { user, token });
        tracing::debug!("session established");
        Ok(())
    }

    /// Tear down the session.
    ///
    /// Remote logout is fire-and-continue: its failure is logged and ignored,
    /// the local session is cleared regardless of server acknowledgment.
    /// Ordering matters: durable storage and the dependent subscription store
    /// are cleared *before* the in-memory session flips, so no component
    /// observes `authenticated == false` alongside stale subscription data.
    pub async fn logout(&self, gateway: &ApiGateway, subscriptions: &SubscriptionStore) {
        if self.current().is_authenticated()
            && let Err(err) = gateway.remote_logout().await
        {
            tracing::warn!(error = %err, "remote logout failed; clearing local session anyway");
        }

        self.wipe_storage();
        subscriptions.clear();

        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.state.send_replace(SessionPhase::Unauthenticated);
        tracing::debug!("session cleared");
    }

    /// Invalidate the session after the gateway observed a 401.
    ///
    /// Wipes durable storage and flips the in-memory session in one step, so
    /// a subsequent read can never show `authenticated == true` against a
    /// rejected credential.
    pub fn invalidate(&self) {
        self.wipe_storage();
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.state.send_replace(SessionPhase::Unauthenticated);
    }

    /// Best-effort wipe of the durable session keys.
    fn wipe_storage(&self) {
        for key in [keys::AUTH_TOKEN, keys::USER] {
            if let Err(err) = self.inner.storage.remove(key) {
                tracing::warn!(key, error = %err, "failed to clear durable session key");
            }
        }
    }
}
