//! Reactive subscription state.
//!
//! Pure state holder: no network access of its own. The entitlement query
//! records its observable state (and the resolved subscription record) here,
//! the onboarding flow writes the selected package and pending payment, and
//! the API gateway raises the subscription-required flag. The access gate
//! reads this store, so every status transition is visible through one place:
//! a resolved fetch, a committed payment, and session teardown all surface
//! through the same snapshot. Cleared as part of the session teardown
//! procedure, which also drops the previous session's entitlement state.

use std::sync::Arc;

use tokio::sync::watch;

use tutorhub_core::SubscriptionStatus;

use crate::entitlement::EntitlementState;
use crate::models::{Package, PendingPayment, Subscription};

/// Point-in-time view of the subscription state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionSnapshot {
    /// Observable state of the entitlement query; carries the resolved
    /// subscription record once a fetch (or a committed payment) resolves one.
    pub entitlement: EntitlementState,
    /// Package chosen during onboarding, pre-purchase.
    pub selected_package: Option<Package>,
    /// Set by the gateway upon observing a subscription-marked 403. Forces
    /// re-entry into onboarding even over a stale cached `active` status.
    pub subscription_required: bool,
}

/// Process-wide reactive subscription store.
///
/// Cheaply cloneable; all clones observe the same state.
#[derive(Clone)]
pub struct SubscriptionStore {
    state: Arc<watch::Sender<SubscriptionSnapshot>>,
}

impl Default for SubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(SubscriptionSnapshot::default())),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn current(&self) -> SubscriptionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SubscriptionSnapshot> {
        self.state.subscribe()
    }

    /// Current entitlement state.
    #[must_use]
    pub fn entitlement(&self) -> EntitlementState {
        self.state.borrow().entitlement.clone()
    }

    /// Resolved subscription record, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<Subscription> {
        match &self.state.borrow().entitlement {
            EntitlementState::Ready(subscription) => Some(subscription.clone()),
            _ => None,
        }
    }

    /// Resolved subscription status, `Unknown` until the entitlement query
    /// resolves at least once.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.subscription()
            .map_or(SubscriptionStatus::Unknown, |s| s.status)
    }

    /// Whether the subscription-required flag is raised.
    #[must_use]
    pub fn subscription_required(&self) -> bool {
        self.state.borrow().subscription_required
    }

    /// Currently selected package, if any.
    #[must_use]
    pub fn selected_package(&self) -> Option<Package> {
        self.state.borrow().selected_package.clone()
    }

    /// Record an entitlement query transition.
    pub fn set_entitlement(&self, entitlement: EntitlementState) {
        self.state.send_modify(|s| s.entitlement = entitlement);
    }

    /// Set or clear the selected package.
    pub fn set_selected_package(&self, package: Option<Package>) {
        self.state.send_modify(|s| s.selected_package = package);
    }

    /// Raise or clear the subscription-required flag.
    pub fn set_subscription_required(&self, required: bool) {
        self.state
            .send_modify(|s| s.subscription_required = required);
    }

    /// Record a successful payment submission.
    ///
    /// The resolved record flips to `pending` with the payment attached, and
    /// the entitlement state resolves to `Ready` with it, so the access gate
    /// routes to the pending-approval step without waiting for the next
    /// entitlement fetch.
    pub fn record_pending_payment(&self, payment: PendingPayment) {
        self.state.send_modify(|s| {
            let mut subscription = match std::mem::take(&mut s.entitlement) {
                EntitlementState::Ready(subscription) => subscription,
                _ => Subscription::default(),
            };
            subscription.status = SubscriptionStatus::Pending;
            subscription.pending_payment = Some(payment);
            s.entitlement = EntitlementState::Ready(subscription);
        });
    }

    /// Reset everything to empty. Invoked by the session teardown procedure;
    /// the entitlement state returns to `Idle` so the next session starts
    /// from an unresolved standing.
    pub fn clear(&self) {
        self.state.send_replace(SubscriptionSnapshot::default());
    }
}
