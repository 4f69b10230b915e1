//! Access gate: which top-level flow renders.
//!
//! A pure decision function re-evaluated on every relevant state change. It
//! never performs I/O; the entitlement query is executed elsewhere and only
//! its observable state is consulted here, which is how non-parent roles are
//! guaranteed to never trigger an entitlement fetch.

use tutorhub_core::{Role, SubscriptionStatus};

use crate::entitlement::EntitlementState;
use crate::session::SessionPhase;

/// Initial step when entering the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    /// Choose a subscription package.
    PackageSelection,
    /// A payment is awaiting admin approval.
    PendingApproval,
}

/// The top-level flow to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// No session; render the unauthenticated flow.
    Unauthenticated,
    /// Waiting on restore or on the first entitlement result; render a
    /// loading indicator (prevents a flash of onboarding).
    Loading,
    /// Render the role-appropriate application flow.
    Application(Role),
    /// Render the subscription-onboarding flow at the given step.
    Onboarding(OnboardingStep),
}

/// Select the top-level flow for the current state.
///
/// Tie-breaks: a raised subscription-required flag always wins over a cached
/// `active` status (a 403 observed moments ago is stronger evidence than a
/// stale cache), and a `pending` status always wins over the default
/// package-selection entry step.
#[must_use]
pub fn decide(
    session: &SessionPhase,
    entitlement: &EntitlementState,
    subscription_required: bool,
) -> AccessDecision {
    let role = match session {
        SessionPhase::Unknown => return AccessDecision::Loading,
        SessionPhase::Unauthenticated => return AccessDecision::Unauthenticated,
        SessionPhase::Authenticated { user, .. } => user.role,
    };

    // Entitlement checking applies to parents only.
    if !role.requires_entitlement() {
        return AccessDecision::Application(role);
    }

    match entitlement {
        EntitlementState::Idle | EntitlementState::Loading => AccessDecision::Loading,
        EntitlementState::Ready(subscription)
            if subscription.status.is_active() && !subscription_required =>
        {
            AccessDecision::Application(Role::Parent)
        }
        EntitlementState::Ready(subscription) => {
            AccessDecision::Onboarding(initial_step(subscription.status))
        }
        EntitlementState::Failed => {
            AccessDecision::Onboarding(initial_step(SubscriptionStatus::Unknown))
        }
    }
}

const fn initial_step(status: SubscriptionStatus) -> OnboardingStep {
    match status {
        SubscriptionStatus::Pending => OnboardingStep::PendingApproval,
        _ => OnboardingStep::PackageSelection,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Subscription, User};
    use tutorhub_core::{Email, UserId};

    fn session(role: Role) -> SessionPhase {
        SessionPhase::Authenticated {
            user: User {
                id: UserId::new(1),
                name: "Test".to_owned(),
                email: Email::parse("test@example.com").unwrap(),
                role,
                phone: None,
                avatar: None,
                subscription_status: None,
            },
            token: "tok".to_owned(),
        }
    }

    fn ready(status: SubscriptionStatus) -> EntitlementState {
        EntitlementState::Ready(Subscription {
            status,
            ..Subscription::default()
        })
    }

    #[test]
    fn test_unauthenticated_session() {
        let decision = decide(&SessionPhase::Unauthenticated, &EntitlementState::Idle, false);
        assert_eq!(decision, AccessDecision::Unauthenticated);
    }

    #[test]
    fn test_pre_restore_is_loading() {
        let decision = decide(&SessionPhase::Unknown, &EntitlementState::Idle, false);
        assert_eq!(decision, AccessDecision::Loading);
    }

    #[test]
    fn test_non_parent_roles_bypass_entitlement() {
        for role in [Role::Tutor, Role::Student] {
            // Even a Failed entitlement state or a raised flag is irrelevant.
            let decision = decide(&session(role), &EntitlementState::Failed, true);
            assert_eq!(decision, AccessDecision::Application(role));
        }
    }

    #[test]
    fn test_parent_loading_before_first_result() {
        for state in [EntitlementState::Idle, EntitlementState::Loading] {
            let decision = decide(&session(Role::Parent), &state, false);
            assert_eq!(decision, AccessDecision::Loading);
        }
    }

    #[test]
    fn test_parent_active_renders_application() {
        let decision = decide(&session(Role::Parent), &ready(SubscriptionStatus::Active), false);
        assert_eq!(decision, AccessDecision::Application(Role::Parent));
    }

    #[test]
    fn test_flag_forces_onboarding_over_cached_active() {
        let decision = decide(&session(Role::Parent), &ready(SubscriptionStatus::Active), true);
        assert_eq!(
            decision,
            AccessDecision::Onboarding(OnboardingStep::PackageSelection)
        );
    }

    #[test]
    fn test_pending_status_selects_pending_step() {
        let decision = decide(&session(Role::Parent), &ready(SubscriptionStatus::Pending), false);
        assert_eq!(
            decision,
            AccessDecision::Onboarding(OnboardingStep::PendingApproval)
        );
    }

    #[test]
    fn test_pending_step_wins_even_with_flag_raised() {
        let decision = decide(&session(Role::Parent), &ready(SubscriptionStatus::Pending), true);
        assert_eq!(
            decision,
            AccessDecision::Onboarding(OnboardingStep::PendingApproval)
        );
    }

    #[test]
    fn test_non_active_statuses_select_package_selection() {
        for status in [
            SubscriptionStatus::Rejected,
            SubscriptionStatus::Expired,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Unknown,
        ] {
            let decision = decide(&session(Role::Parent), &ready(status), false);
            assert_eq!(
                decision,
                AccessDecision::Onboarding(OnboardingStep::PackageSelection)
            );
        }
    }

    #[test]
    fn test_failed_query_treated_as_no_subscription() {
        let decision = decide(&session(Role::Parent), &EntitlementState::Failed, false);
        assert_eq!(
            decision,
            AccessDecision::Onboarding(OnboardingStep::PackageSelection)
        );
    }
}
