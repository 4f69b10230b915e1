//! End-to-end session and access-gate scenarios against the mock platform.

#![allow(clippy::unwrap_used)]

use tutorhub_client::{
    AccessDecision, ApiError, ClientError, EntitlementState, OnboardingStep, SessionPhase,
    SubscriptionSnapshot,
};
use tutorhub_core::Role;
use tutorhub_integration_tests::MockPlatform;

#[tokio::test]
async fn test_login_then_restart_restores_the_session() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);

    let (hub, storage) = platform.client();
    hub.restore().unwrap();
    let user = hub.login("dana@example.com", "pw").await.unwrap();
    assert_eq!(user.role, Role::Parent);
    assert!(hub.session().current().is_authenticated());

    // Same storage, fresh process state.
    let restarted = platform.client_over(storage);
    let phase = restarted.restore().unwrap();
    assert!(phase.is_authenticated());
    assert_eq!(phase.user().unwrap().email.as_str(), "dana@example.com");
    assert_eq!(phase.role(), Some(Role::Parent));
}

#[tokio::test]
async fn test_rejected_credentials_leave_no_session() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);

    let (hub, storage) = platform.client();
    hub.restore().unwrap();

    let err = hub.login("dana@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Unauthorized)));
    assert!(!hub.session().current().is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_admin_login_never_holds_a_session() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Root", "admin@example.com", "pw", Role::Admin);

    let (hub, storage) = platform.client();
    hub.restore().unwrap();

    let err = hub.login("admin@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::Session(_)));
    assert!(storage.is_empty());
    assert!(matches!(hub.access_decision(), AccessDecision::Unauthenticated));
}

#[tokio::test]
async fn test_non_parent_roles_skip_the_entitlement_check() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Sam", "sam@example.com", "pw", Role::Tutor);

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("sam@example.com", "pw").await.unwrap();

    let result = hub.entitlements().refresh().await.unwrap();
    assert!(result.is_none());
    assert_eq!(platform.entitlement_fetches(), 0);
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Tutor)
    ));
}

#[tokio::test]
async fn test_gate_is_loading_before_the_first_entitlement_resolve() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();

    assert!(matches!(hub.access_decision(), AccessDecision::Loading));
}

#[tokio::test]
async fn test_pending_subscription_routes_to_pending_approval() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    platform.set_entitlement_status("pending");

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub.entitlements().refresh().await.unwrap();

    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Onboarding(OnboardingStep::PendingApproval)
    ));
}

#[tokio::test]
async fn test_active_subscription_routes_to_the_application() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    platform.set_entitlement_status("active");

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub.entitlements().refresh().await.unwrap();

    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Parent)
    ));
}

#[tokio::test]
async fn test_subscription_marked_403_overrides_a_cached_active_status() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    platform.set_entitlement_status("active");

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub.entitlements().refresh().await.unwrap();
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Parent)
    ));

    // The server decides access lapsed before the client's cache did.
    platform.forbid_classes();
    let err = hub
        .gateway()
        .get_json::<serde_json::Value>("classes")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SubscriptionRequired));

    assert!(hub.subscriptions().subscription_required());
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Onboarding(OnboardingStep::PackageSelection)
    ));
}

#[tokio::test]
async fn test_revoked_credential_tears_the_session_down() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);

    let (hub, storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();

    platform.revoke_tokens();
    let err = hub.entitlements().refresh().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    assert_eq!(hub.session().current(), SessionPhase::Unauthenticated);
    assert!(storage.is_empty());
    assert_eq!(hub.subscriptions().current(), SubscriptionSnapshot::default());
    assert_eq!(hub.subscriptions().entitlement(), EntitlementState::Idle);
    assert!(matches!(hub.access_decision(), AccessDecision::Unauthenticated));
}

#[tokio::test]
async fn test_second_login_starts_with_a_fresh_entitlement() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    platform.add_account("Evan", "evan@example.com", "pw", Role::Parent);
    platform.set_entitlement_status("active");

    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub.entitlements().refresh().await.unwrap();
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Parent)
    ));

    hub.logout().await;
    hub.login("evan@example.com", "pw").await.unwrap();

    // The previous session's resolved standing must not leak into the new
    // session: the gate waits on a fresh fetch.
    assert_eq!(hub.subscriptions().entitlement(), EntitlementState::Idle);
    assert!(matches!(hub.access_decision(), AccessDecision::Loading));

    hub.entitlements().refresh().await.unwrap();
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Parent)
    ));
    assert_eq!(platform.entitlement_fetches(), 2);
}

#[tokio::test]
async fn test_logout_clears_local_state_even_when_the_server_errors() {
    let platform = MockPlatform::spawn().await;
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    platform.set_entitlement_status("active");

    let (hub, storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub.entitlements().refresh().await.unwrap();

    platform.fail_logout();
    hub.logout().await;

    assert_eq!(hub.session().current(), SessionPhase::Unauthenticated);
    assert!(storage.is_empty());
    assert_eq!(hub.subscriptions().current(), SubscriptionSnapshot::default());
    assert!(matches!(hub.access_decision(), AccessDecision::Unauthenticated));
}
