//! End-to-end onboarding scenarios: packages, payment submission, approval.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tutorhub_client::{
    AccessDecision, OnboardingError, OnboardingStep, PaymentEvidence, PollOutcome, TutorHub,
};
use tutorhub_core::{PackageId, PaymentStatus, Role, SubscriptionStatus};
use tutorhub_integration_tests::MockPlatform;

async fn parent_client(platform: &MockPlatform) -> TutorHub {
    platform.add_account("Dana", "dana@example.com", "pw", Role::Parent);
    let (hub, _storage) = platform.client();
    hub.restore().unwrap();
    hub.login("dana@example.com", "pw").await.unwrap();
    hub
}

#[tokio::test]
async fn test_inactive_packages_are_filtered_out() {
    let platform = MockPlatform::spawn().await;
    let hub = parent_client(&platform).await;

    let packages = hub.onboarding().list_packages().await.unwrap();
    assert_eq!(packages.len(), 2);
    assert!(packages.iter().all(|p| p.active));
    assert!(packages.iter().any(|p| p.name == "Starter"));
    assert!(packages.iter().any(|p| p.name == "Family"));
}

#[tokio::test]
async fn test_payment_submission_without_a_selection_is_rejected() {
    let platform = MockPlatform::spawn().await;
    let hub = parent_client(&platform).await;

    let err = hub
        .onboarding()
        .submit_payment(PaymentEvidence {
            file_name: "slip.jpg".to_owned(),
            bytes: vec![0xFF, 0xD8],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OnboardingError::NoPackageSelected));
    assert!(platform.received_payment().is_none());
}

#[tokio::test]
async fn test_payment_slip_is_normalized_and_package_id_sent_as_string() {
    let platform = MockPlatform::spawn().await;
    let hub = parent_client(&platform).await;

    let packages = hub.onboarding().list_packages().await.unwrap();
    let family = packages.into_iter().find(|p| p.name == "Family").unwrap();
    assert_eq!(family.id, PackageId::new(2));
    hub.onboarding().select_package(family);

    let payment = hub
        .onboarding()
        .submit_payment(PaymentEvidence {
            file_name: "slip.HEIC".to_owned(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        })
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.package_id, PackageId::new(2));

    let received = platform.received_payment().unwrap();
    assert_eq!(received.package_id.as_deref(), Some("2"));
    assert_eq!(received.file_name.as_deref(), Some("slip.jpg"));
    assert_eq!(received.content_type.as_deref(), Some("image/jpeg"));

    // Success commits: selection cleared, record flipped to pending.
    assert!(hub.subscriptions().selected_package().is_none());
    assert_eq!(hub.subscriptions().status(), SubscriptionStatus::Pending);
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Onboarding(OnboardingStep::PendingApproval)
    ));
}

#[tokio::test]
async fn test_approval_poll_clears_the_flag_and_stops_fetching() {
    let platform = MockPlatform::spawn().await;
    platform.set_entitlement_status("pending");
    let hub = parent_client(&platform).await;

    hub.entitlements().refresh().await.unwrap();
    hub.subscriptions().set_subscription_required(true);
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Onboarding(OnboardingStep::PendingApproval)
    ));

    tokio::spawn({
        let platform = platform.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            platform.set_entitlement_status("active");
        }
    });

    let outcome = hub.onboarding().await_approval().await;
    assert_eq!(outcome, PollOutcome::Approved);

    assert!(!hub.subscriptions().subscription_required());
    assert_eq!(hub.subscriptions().status(), SubscriptionStatus::Active);
    assert!(matches!(
        hub.access_decision(),
        AccessDecision::Application(Role::Parent)
    ));

    // The loop stopped: no further entitlement traffic after approval.
    let fetches = platform.entitlement_fetches();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(platform.entitlement_fetches(), fetches);
}

#[tokio::test]
async fn test_approval_poll_stops_when_the_session_ends() {
    let platform = MockPlatform::spawn().await;
    platform.set_entitlement_status("pending");
    let hub = parent_client(&platform).await;
    hub.entitlements().refresh().await.unwrap();

    tokio::spawn({
        let session = hub.session().clone();
        let gateway = hub.gateway().clone();
        let subscriptions = hub.subscriptions().clone();
        async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            session.logout(&gateway, &subscriptions).await;
        }
    });

    let outcome = hub.onboarding().await_approval().await;
    assert_eq!(outcome, PollOutcome::SessionEnded);
    assert!(!hub.session().current().is_authenticated());
}
