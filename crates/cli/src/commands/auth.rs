//! Session commands: login, status, logout.

#![allow(clippy::print_stdout)]

use tutorhub_client::{AccessDecision, ClientError};
use tutorhub_core::Role;

use super::client;

/// Sign in and persist the session.
pub async fn login(email: &str, password: &str) -> Result<(), ClientError> {
    let hub = client()?;

    let user = hub.login(email, password).await?;
    println!("Signed in as {} ({})", user.name, user.role);

    if user.role == Role::Parent {
        // Entitlement is re-derived from the network on every start; prime it
        // so `status` has something to show.
        if let Err(err) = hub.entitlements().refresh().await {
            tracing::warn!(error = %err, "entitlement check failed");
        }
    }

    print_decision(&hub.access_decision());
    Ok(())
}

/// Show the restored session and the access gate's decision.
pub async fn status() -> Result<(), ClientError> {
    let hub = client()?;

    match hub.session().current().user() {
        Some(user) => println!("Session: {} <{}> ({})", user.name, user.email, user.role),
        None => println!("Session: none"),
    }

    if hub.session().current().role() == Some(Role::Parent) {
        match hub.entitlements().refresh().await {
            Ok(Some(subscription)) => println!("Subscription: {}", subscription.status),
            Ok(None) => {}
            Err(err) => println!("Subscription: check failed ({err})"),
        }
    }

    print_decision(&hub.access_decision());
    Ok(())
}

/// Tear down the session.
pub async fn logout() -> Result<(), ClientError> {
    let hub = client()?;
    hub.logout().await;
    println!("Signed out");
    Ok(())
}

fn print_decision(decision: &AccessDecision) {
    match decision {
        AccessDecision::Unauthenticated => println!("Gate: sign-in required"),
        AccessDecision::Loading => println!("Gate: waiting on entitlement"),
        AccessDecision::Application(role) => println!("Gate: {role} application flow"),
        AccessDecision::Onboarding(step) => println!("Gate: onboarding ({step:?})"),
    }
}
