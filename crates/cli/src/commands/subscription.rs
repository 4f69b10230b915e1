//! Subscription commands: packages, subscribe, watch.

#![allow(clippy::print_stdout)]

use std::path::Path;

use tutorhub_client::{PaymentEvidence, PollOutcome};
use tutorhub_core::PackageId;

use super::client;

/// Errors specific to the subscription commands.
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("package {0} is not available")]
    UnknownPackage(i64),
    #[error("could not read payment slip {0}")]
    UnreadableSlip(String),
}

/// List subscription packages available for purchase.
pub async fn packages() -> Result<(), Box<dyn std::error::Error>> {
    let hub = client()?;

    let packages = hub.onboarding().list_packages().await?;
    if packages.is_empty() {
        println!("No packages available");
        return Ok(());
    }

    for package in packages {
        println!(
            "{:>4}  {:<24} {:>8.2}  up to {} students{}",
            package.id,
            package.name,
            package.price,
            package.student_limit,
            if package.allows_one_on_one {
                ", 1:1 classes"
            } else {
                ""
            }
        );
    }
    Ok(())
}

/// Submit a payment slip for a package.
pub async fn subscribe(package_id: i64, slip: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let hub = client()?;

    let packages = hub.onboarding().list_packages().await?;
    let package = packages
        .into_iter()
        .find(|p| p.id == PackageId::new(package_id))
        .ok_or(SubscribeError::UnknownPackage(package_id))?;

    println!("Subscribing to {} ({:.2})", package.name, package.price);
    hub.onboarding().select_package(package);

    let bytes = std::fs::read(slip)
        .map_err(|_| SubscribeError::UnreadableSlip(slip.display().to_string()))?;
    let file_name = slip
        .file_name()
        .map_or_else(|| "payment_slip".to_owned(), |n| n.to_string_lossy().into_owned());

    let payment = hub
        .onboarding()
        .submit_payment(PaymentEvidence { file_name, bytes })
        .await?;

    println!(
        "Payment {} submitted ({}); awaiting admin approval",
        payment.id, payment.status
    );
    Ok(())
}

/// Poll the pending payment until it is approved.
pub async fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let hub = client()?;

    println!("Waiting for approval (polling every {:?})", hub.config().poll_interval);
    match hub.onboarding().await_approval().await {
        PollOutcome::Approved => println!("Subscription approved"),
        PollOutcome::SessionEnded => println!("Session ended before approval"),
    }
    Ok(())
}
