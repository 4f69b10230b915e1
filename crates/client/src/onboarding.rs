//! Subscription onboarding: package selection → payment → pending approval.
//!
//! A linear three-step flow with one exit edge: approval, detected by the
//! entitlement poll, hands control back to the access gate's decision rather
//! than to a fixed screen.

use std::sync::Arc;

use reqwest::multipart;
use thiserror::Error;

use crate::api::ApiGateway;
use crate::entitlement::{EntitlementClient, PollOutcome};
use crate::error::ApiError;
use crate::models::{Package, PendingPayment};
use crate::subscription::SubscriptionStore;

const PACKAGES_PATH: &str = "subscriptions/packages";
const PAYMENTS_PATH: &str = "subscriptions/payments";

/// Evidence filename extensions accepted by the platform.
const ALLOWED_EVIDENCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// Errors raised by the onboarding flow.
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// Payment was submitted without a selected package (e.g., direct
    /// navigation to the payment step). The caller should route back to
    /// package selection.
    #[error("select a package before submitting payment")]
    NoPackageSelected,

    /// API request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A payment-evidence attachment as captured from the device.
#[derive(Debug, Clone)]
pub struct PaymentEvidence {
    /// Filename as reported by the picker; normalized before transmission.
    pub file_name: String,
    /// Raw attachment bytes.
    pub bytes: Vec<u8>,
}

struct OnboardingInner {
    gateway: ApiGateway,
    subscriptions: SubscriptionStore,
    entitlements: EntitlementClient,
}

/// The subscription onboarding flow.
#[derive(Clone)]
pub struct OnboardingFlow {
    inner: Arc<OnboardingInner>,
}

impl OnboardingFlow {
    /// Create the flow over the given collaborators.
    #[must_use]
    pub fn new(
        gateway: ApiGateway,
        subscriptions: SubscriptionStore,
        entitlements: EntitlementClient,
    ) -> Self {
        Self {
            inner: Arc::new(OnboardingInner {
                gateway,
                subscriptions,
                entitlements,
            }),
        }
    }

    /// List the packages available for purchase.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the failure taxonomy.
    pub async fn list_packages(&self) -> Result<Vec<Package>, ApiError> {
        let packages: Vec<Package> = self.inner.gateway.get_json(PACKAGES_PATH).await?;
        Ok(packages.into_iter().filter(|p| p.active).collect())
    }

    /// Record the chosen package for the payment step.
    pub fn select_package(&self, package: Package) {
        self.inner.subscriptions.set_selected_package(Some(package));
    }

    /// Submit payment evidence for the selected package.
    ///
    /// The evidence filename is normalized to an accepted extension (default
    /// `.jpg`) and `package_id` is always transmitted as a string field. On
    /// success the selected package is cleared and the subscription record
    /// flips to pending; on failure no state is committed and the caller
    /// stays on the payment step.
    ///
    /// # Errors
    ///
    /// Returns [`OnboardingError::NoPackageSelected`] if no package is
    /// selected, otherwise any [`ApiError`] from the submission.
    pub async fn submit_payment(
        &self,
        evidence: PaymentEvidence,
    ) -> Result<PendingPayment, OnboardingError> {
        let Some(package) = self.inner.subscriptions.selected_package() else {
            return Err(OnboardingError::NoPackageSelected);
        };

        let file_name = normalize_evidence_filename(&evidence.file_name);
        let part = multipart::Part::bytes(evidence.bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for(&file_name))
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let form = multipart::Form::new()
            .text("package_id", package.id.to_string())
            .part("payment_slip", part);

        let payment: PendingPayment = self.inner.gateway.post_multipart(PAYMENTS_PATH, form).await?;

        self.inner.subscriptions.set_selected_package(None);
        self.inner.subscriptions.record_pending_payment(payment.clone());

        Ok(payment)
    }

    /// Poll the entitlement query until the pending payment is approved.
    ///
    /// On approval the subscription-required flag is cleared before this
    /// returns, so the access gate's next decision renders the parent
    /// application flow.
    pub async fn await_approval(&self) -> PollOutcome {
        let subscriptions = self.inner.subscriptions.clone();
        self.inner
            .entitlements
            .poll_until_active(move || subscriptions.set_subscription_required(false))
            .await
    }

    /// Explicitly dismiss onboarding, clearing the flag and any selection.
    pub fn dismiss(&self) {
        self.inner.subscriptions.set_subscription_required(false);
        self.inner.subscriptions.set_selected_package(None);
    }
}

/// Normalize an evidence filename to an accepted extension.
///
/// Extensions are lowercased; anything outside the accepted set (including a
/// missing extension) becomes `.jpg`. A name with no usable stem falls back
/// to `payment_slip.jpg`.
fn normalize_evidence_filename(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.trim_start_matches('.').is_empty() => {
            let ext = ext.to_ascii_lowercase();
            if ALLOWED_EVIDENCE_EXTENSIONS.contains(&ext.as_str()) {
                format!("{stem}.{ext}")
            } else {
                format!("{stem}.jpg")
            }
        }
        _ => {
            let stem = name.trim_start_matches('.');
            if stem.is_empty() {
                "payment_slip.jpg".to_owned()
            } else {
                format!("{stem}.jpg")
            }
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".png") {
        "image/png"
    } else if file_name.ends_with(".pdf") {
        "application/pdf"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extensions_are_kept_and_lowercased() {
        assert_eq!(normalize_evidence_filename("slip.jpg"), "slip.jpg");
        assert_eq!(normalize_evidence_filename("slip.JPEG"), "slip.jpeg");
        assert_eq!(normalize_evidence_filename("slip.PNG"), "slip.png");
        assert_eq!(normalize_evidence_filename("receipt.pdf"), "receipt.pdf");
    }

    #[test]
    fn test_unaccepted_extension_becomes_jpg() {
        assert_eq!(normalize_evidence_filename("photo.heic"), "photo.jpg");
        assert_eq!(normalize_evidence_filename("scan.webp"), "scan.jpg");
    }

    #[test]
    fn test_missing_extension_becomes_jpg() {
        assert_eq!(normalize_evidence_filename("slip"), "slip.jpg");
    }

    #[test]
    fn test_dotfile_name_is_handled() {
        assert_eq!(normalize_evidence_filename(".png"), "png.jpg");
    }

    #[test]
    fn test_empty_name_gets_a_default_stem() {
        assert_eq!(normalize_evidence_filename(""), "payment_slip.jpg");
        assert_eq!(normalize_evidence_filename("."), "payment_slip.jpg");
        assert_eq!(normalize_evidence_filename(".."), "payment_slip.jpg");
    }

    #[test]
    fn test_mime_follows_normalized_extension() {
        assert_eq!(mime_for("slip.png"), "image/png");
        assert_eq!(mime_for("slip.pdf"), "application/pdf");
        assert_eq!(mime_for("slip.jpg"), "image/jpeg");
        assert_eq!(mime_for("slip.jpeg"), "image/jpeg");
    }
}
