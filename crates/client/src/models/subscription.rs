//! Subscription, package, and payment wire models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{ClassId, PackageId, PaymentId, PaymentStatus, SubscriptionStatus};

/// A purchasable subscription package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Monthly price in the platform currency. Display only; the client never
    /// computes with it.
    pub price: f64,
    pub student_limit: u32,
    pub allows_one_on_one: bool,
    #[serde(default)]
    pub active: bool,
}

/// Usage limits attached to an active subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageLimits {
    pub student_limit: u32,
    pub allows_one_on_one: bool,
    #[serde(default)]
    pub classes: Vec<ClassId>,
}

/// A payment submission awaiting admin review.
///
/// Created client-side from a successful payment submission; superseded once
/// the entitlement query reports `active` or `rejected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub id: PaymentId,
    pub package_id: PackageId,
    pub amount: f64,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The parent's subscription standing as known by this client.
///
/// `status` is `Unknown` until the entitlement query resolves at least once.
/// Always re-derived from the network on startup; never trusted from cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Package>,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<PackageLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_payment: Option<PendingPayment>,
}

/// Raw payload of the "my subscription" endpoint.
///
/// `status` is optional on the wire: right after an admin approval the
/// endpoint can briefly omit it while the user record already carries the
/// updated standing, so the merge falls back to that last-known value.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementData {
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub package: Option<Package>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub limits: Option<PackageLimits>,
    #[serde(default)]
    pub pending_payment: Option<PendingPayment>,
}

impl EntitlementData {
    /// Merge the response into a [`Subscription`], deriving `status` from the
    /// response itself and falling back to the user record's last-known
    /// standing only if the response omits it.
    #[must_use]
    pub fn into_subscription(self, last_known: Option<SubscriptionStatus>) -> Subscription {
        Subscription {
            status: self.status.or(last_known).unwrap_or_default(),
            package: self.package,
            approved_at: self.approved_at,
            student_count: self.student_count,
            limits: self.limits,
            pending_payment: self.pending_payment,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data(status: Option<SubscriptionStatus>) -> EntitlementData {
        EntitlementData {
            status,
            package: None,
            approved_at: None,
            student_count: 2,
            limits: None,
            pending_payment: None,
        }
    }

    #[test]
    fn test_merge_prefers_response_status() {
        let sub = data(Some(SubscriptionStatus::Pending))
            .into_subscription(Some(SubscriptionStatus::Active));
        assert_eq!(sub.status, SubscriptionStatus::Pending);
    }

    #[test]
    fn test_merge_falls_back_to_last_known() {
        let sub = data(None).into_subscription(Some(SubscriptionStatus::Active));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_merge_defaults_to_unknown() {
        let sub = data(None).into_subscription(None);
        assert_eq!(sub.status, SubscriptionStatus::Unknown);
    }

    #[test]
    fn test_deserialize_entitlement_payload() {
        let json = r#"{
            "status": "pending",
            "student_count": 1,
            "pending_payment": {
                "id": 11,
                "package_id": 4,
                "amount": 49.0,
                "status": "pending",
                "evidence_url": "https://cdn.example.com/slips/11.jpg",
                "created_at": "2026-08-01T10:00:00Z"
            }
        }"#;
        let data: EntitlementData = serde_json::from_str(json).unwrap();
        let sub = data.into_subscription(None);
        assert_eq!(sub.status, SubscriptionStatus::Pending);
        let payment = sub.pending_payment.unwrap();
        assert_eq!(payment.package_id, PackageId::new(4));
        assert_eq!(payment.status, PaymentStatus::Pending);
    }
}
