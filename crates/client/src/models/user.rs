//! User domain types.

use serde::{Deserialize, Serialize};

use tutorhub_core::{Email, Role, SubscriptionStatus, UserId};

/// A platform user as returned by the login and profile endpoints.
///
/// This is also the shape serialized into durable storage under the `user`
/// key, so a restored session carries the same record the login returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Email,
    /// Platform role. Immutable for the lifetime of a session.
    pub role: Role,
    /// Contact phone number, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar image URL, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Last-known subscription standing denormalized onto the user record.
    ///
    /// The entitlement endpoint's own status field wins; this is only the
    /// fallback for the narrow window right after an admin approval when the
    /// two fields can legitimately disagree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
}
