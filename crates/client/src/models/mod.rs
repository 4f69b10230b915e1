//! Wire models for the platform API.
//!
//! These types mirror the JSON shapes the platform actually sends; field
//! renames stay at this boundary so the rest of the SDK works with typed data.

mod subscription;
mod user;

pub use subscription::{
    EntitlementData, Package, PackageLimits, PendingPayment, Subscription,
};
pub use user::User;
