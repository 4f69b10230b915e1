//! Unified error handling for the client SDK.
//!
//! The failure taxonomy mirrors what the platform API can actually report:
//! invalid session (401), entitlement required (403 with a subscription
//! marker), field-level validation errors, transport failures, and everything
//! else. The gateway performs its classification side effects and then always
//! re-raises one of these variants; no component swallows an error without
//! updating shared state.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// User-legible message for transport-level failures.
///
/// Every "no response received" failure is normalized to this message before
/// being re-raised, so screens never surface raw socket errors.
pub const NETWORK_UNREACHABLE_MESSAGE: &str =
    "Network unreachable. Please check your connection and try again.";

/// Errors raised by the API gateway.
///
/// `Clone` is derived so results can be shared through the entitlement cache
/// without losing the variant.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport failure: no response was received from the platform.
    #[error("{0}")]
    Network(String),

    /// The session credential was rejected (HTTP 401). The gateway has
    /// already wiped the stored credential and flipped the session store.
    #[error("invalid or expired session")]
    Unauthorized,

    /// The platform requires an active subscription (HTTP 403 with a
    /// subscription marker). The gateway has already raised the
    /// subscription-required flag.
    #[error("an active subscription is required")]
    SubscriptionRequired,

    /// A form-level validation failure (4xx with field errors). Never touches
    /// global state; surfaced to the originating form.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Any other HTTP failure status.
    #[error("request failed ({status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose envelope reported `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The response did not match the documented envelope shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The request could not be constructed (bad path or attachment).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Top-level error type for the SDK facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// API request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Durable storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for the SDK facade.
pub type Result<T> = std::result::Result<T, ClientError>;
