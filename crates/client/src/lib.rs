//! TutorHub Client - Session and subscription access-control SDK.
//!
//! The SDK implements the core every screen of the TutorHub apps depends on
//! indirectly: it persists and restores the authentication session across
//! restarts, determines whether a parent holds an active paid subscription,
//! and gates navigation between the application flows and the
//! subscription-onboarding flow.
//!
//! # Architecture
//!
//! - [`api::ApiGateway`] - the single outbound request pipeline; injects the
//!   bearer credential and classifies failures into session and subscription
//!   signals
//! - [`session::SessionStore`] - process-wide reactive session state backed
//!   by durable storage
//! - [`subscription::SubscriptionStore`] - process-wide reactive subscription
//!   state: the entitlement query's observable state, the selected package,
//!   and the subscription-required flag
//! - [`entitlement::EntitlementClient`] - gated, cached, de-duplicated,
//!   pollable "my subscription" query
//! - [`gate`] - the pure decision function selecting the top-level flow
//! - [`onboarding::OnboardingFlow`] - package selection, payment-evidence
//!   submission, pending-approval polling
//!
//! # Example
//!
//! ```rust,ignore
//! use tutorhub_client::{ClientConfig, TutorHub};
//!
//! let config = ClientConfig::from_env()?;
//! let client = TutorHub::new(config)?;
//!
//! client.restore()?;
//! match client.access_decision() {
//!     AccessDecision::Unauthenticated => show_login(),
//!     AccessDecision::Loading => show_spinner(),
//!     AccessDecision::Application(role) => show_app(role),
//!     AccessDecision::Onboarding(step) => show_onboarding(step),
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod gate;
pub mod models;
pub mod onboarding;
pub mod session;
pub mod storage;
pub mod subscription;

pub use client::TutorHub;
pub use config::ClientConfig;
pub use entitlement::{EntitlementClient, EntitlementState, PollOutcome};
pub use error::{ApiError, ClientError};
pub use gate::{AccessDecision, OnboardingStep};
pub use onboarding::{OnboardingError, OnboardingFlow, PaymentEvidence};
pub use session::{SessionPhase, SessionStore};
pub use subscription::{SubscriptionSnapshot, SubscriptionStore};
