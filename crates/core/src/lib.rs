//! TutorHub Core - Shared types library.
//!
//! This crate provides common types used across all TutorHub client components:
//! - `client` - The session and subscription access-control SDK
//! - `cli` - Command-line tool exercising the SDK flows
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the role
//!   and status enums the access-control logic branches on

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
