//! Platform API gateway.
//!
//! The gateway is the only path by which any other component reaches the
//! network: it injects the bearer credential, keeps JSON and multipart
//! payloads on distinct code paths, and classifies failures into the session
//! and subscription signals described in [`crate::error::ApiError`].

mod envelope;
mod gateway;

pub use envelope::Envelope;
pub use gateway::ApiGateway;
