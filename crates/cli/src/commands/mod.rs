//! CLI command implementations.

pub mod auth;
pub mod subscription;

use tutorhub_client::{ClientConfig, ClientError, TutorHub};

/// Build a client from the environment and restore any persisted session.
pub fn client() -> Result<TutorHub, ClientError> {
    let config = ClientConfig::from_env()?;
    let hub = TutorHub::new(config)?;
    hub.restore()?;
    Ok(hub)
}
