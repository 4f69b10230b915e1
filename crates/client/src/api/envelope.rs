//! Response envelope normalization.
//!
//! Every platform response follows `{ success: bool, data: T, message? }`.
//! Normalization is explicit and per-endpoint: a response that does not match
//! the declared shape fails loudly with `UnexpectedShape` instead of being
//! sniffed for `data` vs `data.data` variants at each call site.

use serde::Deserialize;

use crate::error::ApiError;

/// The platform's standard response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Normalize the envelope into its payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the envelope reports failure, or
    /// [`ApiError::UnexpectedShape`] if a successful envelope carries no
    /// `data` field.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_owned()),
            ));
        }

        self.data
            .ok_or_else(|| ApiError::UnexpectedShape("missing data field".to_owned()))
    }

    /// Normalize an envelope whose payload is irrelevant (e.g., logout).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the envelope reports failure.
    pub fn into_unit(self) -> Result<(), ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_owned()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_envelope_yields_data() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"success":true,"data":7}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), 7);
    }

    #[test]
    fn test_failed_envelope_surfaces_message() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(msg) if msg == "nope"));
    }

    #[test]
    fn test_success_without_data_fails_loudly() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(
            envelope.into_result(),
            Err(ApiError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_unit_envelope_ignores_payload() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(envelope.into_unit().is_ok());
    }
}
