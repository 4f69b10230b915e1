//! Single outbound request pipeline for the platform API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, NETWORK_UNREACHABLE_MESSAGE};
use crate::session::SessionStore;
use crate::subscription::SubscriptionStore;

use super::Envelope;

const LOGOUT_PATH: &str = "auth/logout";

/// Error body the platform sends on failure statuses.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    redirect_to: Option<String>,
}

impl ErrorBody {
    /// Whether a 403 carries the subscription marker, either in its message
    /// or in its redirect target.
    fn mentions_subscription(&self) -> bool {
        let marked = |s: &String| s.to_ascii_lowercase().contains("subscription");
        self.message.as_ref().is_some_and(marked) || self.redirect_to.as_ref().is_some_and(marked)
    }
}

struct GatewayInner {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    session: SessionStore,
    subscriptions: SubscriptionStore,
}

/// The platform API gateway.
///
/// This is the only path by which any component reaches the network. It
/// injects the bearer credential on every request, keeps JSON and multipart
/// bodies on distinct code paths, and classifies failure statuses into the
/// session and subscription signals of the error taxonomy. Classification is
/// side-effecting but never swallows the error: callers always receive a
/// failure they can act on locally. The one exception is documented on
/// [`Self::remote_logout`].
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<GatewayInner>,
}

impl ApiGateway {
    /// Create a gateway over the given stores.
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        subscriptions: SubscriptionStore,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                http: reqwest::Client::new(),
                base_url: config.api_base_url.clone(),
                request_timeout: config.request_timeout,
                session,
                subscriptions,
            }),
        }
    }

    /// GET an enveloped JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the failure taxonomy.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?;
        self.execute(request, path).await
    }

    /// POST a JSON body and decode an enveloped JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the failure taxonomy.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.execute(request, path).await
    }

    /// POST a multipart form (binary attachment) and decode an enveloped
    /// JSON payload.
    ///
    /// The form goes straight to reqwest so the transport generates the
    /// multipart boundary; it must never pass through JSON serialization.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] per the failure taxonomy.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path)?.multipart(form);
        self.execute(request, path).await
    }

    /// Best-effort remote logout.
    ///
    /// The caller is expected to clear local state regardless of the result;
    /// this is the one call whose failure may be logged and discarded.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] the caller may ignore.
    pub async fn remote_logout(&self) -> Result<(), ApiError> {
        let request = self.request(Method::POST, LOGOUT_PATH)?;
        let response = self.dispatch(request, LOGOUT_PATH).await?;
        let envelope: Envelope<serde_json::Value> = decode(response).await?;
        envelope.into_unit()
    }

    /// Build a request with credential injection and the configured timeout.
    ///
    /// Absence of a token means the request goes out unauthenticated; some
    /// endpoints accept that.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid endpoint path {path}: {e}")))?;

        let mut request = self
            .inner
            .http
            .request(method, url)
            .timeout(self.inner.request_timeout);

        if let Some(token) = self.inner.session.current().token() {
            request = request.bearer_auth(token);
        }

        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(request, path).await?;
        let envelope: Envelope<T> = decode(response).await?;
        envelope.into_result()
    }

    /// Send a request and classify the response status.
    ///
    /// Returns the response only for success statuses; failure statuses are
    /// converted (with their side effects) into an [`ApiError`].
    async fn dispatch(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|err| {
            tracing::warn!(error = %err, path, "transport failure");
            ApiError::Network(NETWORK_UNREACHABLE_MESSAGE.to_owned())
        })?;

        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            // Clear dependent state before the session flips so no reader
            // observes an unauthenticated session with stale entitlement.
            tracing::warn!(path, "credential rejected; invalidating stored session");
            self.inner.subscriptions.clear();
            self.inner.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();

        if status == StatusCode::FORBIDDEN {
            if body.mentions_subscription() {
                tracing::warn!(path, "subscription required; raising flag");
                self.inner.subscriptions.set_subscription_required(true);
                return Err(ApiError::SubscriptionRequired);
            }
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: body.message.unwrap_or_else(|| "forbidden".to_owned()),
            });
        }

        if status.is_client_error()
            && let Some(fields) = body.errors
        {
            return Err(ApiError::Validation {
                message: body
                    .message
                    .unwrap_or_else(|| "validation failed".to_owned()),
                fields,
            });
        }

        Err(ApiError::Server {
            status: status.as_u16(),
            message: body
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned()),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::UnexpectedShape(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_subscription_marker_in_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"An active Subscription is required"}"#).unwrap();
        assert!(body.mentions_subscription());
    }

    #[test]
    fn test_error_body_subscription_marker_in_redirect() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Forbidden","redirect_to":"/subscription/packages"}"#,
        )
        .unwrap();
        assert!(body.mentions_subscription());
    }

    #[test]
    fn test_error_body_without_marker() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"You cannot edit this class"}"#).unwrap();
        assert!(!body.mentions_subscription());
    }
}
