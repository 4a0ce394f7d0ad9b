//! Resilient request client for the admin backend.
//!
//! Every call carries the session cookies from the client's jar. When a business
//! endpoint answers 401 the access cookie is assumed expired: the client joins or
//! starts the single shared refresh, waits for the new cookie to settle and sends
//! the original request once more. Auth-flow endpoints (verify, refresh, OTP) are
//! never recovered this way; their 401 ends the session. The client never reads
//! cookie contents, it only reacts to status codes.

pub mod endpoints;
mod error;
mod refresh;
mod request;
mod single_flight;

pub use error::ClientError;
pub use refresh::RefreshOutcome;
pub use request::{ApiRequest, ApiResponse};
pub use single_flight::SingleFlight;

use crate::{config::ClientConfig, session::Session, APP_USER_AGENT};
use error::sanitize_body;
use reqwest::{
    cookie::Jar,
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt, sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

/// Cloneable handle; clones share the cookie jar and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    refresh_url: Url,
    settle_delay: Duration,
    session: Session,
    refresh: SingleFlight<RefreshOutcome>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("settle_delay", &self.inner.settle_delay)
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client with its own cookie jar and refresh state.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|err| ClientError::Config(format!("invalid base URL: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "invalid base URL: {}",
                config.base_url
            )));
        }
        let refresh_url = join_url(&base_url, endpoints::REFRESH_PATH)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                jar,
                base_url,
                refresh_url,
                settle_delay: config.settle_delay,
                session,
                refresh: SingleFlight::new(),
            }),
        })
    }

    /// Seeds the jar with a `Set-Cookie` style value scoped to the backend.
    pub fn add_cookie(&self, cookie: &str) {
        self.inner.jar.add_cookie_str(cookie, &self.inner.base_url);
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// True while a refresh started by this client (or a clone) is unresolved.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_in_flight()
    }

    /// Sends `request`, recovering once from an expired access cookie.
    ///
    /// # Errors
    /// Returns the transport error, the auth-flow error, or the non-success status
    /// of the final attempt. When a refresh fails the original 401 is returned.
    #[instrument(
        skip(self, request),
        fields(request_id = %request.id(), method = %request.method, path = %request.path)
    )]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let response = self.dispatch(&request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return finish(response);
        }

        if endpoints::is_auth_flow(&request.path) {
            warn!("auth flow endpoint answered 401");
            self.inner.session.expire();
            return Err(ClientError::AuthFlow {
                path: request.path,
                message: sanitize_body(&response.text()),
            });
        }

        let original = ClientError::http(response.status.as_u16(), &response.text());
        if request.is_retried() {
            debug!("401 after retry, giving up");
            return Err(original);
        }

        let request = request.mark_retried();
        let outcome = self.refresh().await;
        if !outcome.is_refreshed() {
            debug!("refresh failed: {outcome:?}");
            self.inner.session.expire();
            return Err(original);
        }

        sleep(self.inner.settle_delay).await;
        debug!("replaying request after refresh");
        let replay = self.dispatch(&request).await?;
        finish(replay)
    }

    /// Starts the shared refresh, or waits for the one already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        let http = self.inner.http.clone();
        let url = self.inner.refresh_url.clone();
        let session = self.inner.session.clone();

        self.inner
            .refresh
            .run(move || refresh::refresh_token(http, url, session))
            .await
            .unwrap_or_else(|| RefreshOutcome::Unreachable("refresh task aborted".to_string()))
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body does not decode.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body to `path` and decode the JSON response.
    ///
    /// # Errors
    /// Returns an error if the body cannot be encoded, the request fails, or the
    /// response does not decode.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = join_url(&self.inner.base_url, &request.path)?;

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(status = status.as_u16(), retried = request.is_retried(), "response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

fn finish(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::http(response.status.as_u16(), &response.text()))
    }
}

/// Joins a backend path (which may carry its own query string) onto the base URL.
fn join_url(base: &Url, path: &str) -> Result<Url, ClientError> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim();
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    };

    Url::parse(&joined).map_err(|err| ClientError::Config(format!("invalid path {path}: {err}")))
}
