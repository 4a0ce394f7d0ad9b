use crate::session::Session;
use reqwest::{Client, StatusCode};
use tracing::{info, instrument, warn};
use url::Url;

/// Result of one call to the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// HTTP 200; the backend has set a new access cookie.
    Refreshed,
    /// Any other status.
    Rejected(u16),
    /// No response.
    Unreachable(String),
}

impl RefreshOutcome {
    #[must_use]
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed)
    }
}

/// Asks the backend for a new access cookie. The refresh cookie already in the
/// jar identifies the user, so the body is empty. Any outcome other than 200
/// ends the local session.
#[instrument(skip(http, session), fields(url = %url))]
pub(crate) async fn refresh_token(http: Client, url: Url, session: Session) -> RefreshOutcome {
    let outcome = match http.post(url).body("").send().await {
        Ok(response) if response.status() == StatusCode::OK => RefreshOutcome::Refreshed,
        Ok(response) => RefreshOutcome::Rejected(response.status().as_u16()),
        Err(err) => RefreshOutcome::Unreachable(err.to_string()),
    };

    match &outcome {
        RefreshOutcome::Refreshed => info!("access cookie refreshed"),
        RefreshOutcome::Rejected(status) => {
            warn!("refresh rejected with status {status}");
            session.expire();
        }
        RefreshOutcome::Unreachable(err) => {
            warn!("refresh endpoint unreachable: {err}");
            session.expire();
        }
    }

    outcome
}
