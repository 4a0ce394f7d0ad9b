use crate::{
    client::ApiClient,
    config::ClientConfig,
    session::{FileStore, RecordingNavigator, Session},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub base_url: String,
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub cookies: Vec<SecretString>,
    pub session_file: PathBuf,
    /// Route the guard sends users to when their role is not allowed.
    pub denied_route: String,
}

/// Client wired to the session file, plus the routes it asked to navigate to.
pub struct Connection {
    pub client: ApiClient,
    pub navigator: Arc<RecordingNavigator>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(base_url: String, session_file: PathBuf) -> Self {
        let defaults = ClientConfig::default();
        Self {
            base_url,
            timeout: defaults.timeout,
            settle_delay: defaults.settle_delay,
            cookies: Vec::new(),
            session_file,
            denied_route: defaults.denied_route,
        }
    }

    pub fn add_cookie(&mut self, cookie: SecretString) {
        self.cookies.push(cookie);
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
            .with_timeout(self.timeout)
            .with_settle_delay(self.settle_delay)
            .with_denied_route(self.denied_route.as_str())
    }

    #[must_use]
    pub fn session(&self, navigator: Arc<RecordingNavigator>) -> Session {
        let config = self.config();
        Session::with_navigator(
            Arc::new(FileStore::new(&self.session_file)),
            navigator,
            config.entry_route,
        )
    }

    /// Builds the API client and seeds its jar with the configured cookies.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built from the arguments.
    pub fn connect(&self) -> Result<Connection> {
        let navigator = Arc::new(RecordingNavigator::new());
        let session = self.session(Arc::clone(&navigator));
        let client = ApiClient::new(&self.config(), session)
            .with_context(|| format!("Could not create client for {}", self.base_url))?;

        for cookie in &self.cookies {
            client.add_cookie(cookie.expose_secret());
        }

        Ok(Connection { client, navigator })
    }
}
