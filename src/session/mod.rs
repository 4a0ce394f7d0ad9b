//! Local session state: the cached user record, its store, and the navigation sink
//! used when the session has to end. Credentials themselves stay in the HTTP
//! client's cookie jar and never pass through here.

mod guard;
mod navigator;
mod store;
mod user;

pub use guard::{GuardOptions, GuardState, RoleRequirement, SessionGuard, VerifyScope};
pub use navigator::{Navigator, RecordingNavigator};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
pub use user::UserRecord;

use crate::config::DEFAULT_ENTRY_ROUTE;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use tracing::{error, warn};

/// Store key holding the serialized [`UserRecord`].
pub const USER_KEY: &str = "user";

/// Shared handle over the session store and navigator. Clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    navigator: Option<Arc<dyn Navigator>>,
    entry_route: String,
    // set by the first expiry, cleared when a new user record is saved
    expired: AtomicBool,
    navigations: AtomicUsize,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("entry_route", &self.inner.entry_route)
            .field("navigator", &self.inner.navigator.is_some())
            .field("expired", &self.inner.expired.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Headless session: state is cleared on expiry but nothing navigates.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::build(store, None, DEFAULT_ENTRY_ROUTE.to_string())
    }

    /// Session attached to a navigator, redirecting to `entry_route` on expiry.
    #[must_use]
    pub fn with_navigator(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        entry_route: impl Into<String>,
    ) -> Self {
        Self::build(store, Some(navigator), entry_route.into())
    }

    fn build(
        store: Arc<dyn SessionStore>,
        navigator: Option<Arc<dyn Navigator>>,
        entry_route: String,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                navigator,
                entry_route,
                expired: AtomicBool::new(false),
                navigations: AtomicUsize::new(0),
            }),
        }
    }

    #[must_use]
    pub fn entry_route(&self) -> &str {
        &self.inner.entry_route
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.inner.expired.load(Ordering::SeqCst)
    }

    /// Reads the cached user record. A record that no longer parses is treated as
    /// absent.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn user(&self) -> Result<Option<UserRecord>, StoreError> {
        let Some(raw) = self.inner.store.get(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!("ignoring unreadable cached user record: {err}");
                Ok(None)
            }
        }
    }

    /// Caches the user record and re-arms expiry handling.
    ///
    /// # Errors
    /// Returns an error if the record cannot be serialized or stored.
    pub fn save_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)?;
        self.inner.store.set(USER_KEY, &raw)?;
        self.inner.expired.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Removes the cached user record without navigating.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn clear_user(&self) -> Result<(), StoreError> {
        self.inner.store.remove(USER_KEY)
    }

    /// Ends the local session: drops the cached record and sends the user to the
    /// entry route. Safe to call any number of times from any task; only the first
    /// call after a login navigates.
    pub fn expire(&self) {
        if let Err(err) = self.clear_user() {
            error!("failed to clear cached user record: {err}");
        }

        if self.inner.expired.swap(true, Ordering::SeqCst) {
            return;
        }

        warn!("session expired, redirecting to {}", self.inner.entry_route);
        self.redirect(&self.inner.entry_route);
    }

    /// Navigates when a navigator is attached; headless sessions ignore it.
    pub fn redirect(&self, route: &str) {
        if let Some(navigator) = &self.inner.navigator {
            self.inner.navigations.fetch_add(1, Ordering::SeqCst);
            navigator.redirect(route);
        }
    }

    /// Number of navigations performed so far. Callers compare two readings to
    /// learn whether something in between already redirected.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.inner.navigations.load(Ordering::SeqCst)
    }
}
