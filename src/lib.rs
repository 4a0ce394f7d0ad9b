//! # gymdesk
//!
//! Client core for the gym back office. Every call to the admin REST backend goes
//! through [`client::ApiClient`], which keeps session cookies in its own jar and
//! recovers from an expired access cookie by running a single shared refresh and
//! replaying each failed request once.
//!
//! ## Session model
//!
//! The access and refresh credentials are `HttpOnly` cookies set by the backend and
//! are never read by this crate. The only locally cached state is the user record
//! kept in a [`session::SessionStore`]; it is a UI hint, the cookie is the authority.
//!
//! [`session::SessionGuard`] protects a view: it asks the backend to verify the
//! session, checks the cached user record (and optionally its role) and either
//! authorizes or redirects through a [`session::Navigator`].
//!
//! ## Lists
//!
//! Back office pages are variations of "fetch list, render table, paginate". The
//! [`api`] module holds the shared pieces: query building, envelope decoding and
//! numbered pagination windows.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
