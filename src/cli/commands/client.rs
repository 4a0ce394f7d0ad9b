use crate::config::{BASE_URL_ENV, DEFAULT_BASE_URL};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use secrecy::SecretString;
use std::path::PathBuf;

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub const ARG_SETTLE_DELAY_MS: &str = "settle-delay-ms";
pub const ARG_COOKIE: &str = "cookie";
pub const ARG_SESSION_FILE: &str = "session-file";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Admin API base URL")
                .env(BASE_URL_ENV)
                .default_value(DEFAULT_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_SECS)
                .long(ARG_TIMEOUT_SECS)
                .help("Request timeout in seconds")
                .env("GYMDESK_TIMEOUT_SECS")
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_SETTLE_DELAY_MS)
                .long(ARG_SETTLE_DELAY_MS)
                .help("Delay before replaying a request after a cookie refresh, in milliseconds")
                .env("GYMDESK_SETTLE_DELAY_MS")
                .default_value("100")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new(ARG_COOKIE)
                .long(ARG_COOKIE)
                .help("Session cookie to send, NAME=VALUE (repeatable)")
                .long_help(
                    "Session cookie to send, NAME=VALUE. Repeat the flag for the access and refresh cookies. The environment variable takes a single cookie.",
                )
                .env("GYMDESK_COOKIE")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("File holding the cached user record")
                .env("GYMDESK_SESSION_FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub base_url: String,
    pub timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub cookies: Vec<SecretString>,
    pub session_file: PathBuf,
}

impl Options {
    /// # Errors
    /// Returns an error if no session file location can be determined.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = matches.get_one::<u64>(ARG_TIMEOUT_SECS).copied().unwrap_or(30);
        let settle_delay_ms = matches
            .get_one::<u64>(ARG_SETTLE_DELAY_MS)
            .copied()
            .unwrap_or(100);
        let cookies = matches
            .get_many::<String>(ARG_COOKIE)
            .map(|values| {
                values
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| SecretString::from(value.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let session_file = match matches.get_one::<PathBuf>(ARG_SESSION_FILE) {
            Some(path) => path.clone(),
            None => crate::session::FileStore::default_path()
                .context("no data directory found, pass --session-file")?,
        };

        Ok(Self {
            base_url,
            timeout_secs,
            settle_delay_ms,
            cookies,
            session_file,
        })
    }
}
