use crate::{
    cli::globals::GlobalArgs,
    session::{FileStore, Session},
};
use anyhow::{Context, Result};
use std::sync::Arc;

fn local_session(globals: &GlobalArgs) -> Session {
    Session::new(Arc::new(FileStore::new(&globals.session_file)))
}

/// Prints the cached user record.
/// # Errors
/// Returns an error if the session file cannot be read.
pub fn whoami(globals: &GlobalArgs) -> Result<()> {
    let user = local_session(globals)
        .user()
        .with_context(|| format!("Could not read {}", globals.session_file.display()))?;

    match user {
        Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
        None => println!("no cached user"),
    }

    Ok(())
}

/// Drops the cached user record. Cookies are not persisted by the CLI, so there
/// is nothing else to clear locally.
/// # Errors
/// Returns an error if the session file cannot be written.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    local_session(globals)
        .clear_user()
        .with_context(|| format!("Could not update {}", globals.session_file.display()))?;
    println!("cached user cleared");
    Ok(())
}
