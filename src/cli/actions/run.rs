use crate::cli::actions::{get, session, verify, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
// To add a new action, add a new `Action::*` variant and a corresponding `*::execute` call here.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Verify(args) => verify::execute(args).await,
        Action::Get(args) => get::execute(args).await,
        Action::Whoami(globals) => session::whoami(&globals),
        Action::Logout(globals) => session::logout(&globals),
    }
}
