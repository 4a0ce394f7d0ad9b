pub mod get;
pub mod session;
pub mod verify;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Verify(verify::Args),
    Get(get::Args),
    Whoami(GlobalArgs),
    Logout(GlobalArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Prints the navigations requested while the action ran.
pub(crate) fn report_redirects(navigator: &crate::session::RecordingNavigator) {
    for route in navigator.routes() {
        eprintln!("redirect requested: {route}");
    }
}
