use crate::{
    cli::{
        actions::report_redirects,
        globals::{Connection, GlobalArgs},
    },
    session::{GuardOptions, GuardState, RoleRequirement, SessionGuard, VerifyScope},
};
use anyhow::{anyhow, Result};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub admin: bool,
    pub roles: Vec<String>,
    pub hydrate: bool,
}

impl Args {
    fn guard_options(&self) -> GuardOptions {
        GuardOptions {
            scope: if self.admin {
                VerifyScope::Admin
            } else {
                VerifyScope::User
            },
            requirement: (!self.roles.is_empty())
                .then(|| RoleRequirement::any_of(self.roles.iter().cloned())),
            denied_route: self.globals.config().denied_route,
            hydrate_from_verify: self.hydrate,
        }
    }
}

/// Runs the session guard once and reports the outcome.
/// # Errors
/// Returns an error if the client cannot be built or the session is not authorized.
pub async fn execute(args: Args) -> Result<()> {
    let Connection { client, navigator } = args.globals.connect()?;
    let options = args.guard_options();
    debug!("guard options: {:?}", options);

    let guard = SessionGuard::new(client, options);
    let state = guard.check().await;
    report_redirects(&navigator);

    match state {
        GuardState::Authorized(user) => {
            println!("authorized: {} ({})", user.id, user.user_type);
            Ok(())
        }
        GuardState::Unauthorized { redirect_to } => {
            Err(anyhow!("session not authorized, sent to {redirect_to}"))
        }
        GuardState::Checking => Err(anyhow!("session verification did not complete")),
    }
}
