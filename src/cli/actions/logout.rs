use crate::cli::{actions::CliNavigator, globals::GlobalArgs};
use crate::guard::{RedirectController, RouteGuard, LOGIN_PATH};
use crate::session::{CredentialStore, SessionState};
use anyhow::Result;
use std::sync::Arc;

/// Handle the logout action
///
/// # Errors
///
/// Returns an error if the persisted session cannot be cleared.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let session = Arc::new(SessionState::init(CredentialStore::new(
        globals.state_dir.clone(),
    )));

    if session.current().is_none() {
        println!("No active session");
        return Ok(());
    }

    let navigator = Arc::new(CliNavigator::new("/"));
    let guard = RouteGuard::new(
        globals.clone(),
        session.clone(),
        RedirectController::new(navigator),
    );

    guard.logout().await;

    println!("Logged out; sign in again at {LOGIN_PATH}");

    Ok(())
}
