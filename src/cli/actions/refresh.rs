use crate::cli::globals::GlobalArgs;
use crate::session::{refresh, CredentialStore, SessionState};
use anyhow::Result;

/// Handle the refresh action
///
/// # Errors
///
/// Returns an error if the backend rejects the refresh token or cannot be
/// reached.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let state = SessionState::init(CredentialStore::new(globals.state_dir.clone()));

    if state.current().is_none() {
        println!("No active session");
        return Ok(());
    }

    refresh::refresh_once(globals, &state).await?;

    println!("Access token refreshed");

    Ok(())
}
