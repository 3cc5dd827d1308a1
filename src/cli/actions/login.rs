use crate::backend;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::{CredentialStore, SessionState};
use anyhow::{anyhow, Result};

/// Handle the login action
///
/// # Errors
///
/// Returns an error if the exchange is rejected or the session cannot be
/// persisted.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Login { email, password } = action else {
        return Err(anyhow!("unexpected action"));
    };

    let session = backend::login(globals, &email, &password).await?;
    let user = session.user.clone();

    let state = SessionState::init(CredentialStore::new(globals.state_dir.clone()));
    state.set_session(session)?;

    println!("Logged in as {} ({})", user.email, user.role);

    Ok(())
}
