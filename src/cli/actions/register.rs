use crate::backend::{self, Registration};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::{CredentialStore, SessionState};
use anyhow::{anyhow, Result};

/// Handle the register action
///
/// # Errors
///
/// Returns an error if the backend rejects the registration or the session
/// cannot be persisted.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Register {
        email,
        password,
        first_name,
        last_name,
        role,
    } = action
    else {
        return Err(anyhow!("unexpected action"));
    };

    let registration = Registration {
        email,
        password,
        first_name,
        last_name,
        role,
    };

    let session = backend::register(globals, &registration).await?;
    let user = session.user.clone();

    let state = SessionState::init(CredentialStore::new(globals.state_dir.clone()));
    state.set_session(session)?;

    println!("Registered {} ({})", user.email, user.role);

    Ok(())
}
