use crate::cli::globals::GlobalArgs;
use crate::session::{CredentialStore, SessionState};
use anyhow::Result;

/// Handle the status action
///
/// # Errors
///
/// Currently infallible; kept fallible for uniformity with the other
/// actions.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let state = SessionState::init(CredentialStore::new(globals.state_dir.clone()));

    match state.current() {
        Some(session) => {
            let user = &session.user;
            let name = match (&user.first_name, &user.last_name) {
                (Some(first), Some(last)) => format!(" - {first} {last}"),
                (Some(first), None) => format!(" - {first}"),
                (None, Some(last)) => format!(" - {last}"),
                (None, None) => String::new(),
            };
            println!("{} ({}){name}", user.email, user.role);
        }
        None => println!("No active session"),
    }

    Ok(())
}
