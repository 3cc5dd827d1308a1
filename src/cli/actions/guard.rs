use crate::cli::{actions::Action, actions::CliNavigator, globals::GlobalArgs};
use crate::guard::{NavigationRequest, RedirectController, RouteGuard, LOGIN_PATH};
use crate::session::{CredentialStore, SessionState};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Handle the guard action: evaluate one navigation request and print the
/// decision.
///
/// # Errors
///
/// Returns an error only when invoked with the wrong action variant.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let Action::Guard {
        path,
        required_role,
    } = action
    else {
        return Err(anyhow!("unexpected action"));
    };

    let session = Arc::new(SessionState::init(CredentialStore::new(
        globals.state_dir.clone(),
    )));
    let navigator = Arc::new(CliNavigator::new("/"));
    let guard = RouteGuard::new(
        globals.clone(),
        session,
        RedirectController::new(navigator),
    );

    let request = NavigationRequest {
        target_path: path.clone(),
        required_role,
    };

    let decision = guard.evaluate(&request).await;

    if decision.allowed {
        println!("ALLOW {path}");
    } else {
        println!(
            "DENY {path} -> {}",
            decision.redirect_to.as_deref().unwrap_or(LOGIN_PATH)
        );
    }

    Ok(())
}
