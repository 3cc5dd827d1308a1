//! Role-dashboard redirection with loop suppression.
//!
//! Denying a navigation and redirecting to the "correct" destination can
//! recurse when the target itself fails authorization. The controller
//! breaks that cycle with a two-state machine: a redirect in progress
//! suppresses further redirects until the navigation completes, with a
//! bounded settle delay as the safety net against a navigation future that
//! never resolves.

use crate::session::Role;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Entry point of the portal; the only unprotected destination.
pub const LOGIN_PATH: &str = "/auth/login";

/// Upper bound on how long a single navigation may take before the
/// controller considers it settled and accepts new redirects.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

/// Canonical dashboard for a role. Roles this client does not recognize
/// fall back to `/dashboard`, which only bounces to the login entry point.
#[must_use]
pub const fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Doctor => "/doctor/dashboard",
        Role::Patient => "/patient/dashboard",
        Role::Unknown => "/dashboard",
    }
}

/// The navigation primitive of the host application.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Commit a route change; resolves when the navigation completes.
    async fn navigate(&self, path: &str) -> Result<()>;

    /// Path currently displayed.
    async fn current_path(&self) -> String;
}

#[derive(Clone, Copy, Debug)]
enum RedirectPhase {
    Idle,
    Redirecting { since: Instant },
}

pub struct RedirectController {
    navigator: Arc<dyn Navigator>,
    phase: Mutex<RedirectPhase>,
    settle: Duration,
}

impl RedirectController {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_settle(navigator, DEFAULT_SETTLE)
    }

    #[must_use]
    pub fn with_settle(navigator: Arc<dyn Navigator>, settle: Duration) -> Self {
        Self {
            navigator,
            phase: Mutex::new(RedirectPhase::Idle),
            settle,
        }
    }

    /// Navigate to the canonical dashboard of a role.
    ///
    /// Returns `true` when a navigation was actually performed; already
    /// being on the target path or having a redirect in flight makes this a
    /// no-op.
    pub async fn redirect_to_role_dashboard(&self, role: Role) -> bool {
        self.redirect(dashboard_path(role)).await
    }

    /// Navigate to the login entry point, with the same suppression rules.
    pub async fn redirect_to_login(&self) -> bool {
        self.redirect(LOGIN_PATH).await
    }

    async fn redirect(&self, target: &str) -> bool {
        if self.navigator.current_path().await == target {
            debug!(path = target, "already on target path, skipping navigation");
            return false;
        }

        {
            let mut phase = self.phase.lock().await;

            if let RedirectPhase::Redirecting { since } = *phase {
                if since.elapsed() < self.settle {
                    debug!(path = target, "redirect in progress, suppressing");
                    return false;
                }
                // previous navigation never settled; take over
            }

            *phase = RedirectPhase::Redirecting {
                since: Instant::now(),
            };
        }

        let outcome = timeout(self.settle, self.navigator.navigate(target)).await;

        *self.phase.lock().await = RedirectPhase::Idle;

        match outcome {
            Ok(Ok(())) => {
                debug!(path = target, "navigation complete");
                true
            }
            Ok(Err(e)) => {
                warn!(path = target, "navigation failed: {e}");
                false
            }
            Err(_) => {
                warn!(path = target, "navigation did not settle within {:?}", self.settle);
                false
            }
        }
    }
}
