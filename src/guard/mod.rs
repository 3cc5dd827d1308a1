//! Per-navigation authorization.
//!
//! The guard is consulted before every navigation to a protected
//! destination. It never trusts the locally cached user: a session only
//! proves that *something* is stored, and the backend's live verdict on the
//! access token is what decides allow or deny. The one exception is the
//! absence of a session, which is decided locally without a backend call.

pub mod redirect;

pub use redirect::{dashboard_path, Navigator, RedirectController, DEFAULT_SETTLE, LOGIN_PATH};

use crate::backend::{self, Validation};
use crate::cli::globals::GlobalArgs;
use crate::session::{Role, Session, SessionState, User};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument, warn};

/// A navigation attempt, as reported by the navigation system.
#[derive(Clone, Debug)]
pub struct NavigationRequest {
    pub target_path: String,
    pub required_role: Option<Role>,
}

/// The guard's answer, consumed once by the navigation system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub redirect_to: Option<String>,
}

impl AuthorizationDecision {
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            redirect_to: None,
        }
    }

    #[must_use]
    pub fn deny(redirect_to: impl Into<String>) -> Self {
        Self {
            allowed: false,
            redirect_to: Some(redirect_to.into()),
        }
    }
}

#[derive(Clone, Debug)]
enum Verdict {
    Valid(User),
    Invalid,
    Transient(String),
}

struct Inflight {
    token: String,
    rx: watch::Receiver<Option<Verdict>>,
}

enum Entry {
    Leader(watch::Sender<Option<Verdict>>),
    Follower(watch::Receiver<Option<Verdict>>),
}

pub struct RouteGuard {
    globals: GlobalArgs,
    session: Arc<SessionState>,
    redirect: RedirectController,
    inflight: Mutex<Option<Inflight>>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(
        globals: GlobalArgs,
        session: Arc<SessionState>,
        redirect: RedirectController,
    ) -> Self {
        Self {
            globals,
            session,
            redirect,
            inflight: Mutex::new(None),
        }
    }

    /// Decide a navigation attempt.
    #[instrument(skip(self, request), fields(path = %request.target_path))]
    pub async fn evaluate(&self, request: &NavigationRequest) -> AuthorizationDecision {
        let Some(session) = self.session.current() else {
            debug!("no session, denying without a backend call");
            return AuthorizationDecision::deny(LOGIN_PATH);
        };

        match self.validate_collapsed(&session).await {
            Verdict::Valid(user) => self.decide(request, &user).await,
            Verdict::Invalid => {
                debug!("token rejected by the backend, clearing session");
                if let Err(e) = self.session.clear() {
                    warn!("could not clear session: {e}");
                }
                AuthorizationDecision::deny(LOGIN_PATH)
            }
            Verdict::Transient(reason) => {
                // Backend unreachable says nothing about the credential:
                // deny this one navigation, keep the session so a retry can
                // succeed without a fresh login.
                warn!("token validation unavailable: {reason}");
                AuthorizationDecision::deny(LOGIN_PATH)
            }
        }
    }

    /// Clear the session and return to the login entry point.
    pub async fn logout(&self) {
        if let Err(e) = self.session.clear() {
            warn!("could not clear session: {e}");
        }
        self.redirect.redirect_to_login().await;
    }

    async fn decide(&self, request: &NavigationRequest, user: &User) -> AuthorizationDecision {
        match request.required_role {
            Some(required) if user.role != required => {
                debug!(role = %user.role, %required, "role mismatch");

                if user.role == Role::Unknown {
                    // No dashboard to send this user to; the fallback route
                    // only bounces back toward login. Wipe the session
                    // instead of looping.
                    warn!("validated session carries an unrecognized role, clearing");
                    if let Err(e) = self.session.clear() {
                        warn!("could not clear session: {e}");
                    }
                    return AuthorizationDecision::deny(LOGIN_PATH);
                }

                self.redirect.redirect_to_role_dashboard(user.role).await;
                AuthorizationDecision::deny(dashboard_path(user.role))
            }
            _ => AuthorizationDecision::allow(),
        }
    }

    /// Validate the session's access token, collapsing concurrent
    /// validations for the same token into one backend request.
    async fn validate_collapsed(&self, session: &Session) -> Verdict {
        let token = session.access_token.expose_secret().to_string();

        let entry = {
            let mut slot = self.inflight.lock().await;
            let in_flight = slot
                .as_ref()
                .filter(|inflight| inflight.token == token)
                .map(|inflight| inflight.rx.clone());
            match in_flight {
                Some(rx) => Entry::Follower(rx),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(Inflight {
                        token: token.clone(),
                        rx,
                    });
                    Entry::Leader(tx)
                }
            }
        };

        match entry {
            Entry::Follower(mut rx) => {
                debug!("validation already in flight for this token, waiting");
                match rx.wait_for(Option::is_some).await {
                    Ok(verdict) => verdict
                        .clone()
                        .unwrap_or_else(|| Verdict::Transient("validation dropped".to_string())),
                    Err(_) => Verdict::Transient("in-flight validation aborted".to_string()),
                }
            }
            Entry::Leader(tx) => {
                let verdict = self.validate_once(session).await;
                tx.send_replace(Some(verdict.clone()));

                let mut slot = self.inflight.lock().await;
                if slot
                    .as_ref()
                    .is_some_and(|inflight| inflight.token == token)
                {
                    slot.take();
                }

                verdict
            }
        }
    }

    async fn validate_once(&self, session: &Session) -> Verdict {
        match backend::validate(&self.globals, &session.access_token).await {
            Ok(Validation {
                valid: true,
                user: Some(user),
            }) => Verdict::Valid(user),
            Ok(validation) => {
                debug!(valid = validation.valid, "backend reports no valid session");
                Verdict::Invalid
            }
            Err(e) if e.is_transient() => Verdict::Transient(e.to_string()),
            Err(e) => {
                debug!("validation rejected: {e}");
                Verdict::Invalid
            }
        }
    }
}
