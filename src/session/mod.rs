//! Session model and in-memory session state.
//!
//! [`SessionState`] is the single source of truth for "who is logged in
//! now". It is seeded from the [`CredentialStore`] before any observer can
//! subscribe, writes through to the store, and broadcasts every change on a
//! watch channel so guards and UI react to the same stream instead of
//! polling storage.

pub mod refresh;
pub mod store;

pub use store::CredentialStore;

use anyhow::{bail, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;
use tracing::debug;

/// Authorization class of a portal user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    /// Any role string the backend sends that this client does not know.
    #[serde(other)]
    Unknown,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "doctor" => Ok(Self::Doctor),
            "patient" => Ok(Self::Patient),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Identity and authorization fact issued by the backend. Never mutated by
/// the client, only replaced wholesale on re-login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// The credential tuple held by the client.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub user: User,
}

pub struct SessionState {
    store: CredentialStore,
    tx: watch::Sender<Option<Session>>,
}

impl SessionState {
    /// Seed the in-memory value from durable storage. Done before any
    /// observer subscribes, so the first emission already reflects it.
    #[must_use]
    pub fn init(store: CredentialStore) -> Self {
        let initial = store.load();

        if let Some(session) = &initial {
            debug!(role = %session.user.role, "session restored for {}", session.user.email);
        }

        let (tx, _rx) = watch::channel(initial);

        Self { store, tx }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes. The receiver holds the current value
    /// immediately and sees every subsequent change.
    #[must_use]
    pub fn observe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Install a new session: persist first, then emit.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted; the in-memory
    /// value is left unchanged in that case.
    pub fn set_session(&self, session: Session) -> Result<()> {
        self.store.save(&session)?;
        self.tx.send_replace(Some(session));

        Ok(())
    }

    /// Destroy the session: clear storage first, then emit.
    ///
    /// # Errors
    ///
    /// Returns an error if durable storage cannot be cleared.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        self.tx.send_replace(None);

        Ok(())
    }

    /// Replace the access token in place after a refresh exchange. User and
    /// refresh token are unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active or persisting fails.
    pub fn apply_refresh(&self, access_token: SecretString) -> Result<()> {
        let Some(mut session) = self.current() else {
            bail!("no active session to refresh");
        };

        session.access_token = access_token;
        self.store.save(&session)?;
        self.tx.send_replace(Some(session));

        Ok(())
    }
}
