//! Durable persistence of the current session.
//!
//! The store keeps three scoped entries under a state directory: the access
//! token, the refresh token, and the serialized user record. The three are
//! always written and cleared together; only [`SessionState`] writes here.
//!
//! [`SessionState`]: crate::session::SessionState

use crate::session::{Session, User};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

const ACCESS_TOKEN_ENTRY: &str = "access_token";
const REFRESH_TOKEN_ENTRY: &str = "refresh_token";
const USER_ENTRY: &str = "user.json";

pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Persist all three entries of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or any
    /// entry cannot be written.
    pub fn save(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        fs::write(
            self.dir.join(ACCESS_TOKEN_ENTRY),
            session.access_token.expose_secret(),
        )?;
        fs::write(
            self.dir.join(REFRESH_TOKEN_ENTRY),
            session.refresh_token.expose_secret(),
        )?;
        fs::write(
            self.dir.join(USER_ENTRY),
            serde_json::to_string(&session.user)?,
        )?;

        debug!("session persisted to {}", self.dir.display());

        Ok(())
    }

    /// Reconstruct the persisted session.
    ///
    /// Returns `Some` only when all three entries are present and
    /// well-formed. Absence is a normal state, not a failure; partial or
    /// malformed state is wiped so the next load starts clean.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        let access_token = self.read_entry(ACCESS_TOKEN_ENTRY);
        let refresh_token = self.read_entry(REFRESH_TOKEN_ENTRY);
        let user = self.read_entry(USER_ENTRY);

        let (Some(access_token), Some(refresh_token), Some(user)) =
            (access_token, refresh_token, user)
        else {
            self.wipe_partial();
            return None;
        };

        let user: User = match serde_json::from_str(&user) {
            Ok(user) => user,
            Err(e) => {
                warn!("stored user record is malformed: {e}");
                self.wipe_partial();
                return None;
            }
        };

        Some(Session {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
            user,
        })
    }

    /// Remove all three entries. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be removed.
    pub fn clear(&self) -> Result<()> {
        for entry in [ACCESS_TOKEN_ENTRY, REFRESH_TOKEN_ENTRY, USER_ENTRY] {
            match fs::remove_file(self.dir.join(entry)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    fn read_entry(&self, entry: &str) -> Option<String> {
        let value = fs::read_to_string(self.dir.join(entry)).ok()?;

        if value.is_empty() {
            return None;
        }

        Some(value)
    }

    fn wipe_partial(&self) {
        if let Err(e) = self.clear() {
            warn!("could not clear partial session state: {e}");
        }
    }
}
