//! Background access-token refresh.
//!
//! The portal issues short-lived access tokens; a resident process keeps
//! its copy fresh by periodically trading the refresh token for a new
//! access token. A rejected refresh token means the session is beyond
//! saving and is destroyed; transient failures leave it untouched for the
//! next tick.

use crate::backend::{self, BackendError};
use crate::cli::globals::GlobalArgs;
use crate::session::SessionState;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, error, instrument, warn};

/// One refresh exchange, applied to the session in place.
///
/// A missing session is a no-op: there is nothing to keep fresh.
///
/// # Errors
///
/// Propagates the gateway failure; `RefreshTokenInvalid` additionally
/// destroys the session before returning.
#[instrument(skip(globals, session))]
pub async fn refresh_once(
    globals: &GlobalArgs,
    session: &SessionState,
) -> Result<(), BackendError> {
    let Some(current) = session.current() else {
        debug!("no session, nothing to refresh");
        return Ok(());
    };

    match backend::refresh(globals, &current.refresh_token).await {
        Ok(access_token) => {
            if let Err(e) = session.apply_refresh(access_token) {
                warn!("could not persist refreshed access token: {e}");
            }
            debug!("access token refreshed");
            Ok(())
        }
        Err(e @ BackendError::RefreshTokenInvalid) => {
            if let Err(clear_err) = session.clear() {
                warn!("could not clear session: {clear_err}");
            }
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Spawn the refresh loop: a jittered interval, three attempts with
/// exponential backoff per tick.
pub fn spawn(globals: GlobalArgs, session: Arc<SessionState>, period_secs: u64) {
    let mut rng = StdRng::from_entropy();

    let jittered_period = ((period_secs as f64) * rng.gen_range(0.7..0.9)).max(1.0) as u64;

    let mut refresh_interval = interval(Duration::from_secs(jittered_period));

    debug!("will refresh the access token every {jittered_period} seconds");

    tokio::spawn(async move {
        loop {
            refresh_interval.tick().await;

            for attempt in 1..=3 {
                let backoff_time = 2u64.pow(attempt - 1);

                if attempt > 1 {
                    warn!("Backing off for {} seconds", backoff_time);
                    sleep(Duration::from_secs(backoff_time)).await;
                }

                match refresh_once(&globals, &session).await {
                    Ok(()) => break,

                    Err(e) if e.is_transient() => {
                        error!("Error refreshing token: {e}");

                        if attempt == 3 {
                            error!("Failed to refresh token after 3 attempts");
                        }
                    }

                    Err(e) => {
                        // session already destroyed; nothing left to keep fresh
                        error!("Refresh token rejected, stopping refresher: {e}");
                        return;
                    }
                }
            }
        }
    });
}
