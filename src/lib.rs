//! # cabinet-session
//!
//! Session and role-based access control core for the Cabinet Médical
//! portal. The portal backend issues short-lived access tokens and
//! longer-lived refresh tokens; this crate owns the client side of that
//! contract:
//!
//! - [`backend`] — stateless gateway to the portal HTTP API (login,
//!   register, token validation, refresh).
//! - [`session`] — durable credential storage and the in-memory session
//!   state broadcast, plus the background token refresher.
//! - [`guard`] — the per-navigation route guard and the role-dashboard
//!   redirect controller.
//! - [`cli`] — the command-line shell wiring the above together.
//!
//! Authorization is never decided from locally cached state alone: every
//! protected navigation re-validates the access token against the backend,
//! and only the backend's verdict drives allow/deny.

pub mod backend;
pub mod cli;
pub mod guard;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
