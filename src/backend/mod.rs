//! Gateway to the Cabinet Médical backend API.
//!
//! Stateless request/response functions: exchange credentials for a
//! session, ask whether an access token is still valid, and trade a refresh
//! token for a new access token. Nothing here touches the credential store
//! or the session state, so the whole module can be tested against a fake
//! backend with no storage or routing side effects.

pub mod error;

pub use error::BackendError;

use crate::cli::globals::GlobalArgs;
use crate::session::{Role, Session, User};
use crate::APP_USER_AGENT;
use regex::Regex;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

impl AuthResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            user: self.user,
        }
    }
}

/// Backend verdict on an access token. `valid: false` is a normal answer,
/// not an error.
#[derive(Debug, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Registration payload for `/auth/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

fn client(globals: &GlobalArgs) -> Result<Client, BackendError> {
    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(Duration::from_secs(globals.timeout))
        .build()?)
}

/// Build the full URL for an API endpoint, keeping any base path of the
/// configured API URL.
///
/// # Errors
///
/// Returns a transient [`BackendError::Network`] if the configured URL
/// cannot be parsed, has no host, or uses an unsupported scheme; a
/// misconfigured URL must never read as a rejected credential.
#[instrument]
pub fn endpoint_url(globals: &GlobalArgs, endpoint: &str) -> Result<String, BackendError> {
    let url = Url::parse(&globals.api_url)
        .map_err(|e| BackendError::Network(format!("invalid API URL: {e}")))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| BackendError::Network("invalid API URL: no host specified".to_string()))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => {
                return Err(BackendError::Network(format!(
                    "invalid API URL: unsupported scheme {scheme}"
                )))
            }
        },
    };

    let base = url.path().trim_end_matches('/');
    let endpoint_url = format!("{scheme}://{host}:{port}{base}{endpoint}");

    debug!("endpoint URL: {endpoint_url}");

    Ok(endpoint_url)
}

async fn error_message(response: reqwest::Response) -> String {
    response
        .json::<ErrorBody>()
        .await
        .map_or_else(|_| String::new(), |body| body.error)
}

/// Exchange credentials for a session.
///
/// # Errors
///
/// `InvalidCredentials` when the backend rejects the pair, `Network` when
/// it cannot be reached or answers with a server error.
#[instrument(skip(globals, password))]
pub async fn login(
    globals: &GlobalArgs,
    email: &str,
    password: &str,
) -> Result<Session, BackendError> {
    if !valid_email(email) {
        return Err(BackendError::Validation("invalid email address".to_string()));
    }

    let client = client(globals)?;

    let login_url = endpoint_url(globals, "/auth/login")?;

    let payload = json!({
        "email": email,
        "password": password,
    });

    let response = client.post(&login_url).json(&payload).send().await?;

    match response.status() {
        status if status.is_success() => {
            let auth: AuthResponse = response.json().await?;
            debug!(role = %auth.user.role, "login accepted for {}", auth.user.email);
            Ok(auth.into_session())
        }
        status if status.is_server_error() => {
            Err(BackendError::Network(format!("{login_url} - {status}")))
        }
        status => {
            debug!("login rejected: {status}, {}", error_message(response).await);
            Err(BackendError::InvalidCredentials)
        }
    }
}

/// Create an account and receive a session for it.
///
/// # Errors
///
/// `DuplicateEmail` when the address is taken, `Validation` when the
/// backend rejects the payload, `Network` when it cannot be reached.
#[instrument(skip(globals, registration))]
pub async fn register(
    globals: &GlobalArgs,
    registration: &Registration,
) -> Result<Session, BackendError> {
    if !valid_email(&registration.email) {
        return Err(BackendError::Validation("invalid email address".to_string()));
    }

    let client = client(globals)?;

    let register_url = endpoint_url(globals, "/auth/register")?;

    let mut payload = json!({
        "email": registration.email,
        "password": registration.password,
        "first_name": registration.first_name,
        "last_name": registration.last_name,
    });
    if let Some(role) = registration.role {
        payload["role"] = json!(role);
    }

    let response = client.post(&register_url).json(&payload).send().await?;

    match response.status() {
        status if status.is_success() => {
            let auth: AuthResponse = response.json().await?;
            debug!("registration accepted for {}", auth.user.email);
            Ok(auth.into_session())
        }
        status if status.is_server_error() => {
            Err(BackendError::Network(format!("{register_url} - {status}")))
        }
        status if status == StatusCode::CONFLICT => Err(BackendError::DuplicateEmail),
        status => {
            let message = error_message(response).await;
            debug!("registration rejected: {status}, {message}");

            if message.is_empty() {
                Err(BackendError::Validation("registration rejected".to_string()))
            } else {
                Err(BackendError::Validation(message))
            }
        }
    }
}

/// Ask the backend whether an access token is still valid.
///
/// # Errors
///
/// `TokenRejected` when the backend explicitly refuses the token,
/// `Network` when it cannot be reached or answers with a server error.
#[instrument(skip(globals, access_token))]
pub async fn validate(
    globals: &GlobalArgs,
    access_token: &SecretString,
) -> Result<Validation, BackendError> {
    let client = client(globals)?;

    let validate_url = endpoint_url(globals, "/auth/validate-token")?;

    let response = client
        .get(&validate_url)
        .bearer_auth(access_token.expose_secret())
        .send()
        .await?;

    match response.status() {
        status if status.is_success() => Ok(response.json().await?),
        status if status.is_server_error() => {
            Err(BackendError::Network(format!("{validate_url} - {status}")))
        }
        status if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            Err(BackendError::TokenRejected)
        }
        status => Err(BackendError::Network(format!(
            "{validate_url} - unexpected status {status}"
        ))),
    }
}

/// Exchange a refresh token for a new access token.
///
/// # Errors
///
/// `RefreshTokenInvalid` when the backend refuses the refresh token,
/// `Network` when it cannot be reached or answers with a server error.
#[instrument(skip(globals, refresh_token))]
pub async fn refresh(
    globals: &GlobalArgs,
    refresh_token: &SecretString,
) -> Result<SecretString, BackendError> {
    let client = client(globals)?;

    let refresh_url = endpoint_url(globals, "/auth/refresh")?;

    let response = client
        .post(&refresh_url)
        .bearer_auth(refresh_token.expose_secret())
        .send()
        .await?;

    match response.status() {
        status if status.is_success() => {
            let refreshed: RefreshResponse = response.json().await?;
            Ok(SecretString::from(refreshed.access_token))
        }
        status if status.is_server_error() => {
            Err(BackendError::Network(format!("{refresh_url} - {status}")))
        }
        status if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            Err(BackendError::RefreshTokenInvalid)
        }
        status => Err(BackendError::Network(format!(
            "{refresh_url} - unexpected status {status}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn globals_for(uri: &str) -> GlobalArgs {
        GlobalArgs::new(uri.to_string())
    }

    fn user_json() -> serde_json::Value {
        json!({
            "id": "42",
            "email": "admin@cabinet.com",
            "role": "admin",
            "first_name": "Ada",
            "last_name": "Martin"
        })
    }

    #[test]
    fn valid_email_accepts_plain_addresses() {
        assert!(valid_email("admin@cabinet.com"));
        assert!(!valid_email("admin"));
        assert!(!valid_email("admin@cabinet"));
        assert!(!valid_email("admin cabinet@x.y"));
    }

    #[test]
    fn endpoint_url_defaults_http_port() -> Result<()> {
        let globals = globals_for("http://example.com");
        let url = endpoint_url(&globals, "/auth/login")?;
        assert_eq!(url, "http://example.com:80/auth/login");
        Ok(())
    }

    #[test]
    fn endpoint_url_defaults_https_port() -> Result<()> {
        let globals = globals_for("https://example.com");
        let url = endpoint_url(&globals, "/auth/login")?;
        assert_eq!(url, "https://example.com:443/auth/login");
        Ok(())
    }

    #[test]
    fn endpoint_url_keeps_base_path() -> Result<()> {
        let globals = globals_for("http://localhost:5000/api");
        let url = endpoint_url(&globals, "/auth/login")?;
        assert_eq!(url, "http://localhost:5000/api/auth/login");
        Ok(())
    }

    #[test]
    fn endpoint_url_rejects_unsupported_scheme() {
        let globals = globals_for("ftp://example.com");
        let err = endpoint_url(&globals, "/auth/login").err();
        assert!(matches!(err, Some(BackendError::Network(_))));
    }

    #[tokio::test]
    async fn login_returns_a_session() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({
                "email": "admin@cabinet.com",
                "password": "hunter2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "user": user_json()
            })))
            .mount(&server)
            .await;

        let session = login(&globals_for(&server.uri()), "admin@cabinet.com", "hunter2").await?;
        assert_eq!(session.access_token.expose_secret(), "access-1");
        assert_eq!(session.refresh_token.expose_secret(), "refresh-1");
        assert_eq!(session.user.role, Role::Admin);
        assert_eq!(session.user.first_name.as_deref(), Some("Ada"));
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Email ou mot de passe incorrect"
            })))
            .mount(&server)
            .await;

        let result = login(&globals_for(&server.uri()), "admin@cabinet.com", "wrong").await;
        assert!(matches!(result, Err(BackendError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn login_rejects_malformed_email_without_backend_call() -> Result<()> {
        let globals = globals_for("http://example.invalid");
        let result = login(&globals, "not-an-email", "hunter2").await;
        assert!(matches!(result, Err(BackendError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn login_maps_server_errors_to_network() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = login(&globals_for(&server.uri()), "admin@cabinet.com", "hunter2").await;
        let err = result.err().ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.is_transient());
        Ok(())
    }

    #[tokio::test]
    async fn login_maps_unreachable_backend_to_network() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let globals = globals_for(&format!("http://127.0.0.1:{port}"));
        let result = login(&globals, "admin@cabinet.com", "hunter2").await;
        let err = result.err().ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.is_transient());
        Ok(())
    }

    #[tokio::test]
    async fn register_returns_a_session_with_role() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "email": "new@cabinet.com",
                "password": "hunter2",
                "first_name": "Nadia",
                "last_name": "Benali",
                "role": "doctor"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "user": {
                    "id": "43",
                    "email": "new@cabinet.com",
                    "role": "doctor"
                }
            })))
            .mount(&server)
            .await;

        let registration = Registration {
            email: "new@cabinet.com".to_string(),
            password: "hunter2".to_string(),
            first_name: "Nadia".to_string(),
            last_name: "Benali".to_string(),
            role: Some(Role::Doctor),
        };

        let session = register(&globals_for(&server.uri()), &registration).await?;
        assert_eq!(session.user.role, Role::Doctor);
        Ok(())
    }

    #[tokio::test]
    async fn register_maps_conflict_to_duplicate_email() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "Un utilisateur avec cet email existe déjà"
            })))
            .mount(&server)
            .await;

        let registration = Registration {
            email: "new@cabinet.com".to_string(),
            password: "hunter2".to_string(),
            first_name: "Nadia".to_string(),
            last_name: "Benali".to_string(),
            role: None,
        };

        let result = register(&globals_for(&server.uri()), &registration).await;
        assert!(matches!(result, Err(BackendError::DuplicateEmail)));
        Ok(())
    }

    #[tokio::test]
    async fn register_surfaces_backend_validation_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Tous les champs sont requis"
            })))
            .mount(&server)
            .await;

        let registration = Registration {
            email: "new@cabinet.com".to_string(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role: None,
        };

        let result = register(&globals_for(&server.uri()), &registration).await;
        match result {
            Err(BackendError::Validation(message)) => {
                assert_eq!(message, "Tous les champs sont requis");
            }
            other => return Err(anyhow!("expected validation error, got {other:?}")),
        }
        Ok(())
    }

    #[tokio::test]
    async fn validate_returns_the_backend_verdict() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/validate-token"))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true,
                "user": user_json()
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("access-1".to_string());
        let validation = validate(&globals_for(&server.uri()), &token).await?;
        assert!(validation.valid);
        assert_eq!(
            validation.user.map(|user| user.role),
            Some(Role::Admin)
        );
        Ok(())
    }

    #[tokio::test]
    async fn validate_passes_through_a_negative_verdict() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/validate-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": false
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("stale".to_string());
        let validation = validate(&globals_for(&server.uri()), &token).await?;
        assert!(!validation.valid);
        assert!(validation.user.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn validate_maps_unauthorized_to_token_rejected() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/validate-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Token invalide",
                "code": "invalid_token"
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("forged".to_string());
        let result = validate(&globals_for(&server.uri()), &token).await;
        assert!(matches!(result, Err(BackendError::TokenRejected)));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_returns_the_new_access_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("Authorization", "Bearer refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-2"
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("refresh-1".to_string());
        let refreshed = refresh(&globals_for(&server.uri()), &token).await?;
        assert_eq!(refreshed.expose_secret(), "access-2");
        Ok(())
    }

    #[tokio::test]
    async fn refresh_maps_unauthorized_to_refresh_token_invalid() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Le token a expiré",
                "code": "token_expired"
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("expired".to_string());
        let result = refresh(&globals_for(&server.uri()), &token).await;
        assert!(matches!(result, Err(BackendError::RefreshTokenInvalid)));
        Ok(())
    }
}
