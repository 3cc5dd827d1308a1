pub mod guard;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;
pub mod status;

use crate::guard::Navigator;
use crate::session::Role;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug)]
pub enum Action {
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        password: String,
        first_name: String,
        last_name: String,
        role: Option<Role>,
    },
    Logout,
    Status,
    Refresh,
    Guard {
        path: String,
        required_role: Option<Role>,
    },
}

/// Navigator for a terminal session: route changes are logged, the current
/// path is tracked in memory.
pub struct CliNavigator {
    current: Mutex<String>,
}

impl CliNavigator {
    #[must_use]
    pub fn new(current: &str) -> Self {
        Self {
            current: Mutex::new(current.to_string()),
        }
    }
}

#[async_trait]
impl Navigator for CliNavigator {
    async fn navigate(&self, path: &str) -> Result<()> {
        info!("navigating to {path}");
        *self.current.lock().await = path.to_string();
        Ok(())
    }

    async fn current_path(&self) -> String {
        self.current.lock().await.clone()
    }
}
