use std::path::PathBuf;

/// Resolved configuration shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the portal API, including any path prefix.
    pub api_url: String,
    /// Directory holding the persisted session entries.
    pub state_dir: PathBuf,
    /// Client-side timeout, in seconds, for every backend request.
    pub timeout: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            state_dir: PathBuf::from(".cabinet-session"),
            timeout: 5,
        }
    }
}
