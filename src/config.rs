// Endpoint configuration. Read from the environment so tests and staging
// setups can point the client somewhere other than the public Dropbox API.

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";

/// Base URLs and client identity used by `DropboxClient`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Host for RPC endpoints such as `users/get_current_account`.
    pub api_url: String,
    /// Host for content endpoints such as `files/upload`.
    pub content_url: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.into(),
            content_url: DEFAULT_CONTENT_URL.into(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Config {
    /// Create a Config from `DROPBOX_API_URL` and `DROPBOX_CONTENT_URL`,
    /// falling back to the public endpoints.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let url = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(default)
        };
        Config {
            api_url: url("DROPBOX_API_URL", defaults.api_url),
            content_url: url("DROPBOX_CONTENT_URL", defaults.content_url),
            user_agent: defaults.user_agent,
        }
    }
}
