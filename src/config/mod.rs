//! Configuration management for the Skytap client.
//!
//! Values merge, lowest precedence first: defaults, YAML file
//! (`~/.skytap/config.yaml` unless a path is given), `SKYTAP_*` environment
//! variables, and finally command-line flags.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::api::retry::RetryPolicy;
use crate::convergence::PollPolicy;
use crate::error::{Error, Result};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://cloud.skytap.com/";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Command-line arguments shared by every `skytap` subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Args {
    /// API base URL
    #[arg(long, global = true, env = "SKYTAP_URL")]
    pub url: Option<String>,

    /// Account username
    #[arg(short, long, global = true, env = "SKYTAP_USERNAME")]
    pub username: Option<String>,

    /// API security token
    #[arg(long, global = true, env = "SKYTAP_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "SKYTAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum retries for busy responses
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "SKYTAP_DEBUG")]
    pub debug: bool,
}

/// Client configuration. Immutable once a client is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL
    pub url: String,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Retry controller settings
    pub retry: RetryPolicy,
    /// Convergence poller settings
    pub poll: PollPolicy,
    /// Timeout for a single HTTP request
    #[serde(rename = "http_timeout_secs", with = "duration_secs")]
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("skytap-rs/{}", crate::VERSION),
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load defaults, then the YAML file, then the environment.
    ///
    /// With no explicit `path`, `~/.skytap/config.yaml` is read if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an explicit file is missing, the YAML is
    /// malformed, or an environment variable does not parse.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path).await?,
            None => match default_config_path() {
                Some(path) if fs::try_exists(&path).await.unwrap_or(false) => {
                    Self::from_file(&path).await?
                }
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Read a YAML configuration file. Missing keys keep their defaults.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Override values from `SKYTAP_*` variables supplied by `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SKYTAP_URL") {
            self.url = url;
        }
        if let Some(user_agent) = lookup("SKYTAP_USER_AGENT") {
            self.user_agent = user_agent;
        }
        if let Some(value) = lookup("SKYTAP_MAX_RETRIES") {
            self.retry.max_retries = parse_env("SKYTAP_MAX_RETRIES", &value)?;
        }
        if let Some(value) = lookup("SKYTAP_RETRY_DELAY_SECS") {
            self.retry.default_delay =
                Duration::from_secs(parse_env("SKYTAP_RETRY_DELAY_SECS", &value)?);
        }
        if let Some(value) = lookup("SKYTAP_POLL_INTERVAL_SECS") {
            self.poll.interval =
                Duration::from_secs(parse_env("SKYTAP_POLL_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = lookup("SKYTAP_POLL_MAX_ITERATIONS") {
            self.poll.max_iterations = parse_env("SKYTAP_POLL_MAX_ITERATIONS", &value)?;
        }
        Ok(self)
    }

    /// Override values from command-line flags.
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(url) = &args.url {
            self.url = url.clone();
        }
        if let Some(max_retries) = args.max_retries {
            self.retry.max_retries = max_retries;
        }
        self
    }

    /// The base URL, normalised to end in `/` so relative paths join under it.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid base URL {:?}: {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https: {}",
                self.url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Semantic validation of the merged values.
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("user agent must not be empty".to_string()));
        }
        if self.poll.max_iterations == 0 {
            return Err(Error::Config(
                "poll max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `~/.skytap/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".skytap").join("config.yaml"))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value {:?}", key, value)))
}

/// Serde adapter storing a [`Duration`] as whole seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
