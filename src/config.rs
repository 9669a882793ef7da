use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_NEWS_URL: &str = "https://feeds.feedburner.com/TheHackersNews";
pub const DEFAULT_CISA_URL: &str = "https://www.cisa.gov/uscert/ncas/alerts.xml";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Upper bound for a single feed fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// How often the dashboard page polls for updates, in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// The feed mapping is static and never read from the config file.
    #[serde(skip)]
    pub feeds: FeedSources,
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    60
}

/// A single configured feed and the label attached to all of its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSource {
    pub label: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSources {
    pub news: FeedSource,
    pub cisa: FeedSource,
}

impl Default for FeedSources {
    fn default() -> Self {
        Self {
            news: FeedSource::new("The Hacker News", DEFAULT_NEWS_URL),
            cisa: FeedSource::new("CISA Alerts", DEFAULT_CISA_URL),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            fetch_timeout_secs: default_fetch_timeout(),
            refresh_interval: default_refresh_interval(),
            feeds: FeedSources::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load the config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Both the fetch timeout and the poll interval must be non-zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.fetch_timeout_secs > 0,
            "fetch_timeout_secs must be at least 1"
        );
        anyhow::ensure!(
            self.refresh_interval > 0,
            "refresh_interval must be at least 1"
        );
        Ok(())
    }
}
