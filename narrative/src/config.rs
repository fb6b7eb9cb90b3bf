use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_HOSTS: &[&str] = &["nextstrain.org", "localhost"];
pub const DEFAULT_MAIN_DISPLAY_TAG: &str = "auspiceMainDisplayMarkdown";

/// Parser settings. Usually loaded from the `[narrative]` table of a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Hosts a dataset URL must name. The dataset path follows the host.
    pub hosts: Vec<String>,
    /// Info string of the fenced block split out as main display markdown.
    pub main_display_tag: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        NarrativeConfig {
            hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            main_display_tag: DEFAULT_MAIN_DISPLAY_TAG.to_string(),
        }
    }
}

/// A configuration the parser cannot work with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no dataset hosts are configured")]
    NoHosts,
    #[error("dataset host names cannot be empty")]
    EmptyHost,
    #[error("the main display tag cannot be empty")]
    EmptyMainDisplayTag,
    #[error("cannot build the dataset host pattern: {0}")]
    HostPattern(String),
}

impl NarrativeConfig {
    /// Reject settings under which every URL, or every bare fence, would match.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if self.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::EmptyHost);
        }
        if self.main_display_tag.trim().is_empty() {
            return Err(ConfigError::EmptyMainDisplayTag);
        }
        Ok(())
    }

    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        if !hosts.is_empty() {
            self.hosts = hosts;
        }
        self
    }
}
