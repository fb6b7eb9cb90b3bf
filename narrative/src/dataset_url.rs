//! Splitting a dataset URL into the dataset path and its query string.
//!
//! A dataset URL names one of the recognized hosts, then (after any port or
//! other characters) one or more slashes, then the dataset path. Everything
//! after a `?` up to the first whitespace is the query.
//!
//! ```text
//! https://nextstrain.org/flu/seasonal?c=region   ->  ("flu/seasonal", "c=region")
//! http://localhost:4000/zika                     ->  ("zika", "")
//! ```

use regex::Regex;
use serde::Serialize;

use crate::config::ConfigError;

/// The two parts of a dataset URL a block keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetUrl {
    pub dataset: String,
    pub query: String,
}

/// Matches URLs against a fixed set of hosts.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    pattern: Regex,
}

impl HostMatcher {
    /// An empty host list, or an empty host, would match any URL and is rejected.
    pub fn new<S: AsRef<str>>(hosts: &[S]) -> Result<Self, ConfigError> {
        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if hosts.iter().any(|h| h.as_ref().trim().is_empty()) {
            return Err(ConfigError::EmptyHost);
        }
        let alternatives: Vec<String> = hosts
            .iter()
            .map(|h| regex::escape(h.as_ref()))
            .collect();
        let pattern = Regex::new(&format!(
            r".*(?:{}).*?/+([^?\s]+)\??(\S*)",
            alternatives.join("|")
        ))
        .map_err(|e| ConfigError::HostPattern(e.to_string()))?;
        Ok(HostMatcher { pattern })
    }

    /// Decompose `url`, or `None` when it does not have the host/path shape.
    pub fn decompose(&self, url: &str) -> Option<DatasetUrl> {
        let caps = self.pattern.captures(url)?;
        Some(DatasetUrl {
            dataset: caps.get(1)?.as_str().to_string(),
            query: caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string(),
        })
    }
}
