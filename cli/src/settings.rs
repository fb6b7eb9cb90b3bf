use std::path::Path;

use narrative::config::NarrativeConfig;
use serde::Deserialize;

/// Layout of the `--config` TOML file.
///
/// ```toml
/// [narrative]
/// hosts = ["nextstrain.org", "localhost", "staging.nextstrain.org"]
/// main_display_tag = "auspiceMainDisplayMarkdown"
/// ```
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    narrative: NarrativeConfig,
}

fn parse_settings(text: &str) -> Result<NarrativeConfig, String> {
    let file: SettingsFile = toml::from_str(text).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok(file.narrative)
}

/// Load the parser configuration. `--host` values replace the configured hosts.
pub fn load(path: Option<&Path>, hosts: &[String]) -> Result<NarrativeConfig, String> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
            parse_settings(&text)?
        }
        None => NarrativeConfig::default(),
    };
    let config = config.with_hosts(hosts.to_vec());
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_settings("").unwrap(), NarrativeConfig::default());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = parse_settings("[narrative]\nhosts = [\"auspice.us\"]\n").unwrap();
        assert_eq!(config.hosts, vec!["auspice.us"]);
        assert_eq!(config.main_display_tag, "auspiceMainDisplayMarkdown");
    }

    #[test]
    fn bad_toml_is_reported() {
        let err = parse_settings("[narrative\n").unwrap_err();
        assert!(err.starts_with("TOML parse error"));
    }

    #[test]
    fn host_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrative.toml");
        std::fs::write(&path, "[narrative]\nhosts = [\"a.org\"]\n").unwrap();
        let config = load(Some(&path), &["b.org".to_string()]).unwrap();
        assert_eq!(config.hosts, vec!["b.org"]);
        let config = load(Some(&path), &[]).unwrap();
        assert_eq!(config.hosts, vec!["a.org"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load(Some(Path::new("/definitely/not/here.toml")), &[]).unwrap_err();
        assert!(err.contains("cannot read"));
    }

    #[test]
    fn unusable_settings_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrative.toml");
        std::fs::write(&path, "[narrative]\nhosts = []\n").unwrap();
        let err = load(Some(&path), &[]).unwrap_err();
        assert!(err.contains("no dataset hosts"));

        std::fs::write(&path, "[narrative]\nmain_display_tag = \"\"\n").unwrap();
        let err = load(Some(&path), &[]).unwrap_err();
        assert!(err.contains("main display tag"));
    }
}
