//! Configuration management for the OAM tools.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (OAM__ prefix)
//! 2. Config file (`oam.toml`, `oam.yaml`, or `oam.json`)
//! 3. Defaults

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Top-level tools configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// Root domain names that define the scope.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Optional file with one root domain name per line.
    #[serde(default)]
    pub domains_file: Option<String>,

    /// Path to the graph snapshot written by the discovery engine export.
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
}

fn default_snapshot() -> String {
    "./oam-graph.json".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            domains_file: None,
            snapshot: default_snapshot(),
        }
    }
}

impl ToolsConfig {
    /// Domains from the config itself plus those listed in `domains_file`.
    pub fn all_domains(&self) -> Result<Vec<String>> {
        let mut domains = self.domains.clone();
        if let Some(path) = &self.domains_file {
            domains.extend(read_domain_list(path)?);
        }
        Ok(crate::scope::normalize_domains(domains))
    }
}

/// Load configuration from `<file_prefix>.{toml,yaml,json}` and `OAM__*` env vars.
///
/// A missing file is not an error; defaults apply.
pub fn load_config(file_prefix: &str) -> Result<ToolsConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("OAM")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("domains")
                .try_parsing(true),
        )
        .build()?;

    let tools: ToolsConfig = cfg.try_deserialize()?;
    tracing::debug!(
        domains = tools.domains.len(),
        snapshot = %tools.snapshot,
        "Loaded configuration"
    );
    Ok(tools)
}

/// Read a newline-separated list of names. Blank lines and `#` comments are skipped.
pub fn read_domain_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OamError;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ToolsConfig::default();
        assert!(config.domains.is_empty());
        assert!(config.domains_file.is_none());
        assert_eq!(config.snapshot, "./oam-graph.json");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tools.toml");
        std::fs::write(
            &path,
            "domains = [\"example.com\", \"owasp.org\"]\nsnapshot = \"/data/graph.json\"\n",
        )
        .unwrap();

        let prefix = dir.path().join("tools");
        let config = load_config(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.domains, vec!["example.com", "owasp.org"]);
        assert_eq!(config.snapshot, "/data/graph.json");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = load_config(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.snapshot, "./oam-graph.json");
    }

    #[test]
    fn test_read_domain_list_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# roots").unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  owasp.org  ").unwrap();

        let list = read_domain_list(file.path()).unwrap();
        assert_eq!(list, vec!["example.com", "owasp.org"]);
    }

    #[test]
    fn test_all_domains_merges_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "owasp.org").unwrap();
        writeln!(file, "example.com").unwrap();

        let config = ToolsConfig {
            domains: vec!["example.com".to_string()],
            domains_file: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        assert_eq!(config.all_domains().unwrap(), vec!["example.com", "owasp.org"]);
    }

    #[test]
    fn test_read_missing_domain_list_is_io_error() {
        let err = read_domain_list("/nonexistent/roots.txt").unwrap_err();
        assert!(matches!(err, OamError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
