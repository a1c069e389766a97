use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub open: OpenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_youtube_endpoint() -> String {
    "https://suggestqueries.google.com/complete/search".to_string()
}

fn default_youtube_client() -> String {
    "youtube".to_string()
}

fn default_youtube_ds() -> String {
    "yt".to_string()
}

fn default_youtube_results_url() -> String {
    "https://www.youtube.com/results?search_query={{query}}".to_string()
}

fn default_youtube_debounce_ms() -> u64 {
    250
}

fn default_github_endpoint() -> String {
    "https://api.github.com/search/repositories".to_string()
}

fn default_github_per_page() -> u32 {
    10
}

fn default_github_results_url() -> String {
    "https://github.com/search?type=repositories&q={{query}}".to_string()
}

fn default_github_debounce_ms() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("flow/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub youtube: YoutubeSourceConfig,
    #[serde(default)]
    pub github: GithubSourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeSourceConfig {
    #[serde(default = "default_youtube_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_youtube_client")]
    pub client: String,
    #[serde(default = "default_youtube_ds")]
    pub ds: String,
    #[serde(default = "default_youtube_results_url")]
    pub results_url: String,
    #[serde(default = "default_youtube_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for YoutubeSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_youtube_endpoint(),
            client: default_youtube_client(),
            ds: default_youtube_ds(),
            results_url: default_youtube_results_url(),
            debounce_ms: default_youtube_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubSourceConfig {
    #[serde(default = "default_github_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_github_per_page")]
    pub per_page: u32,
    #[serde(default = "default_github_results_url")]
    pub results_url: String,
    #[serde(default = "default_github_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for GithubSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_github_endpoint(),
            per_page: default_github_per_page(),
            results_url: default_github_results_url(),
            debounce_ms: default_github_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset means requests may hang until the session is abandoned.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenConfig {
    #[serde(default)]
    pub application: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

pub fn load(cwd: &Path, explicit_path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit_path {
        return Ok(LoadedConfig {
            config: load_from_path(path)?,
            path: Some(path.to_path_buf()),
        });
    }

    let local_candidates = [cwd.join("flow.toml"), cwd.join(".flow.toml")];
    for path in &local_candidates {
        if path.exists() {
            return Ok(LoadedConfig {
                config: load_from_path(path)?,
                path: Some(path.to_path_buf()),
            });
        }
    }

    let global_path = global_config_path()?;
    if global_path.exists() {
        return Ok(LoadedConfig {
            config: load_from_path(&global_path)?,
            path: Some(global_path),
        });
    }

    Ok(LoadedConfig {
        config: Config::default(),
        path: None,
    })
}

pub fn global_config_path() -> Result<PathBuf> {
    let config_root = dirs::config_dir().context("unable to resolve OS config directory")?;
    Ok(config_root.join("flow").join("config.toml"))
}

pub fn write_example_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn load_from_path(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
}

const EXAMPLE_CONFIG: &str = r#"# flow config
#
# `results_url` templates receive the URL-encoded search term in place of {{query}}.

# YouTube search suggestions.
[sources.youtube]
endpoint = "https://suggestqueries.google.com/complete/search"
client = "youtube"
ds = "yt"
results_url = "https://www.youtube.com/results?search_query={{query}}"
debounce_ms = 250

# GitHub repository search.
[sources.github]
endpoint = "https://api.github.com/search/repositories"
per_page = 10
results_url = "https://github.com/search?type=repositories&q={{query}}"
debounce_ms = 300

[http]
# user_agent = "flow"
# timeout_secs = 10

# Application used to open results. Uses the system default when unset.
[open]
# application = "Dia"

# Logs go to `file` while the interactive UI is running. FLOW_LOG overrides `level`.
[logging]
level = "info"
# file = "/tmp/flow.log"
"#;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{Config, EXAMPLE_CONFIG, load, write_example_config};

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.sources.youtube.client, "youtube");
        assert_eq!(cfg.sources.youtube.ds, "yt");
        assert_eq!(cfg.sources.youtube.debounce_ms, 250);
        assert_eq!(cfg.sources.github.per_page, 10);
        assert_eq!(cfg.sources.github.debounce_ms, 300);
        assert!(cfg.http.user_agent.starts_with("flow/"));
        assert_eq!(cfg.http.timeout_secs, None);
        assert_eq!(cfg.open.application, None);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_source_tables_keep_other_defaults() {
        let raw = r#"
[sources.github]
per_page = 25

[open]
application = "Dia"
"#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.sources.github.per_page, 25);
        assert_eq!(
            cfg.sources.github.endpoint,
            "https://api.github.com/search/repositories"
        );
        assert_eq!(cfg.sources.github.debounce_ms, 300);
        assert_eq!(cfg.open.application.as_deref(), Some("Dia"));
    }

    #[test]
    fn example_config_parses() {
        let cfg: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.sources.youtube.debounce_ms, 250);
        assert_eq!(cfg.logging.file, None);
    }

    #[test]
    fn local_config_file_is_discovered() {
        let root = make_temp_dir();
        fs::write(
            root.join("flow.toml"),
            "[sources.youtube]\ndebounce_ms = 100\n",
        )
        .unwrap();

        let loaded = load(&root, None).unwrap();
        assert_eq!(loaded.path, Some(root.join("flow.toml")));
        assert_eq!(loaded.config.sources.youtube.debounce_ms, 100);

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn write_example_config_refuses_to_overwrite() {
        let root = make_temp_dir();
        let path = root.join("nested").join("config.toml");

        write_example_config(&path, false).unwrap();
        let err = write_example_config(&path, false).unwrap_err().to_string();
        assert!(err.contains("already exists"));
        write_example_config(&path, true).unwrap();

        let _ = fs::remove_dir_all(root);
    }

    fn make_temp_dir() -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("flow-config-test-{nonce}"));
        fs::create_dir_all(&path).unwrap();
        path
    }
}
