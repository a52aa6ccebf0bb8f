/// Browser configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use subsonic_client::ServerConfig;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "subsonic.toml";

/// Prefix of the environment variables that override the config file.
pub const ENV_PREFIX: &str = "SUBSONIC";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BrowseSettings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub browse: BrowseOptions,
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowseOptions {
    /// How many levels below the service root `tree` expands
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    2
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            depth: default_depth(),
        }
    }
}

impl BrowseSettings {
    /// Load settings from a config file and the environment.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) if !path.exists() => {
                bail!("Config file not found: {}", path.display());
            }
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (e.g. SUBSONIC_SERVER_URL)
        settings = settings.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) {
        if let Some(url) = url {
            self.server.url = url;
        }
        if let Some(username) = username {
            self.server.username = username;
        }
        if let Some(password) = password {
            self.server.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.url.is_empty() {
            bail!(
                "Server URL is required (set {}_SERVER_URL or pass --server)",
                ENV_PREFIX
            );
        }

        self.server_config()
            .validate()
            .context("Invalid server URL")?;

        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(
            self.server.url.clone(),
            self.server.username.clone(),
            self.server.password.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // A prefix no environment sets, so only the file is read.
    const TEST_PREFIX: &str = "SUBSONIC_BROWSE_TEST_UNSET";

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subsonic.toml");
        fs::write(
            &path,
            r#"
[server]
url = "https://music.example.com"
username = "alice"
password = "secret"

[browse]
depth = 3
"#,
        )
        .unwrap();

        let settings = BrowseSettings::load_with_prefix(Some(&path), TEST_PREFIX).unwrap();
        assert_eq!(settings.server.url, "https://music.example.com");
        assert_eq!(settings.server.username, "alice");
        assert_eq!(settings.browse.depth, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subsonic.toml");
        fs::write(&path, "[server]\nurl = \"http://localhost:4040\"\n").unwrap();

        let settings = BrowseSettings::load_with_prefix(Some(&path), TEST_PREFIX).unwrap();
        assert_eq!(settings.browse.depth, 2);
        assert!(settings.server.username.is_empty());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(BrowseSettings::load_with_prefix(Some(&path), TEST_PREFIX).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut settings = BrowseSettings::default();
        settings.apply_overrides(Some("http://nas:4040".into()), Some("bob".into()), None);

        assert_eq!(settings.server.url, "http://nas:4040");
        assert_eq!(settings.server.username, "bob");
        assert!(settings.server.password.is_empty());

        let config = settings.server_config();
        assert_eq!(config.base_url(), "http://nas:4040");
    }

    #[test]
    fn test_debug_hides_password() {
        let mut settings = BrowseSettings::default();
        settings.apply_overrides(
            Some("http://nas:4040".into()),
            Some("bob".into()),
            Some("hunter2".into()),
        );

        let printed = format!("{:?}", settings);
        assert!(printed.contains("bob"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_validate_requires_url() {
        assert!(BrowseSettings::default().validate().is_err());

        let mut settings = BrowseSettings::default();
        settings.server.url = "nas:4040".into();
        assert!(settings.validate().is_err());
    }
}
