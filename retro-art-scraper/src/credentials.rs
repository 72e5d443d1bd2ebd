use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

const DEFAULT_SOFT_NAME: &str = "retro-art";

const ENV_DEV_ID: &str = "SCREENSCRAPER_DEVID";
const ENV_DEV_PASSWORD: &str = "SCREENSCRAPER_DEVPASSWORD";
const ENV_SOFT_NAME: &str = "SCREENSCRAPER_SOFTNAME";
const ENV_USER_ID: &str = "SCREENSCRAPER_SSID";
const ENV_USER_PASSWORD: &str = "SCREENSCRAPER_SSPASSWORD";

/// Credentials for authenticating with the ScreenScraper API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub dev_id: String,
    pub dev_password: String,
    pub soft_name: String,
    pub user_id: Option<String>,
    pub user_password: Option<String>,
}

/// Where a credential field's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Hard-coded default value.
    Default,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of each credential field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSources {
    pub dev_id: CredentialSource,
    pub dev_password: CredentialSource,
    pub soft_name: CredentialSource,
    pub user_id: CredentialSource,
    pub user_password: CredentialSource,
}

/// TOML config file format.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct ConfigFile {
    screenscraper: Option<ScreenScraperConfig>,
}

#[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
struct ScreenScraperConfig {
    dev_id: Option<String>,
    dev_password: Option<String>,
    soft_name: Option<String>,
    user_id: Option<String>,
    user_password: Option<String>,
}

/// A resolved field: the value (if any) and where it came from.
struct Resolved {
    value: Option<String>,
    source: CredentialSource,
}

fn resolve(
    env: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
    file_value: &Option<String>,
) -> Resolved {
    if let Some(v) = env(var).filter(|v| !v.is_empty()) {
        return Resolved {
            value: Some(v),
            source: CredentialSource::EnvVar(var),
        };
    }
    match file_value.as_ref().filter(|v| !v.is_empty()) {
        Some(v) => Resolved {
            value: Some(v.clone()),
            source: CredentialSource::ConfigFile,
        },
        None => Resolved {
            value: None,
            source: CredentialSource::Missing,
        },
    }
}

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

impl Credentials {
    /// Load credentials from environment variables or the config file.
    ///
    /// Priority: env vars > config file.
    /// Required: dev_id, dev_password. soft_name defaults to "retro-art".
    /// Optional: user_id, user_password.
    pub fn load() -> Result<Self, ScrapeError> {
        let path = config_path();
        Self::load_with(path.as_deref(), &process_env)
    }

    /// Load from a specific file with an injectable environment lookup.
    pub fn load_with(
        path: Option<&Path>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ScrapeError> {
        let config = path.and_then(load_config_file).unwrap_or_default();

        let dev_id = resolve(env, ENV_DEV_ID, &config.dev_id).value.ok_or_else(|| {
            ScrapeError::Config(format!(
                "Missing dev_id. Set {ENV_DEV_ID} env var or add to config file"
            ))
        })?;
        let dev_password = resolve(env, ENV_DEV_PASSWORD, &config.dev_password)
            .value
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "Missing dev_password. Set {ENV_DEV_PASSWORD} env var or add to config file"
                ))
            })?;
        let soft_name = resolve(env, ENV_SOFT_NAME, &config.soft_name)
            .value
            .unwrap_or_else(|| DEFAULT_SOFT_NAME.to_string());

        Ok(Self {
            dev_id,
            dev_password,
            soft_name,
            user_id: resolve(env, ENV_USER_ID, &config.user_id).value,
            user_password: resolve(env, ENV_USER_PASSWORD, &config.user_password).value,
        })
    }
}

/// Return the path to the credentials config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("retro-art").join("credentials.toml"))
}

/// Save credentials to `path`, creating parent directories as needed.
///
/// The default soft name is left out of the file.
pub fn save_to_file(creds: &Credentials, path: &Path) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = ConfigFile {
        screenscraper: Some(ScreenScraperConfig {
            dev_id: Some(creds.dev_id.clone()),
            dev_password: Some(creds.dev_password.clone()),
            soft_name: (creds.soft_name != DEFAULT_SOFT_NAME).then(|| creds.soft_name.clone()),
            user_id: creds.user_id.clone(),
            user_password: creds.user_password.clone(),
        }),
    };

    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| ScrapeError::Config(format!("Failed to serialize config: {}", e)))?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, toml_str)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Determine where each credential field is coming from.
pub fn credential_sources() -> CredentialSources {
    let path = config_path();
    credential_sources_with(path.as_deref(), &process_env)
}

pub fn credential_sources_with(
    path: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> CredentialSources {
    let config = path.and_then(load_config_file).unwrap_or_default();

    let soft_name = match resolve(env, ENV_SOFT_NAME, &config.soft_name).source {
        CredentialSource::Missing => CredentialSource::Default,
        other => other,
    };

    CredentialSources {
        dev_id: resolve(env, ENV_DEV_ID, &config.dev_id).source,
        dev_password: resolve(env, ENV_DEV_PASSWORD, &config.dev_password).source,
        soft_name,
        user_id: resolve(env, ENV_USER_ID, &config.user_id).source,
        user_password: resolve(env, ENV_USER_PASSWORD, &config.user_password).source,
    }
}

fn load_config_file(path: &Path) -> Option<ScreenScraperConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<ConfigFile>(&content) {
        Ok(config) => config.screenscraper,
        Err(e) => {
            log::warn!("Ignoring unreadable credentials file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("credentials.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[screenscraper]\ndev_id = \"file-id\"\ndev_password = \"file-pw\"\nuser_id = \"me\"\n",
        );
        let env = env_of(&[(ENV_DEV_ID, "env-id")]);

        let creds = Credentials::load_with(Some(&path), &env).unwrap();
        assert_eq!(creds.dev_id, "env-id");
        assert_eq!(creds.dev_password, "file-pw");
        assert_eq!(creds.soft_name, "retro-art");
        assert_eq!(creds.user_id.as_deref(), Some("me"));
        assert_eq!(creds.user_password, None);

        let sources = credential_sources_with(Some(&path), &env);
        assert_eq!(sources.dev_id, CredentialSource::EnvVar(ENV_DEV_ID));
        assert_eq!(sources.dev_password, CredentialSource::ConfigFile);
        assert_eq!(sources.soft_name, CredentialSource::Default);
        assert_eq!(sources.user_password, CredentialSource::Missing);
    }

    #[test]
    fn test_missing_dev_credentials_is_config_error() {
        let env = env_of(&[(ENV_DEV_ID, "id")]);
        assert!(matches!(
            Credentials::load_with(None, &env),
            Err(ScrapeError::Config(_))
        ));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let env = env_of(&[(ENV_DEV_ID, ""), (ENV_DEV_PASSWORD, "pw")]);
        assert!(Credentials::load_with(None, &env).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");
        let creds = Credentials {
            dev_id: "id".to_string(),
            dev_password: "pw".to_string(),
            soft_name: DEFAULT_SOFT_NAME.to_string(),
            user_id: Some("me".to_string()),
            user_password: Some("secret".to_string()),
        };
        save_to_file(&creds, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("soft_name"));

        let loaded = Credentials::load_with(Some(&path), &env_of(&[])).unwrap();
        assert_eq!(loaded, creds);
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[screenscraper\n");
        let env = env_of(&[(ENV_DEV_ID, "id"), (ENV_DEV_PASSWORD, "pw")]);
        let creds = Credentials::load_with(Some(&path), &env).unwrap();
        assert_eq!(creds.dev_id, "id");
    }
}
