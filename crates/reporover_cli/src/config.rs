//! Configuration file support for reporover.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `REPOROVER_`, `__` between nested keys,
//!    e.g. `REPOROVER_INTEGRATIONS__AZURE__API_TOKEN`)
//! 3. Local config file (`./reporover.toml`)
//! 4. User config file (`~/.config/reporover/config.toml`)
//! 5. Built-in defaults
//!
//! A `.env` file in the working directory is loaded into the environment
//! before any of this happens.
//!
//! After the layers are merged, `$VAR` and `${VAR}` references in any string
//! value are expanded from the environment, and a leading `~/` in `paths.*`
//! resolves to the home directory.
//!
//! Example config file:
//! ```toml
//! active_group = "platform"
//! concurrency = 10
//!
//! [paths]
//! groups_root = "~/.local/share/reporover/groups"
//!
//! [integrations.azure]
//! enabled = true
//! organization = "acme"
//! project = "platform"
//! api_token = "${AZURE_DEVOPS_PAT}"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as Settings, ConfigError, Environment, File, FileFormat};
use directories::{BaseDirs, ProjectDirs};
use reporover::settings::{ConfigStore, ConfigStoreError, SourceCredentials};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use toml_edit::{DocumentMut, value};

/// Application name used for config, data, and state directories.
const APP_NAME: &str = "reporover";

/// Environment variable prefix.
const ENV_PREFIX: &str = "REPOROVER";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Group used when a command is not given `--group`.
    pub active_group: String,
    /// Branch stored for synced repositories that report none.
    pub default_branch: String,
    /// Maximum concurrent enrichment requests during a sync.
    #[serde(deserialize_with = "scalar")]
    pub concurrency: usize,
    pub paths: PathsConfig,
    pub credentials: CredentialsConfig,
    pub integrations: IntegrationsConfig,
    /// Command aliases, name to expansion.
    pub aliases: BTreeMap<String, String>,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one subdirectory per group.
    pub groups_root: PathBuf,
    /// Scratch directory.
    pub temp: PathBuf,
}

/// Git credential helper settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub helper: String,
    /// Seconds a cached credential stays valid.
    #[serde(deserialize_with = "scalar")]
    pub timeout: u64,
}

/// External repository hosts.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub azure: AzureConfig,
}

/// Azure DevOps integration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureConfig {
    #[serde(deserialize_with = "scalar")]
    pub enabled: bool,
    /// Host URL; empty means `https://dev.azure.com`.
    pub url: String,
    /// Personal access token.
    /// Can also be set via REPOROVER_INTEGRATIONS__AZURE__API_TOKEN.
    pub api_token: String,
    pub organization: String,
    pub project: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_group: "default".to_string(),
            default_branch: "main".to_string(),
            concurrency: reporover::sync::DEFAULT_CONCURRENCY,
            paths: PathsConfig::default(),
            credentials: CredentialsConfig::default(),
            integrations: IntegrationsConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            groups_root: Config::default_groups_root(),
            temp: PathBuf::from("/tmp/reporover/"),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            helper: "cache".to_string(),
            timeout: 3600,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Never fails: a config that cannot be read or decoded is logged and
    /// replaced by the defaults.
    pub fn load() -> Self {
        let mut files = Vec::new();
        if let Some(user_config) = Self::default_config_path()
            && user_config.exists()
        {
            files.push(user_config);
        }
        let local_config = PathBuf::from(format!("{APP_NAME}.toml"));
        if local_config.exists() {
            files.push(local_config);
        }

        match Self::load_from(&files, true, |name| std::env::var(name).ok()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        }
    }

    /// Build a config from `files` (lowest precedence first), optionally the
    /// process environment, and the defaults, expanding variables with `lookup`.
    pub fn load_from(
        files: &[PathBuf],
        use_env: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = with_defaults(Settings::builder())?;

        for file in files {
            tracing::debug!(path = %file.display(), "Loading config file");
            builder = builder.add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if use_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        Self::decode(builder.build()?, lookup)
    }

    /// Expand variables over the merged tree, then decode the typed struct.
    fn decode(
        settings: Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut tree: Value = settings.try_deserialize()?;
        expand_tree(&mut tree, &lookup);

        let mut config: Config =
            serde_json::from_value(tree).map_err(|e| ConfigError::Message(e.to_string()))?;
        config.paths.groups_root = expand_home(&config.paths.groups_root);
        config.paths.temp = expand_home(&config.paths.temp);
        Ok(config)
    }

    /// Credentials for the Azure integration as the core sees them.
    pub fn source_credentials(&self) -> SourceCredentials {
        let azure = &self.integrations.azure;
        SourceCredentials {
            organization: azure.organization.clone(),
            project: azure.project.clone(),
            token: azure.api_token.clone(),
        }
    }

    /// The active group, if one is set.
    pub fn active_group(&self) -> Option<&str> {
        let name = self.active_group.trim();
        (!name.is_empty()).then_some(name)
    }

    /// A copy with secrets replaced, for display.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.integrations.azure.api_token = mask_secret(&copy.integrations.azure.api_token);
        copy
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// `<data_dir>/groups`, or `./groups` when no home directory is known.
    pub fn default_groups_root() -> PathBuf {
        Self::default_data_dir()
            .map(|dir| dir.join("groups"))
            .unwrap_or_else(|| PathBuf::from("groups"))
    }
}

/// The explicit default-value table, lowest layer of every load.
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::default();
    builder
        .set_default("active_group", defaults.active_group)?
        .set_default("default_branch", defaults.default_branch)?
        .set_default("concurrency", defaults.concurrency as u64)?
        .set_default(
            "paths.groups_root",
            defaults.paths.groups_root.to_string_lossy().into_owned(),
        )?
        .set_default("paths.temp", defaults.paths.temp.to_string_lossy().into_owned())?
        .set_default("credentials.helper", defaults.credentials.helper)?
        .set_default("credentials.timeout", defaults.credentials.timeout)?
        .set_default("integrations.azure.enabled", false)?
        .set_default("integrations.azure.url", "")?
        .set_default("integrations.azure.api_token", "")?
        .set_default("integrations.azure.organization", "")?
        .set_default("integrations.azure.project", "")
}

/// Recursively expand environment references in every string of `tree`.
fn expand_tree(tree: &mut Value, lookup: &impl Fn(&str) -> Option<String>) {
    match tree {
        Value::String(s) if s.contains('$') => *s = expand_vars(s, lookup),
        Value::Array(items) => items.iter_mut().for_each(|item| expand_tree(item, lookup)),
        Value::Object(map) => map.values_mut().for_each(|item| expand_tree(item, lookup)),
        _ => {}
    }
}

/// Accept either a native scalar or its string form, so values that came
/// through the environment or `$VAR` expansion still decode.
fn scalar<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Native(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Expand `$NAME` and `${NAME}` in `input`. Unset variables expand to "".
pub fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                out.push_str(&lookup(name).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
            // Unterminated: keep literally.
            out.push('$');
            rest = after;
            continue;
        }

        let name_len = after
            .char_indices()
            .take_while(|&(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
            .count();
        if name_len == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        out.push_str(&lookup(name).unwrap_or_default());
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}

/// Resolve a leading `~/` against the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("********{tail}")
    }
}

/// [`ConfigStore`] backed by the loaded [`Config`] and the user config file.
///
/// Reads come from the effective configuration. Writes update the in-memory
/// copy and the touched keys of the config file, preserving its formatting
/// and comments.
pub struct FileConfigStore {
    path: PathBuf,
    config: Mutex<Config>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config: Mutex::new(config),
        }
    }

    /// Store writing to the default user config file.
    pub fn open_default(config: Config) -> Result<Self, ConfigStoreError> {
        let path = Config::default_config_path().ok_or_else(|| {
            ConfigStoreError::Format("could not determine config directory".to_string())
        })?;
        Ok(Self::new(path, config))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Config>, ConfigStoreError> {
        self.config
            .lock()
            .map_err(|_| ConfigStoreError::Format("config lock poisoned".to_string()))
    }

    /// Apply `edit` to the config file document and write it back.
    fn update_file(&self, edit: impl FnOnce(&mut DocumentMut)) -> Result<(), ConfigStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = content
            .parse()
            .map_err(|e| ConfigStoreError::Format(format!("invalid TOML in {}: {e}", self.path.display())))?;
        edit(&mut doc);

        fs::write(&self.path, doc.to_string())?;
        tracing::debug!(path = %self.path.display(), "Updated config file");
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn active_group(&self) -> Result<Option<String>, ConfigStoreError> {
        Ok(self.lock()?.active_group().map(str::to_string))
    }

    fn set_active_group(&self, name: &str) -> Result<(), ConfigStoreError> {
        self.update_file(|doc| doc["active_group"] = value(name))?;
        self.lock()?.active_group = name.to_string();
        Ok(())
    }

    fn clear_active_group_if_matches(&self, name: &str) -> Result<bool, ConfigStoreError> {
        if self.lock()?.active_group() != Some(name) {
            return Ok(false);
        }
        self.update_file(|doc| doc["active_group"] = value(""))?;
        self.lock()?.active_group = String::new();
        Ok(true)
    }

    fn source_credentials(&self) -> Result<SourceCredentials, ConfigStoreError> {
        Ok(self.lock()?.source_credentials())
    }

    /// Write the fields that differ from the effective configuration.
    ///
    /// Unchanged fields keep their raw file text, so `${VAR}` references and
    /// values supplied through the environment are never written out.
    fn save_source_credentials(
        &self,
        credentials: &SourceCredentials,
    ) -> Result<(), ConfigStoreError> {
        let current = self.lock()?.source_credentials();
        let changed: Vec<(&str, &str)> = [
            ("organization", &current.organization, &credentials.organization),
            ("project", &current.project, &credentials.project),
            ("api_token", &current.token, &credentials.token),
        ]
        .into_iter()
        .filter(|(_, old, new)| old != new)
        .map(|(key, _, new)| (key, new.as_str()))
        .collect();

        if changed.is_empty() {
            tracing::debug!("Credentials unchanged; config file left as is");
            return Ok(());
        }

        self.update_file(|doc| {
            if !doc.contains_key("integrations") {
                let mut integrations = toml_edit::table();
                if let Some(t) = integrations.as_table_mut() {
                    t.set_implicit(true);
                }
                doc["integrations"] = integrations;
            }
            let azure = &mut doc["integrations"]["azure"];
            if azure.is_none() {
                *azure = toml_edit::table();
            }
            for (key, new) in &changed {
                azure[*key] = value(*new);
            }
        })?;

        let mut config = self.lock()?;
        let azure = &mut config.integrations.azure;
        azure.organization = credentials.organization.clone();
        azure.project = credentials.project.clone();
        azure.api_token = credentials.token.clone();
        Ok(())
    }
}
