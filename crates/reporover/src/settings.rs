//! The configuration collaborator consumed by the registry and the sync engine.
//!
//! The core never reads configuration files itself. Callers hand it a
//! [`ConfigStore`]; the CLI provides a file-backed one and tests use
//! [`MemoryConfigStore`].

use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by a configuration store.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// Reading or writing the backing file failed.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be parsed or updated.
    #[error("invalid config document: {0}")]
    Format(String),
}

/// Credentials and coordinates for the external repository source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCredentials {
    pub organization: String,
    pub project: String,
    pub token: String,
}

impl SourceCredentials {
    /// Overlay non-empty overrides on top of these values.
    #[must_use]
    pub fn merged_with(mut self, overrides: &SourceCredentials) -> Self {
        if !overrides.organization.is_empty() {
            self.organization = overrides.organization.clone();
        }
        if !overrides.project.is_empty() {
            self.project = overrides.project.clone();
        }
        if !overrides.token.is_empty() {
            self.token = overrides.token.clone();
        }
        self
    }

    /// Whether every field is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organization.is_empty() && self.project.is_empty() && self.token.is_empty()
    }

    /// Names of required fields that are still empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.organization.trim().is_empty() {
            missing.push("organization");
        }
        if self.project.trim().is_empty() {
            missing.push("project");
        }
        if self.token.trim().is_empty() {
            missing.push("token");
        }
        missing
    }
}

/// Read/write access to the settings the core depends on.
pub trait ConfigStore: Send + Sync {
    /// The currently active group, if any.
    fn active_group(&self) -> Result<Option<String>, ConfigStoreError>;

    fn set_active_group(&self, name: &str) -> Result<(), ConfigStoreError>;

    /// Clear the active group when it equals `name`. Returns whether it was cleared.
    fn clear_active_group_if_matches(&self, name: &str) -> Result<bool, ConfigStoreError>;

    fn source_credentials(&self) -> Result<SourceCredentials, ConfigStoreError>;

    fn save_source_credentials(
        &self,
        credentials: &SourceCredentials,
    ) -> Result<(), ConfigStoreError>;
}

/// In-memory [`ConfigStore`], useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    inner: Mutex<MemoryConfigInner>,
}

#[derive(Debug, Default)]
struct MemoryConfigInner {
    active_group: Option<String>,
    credentials: SourceCredentials,
    credential_saves: usize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given credentials already configured.
    pub fn with_credentials(credentials: SourceCredentials) -> Self {
        Self {
            inner: Mutex::new(MemoryConfigInner {
                credentials,
                ..MemoryConfigInner::default()
            }),
        }
    }

    /// How many times credentials were written back.
    pub fn credential_saves(&self) -> usize {
        self.lock().map(|inner| inner.credential_saves).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryConfigInner>, ConfigStoreError> {
        self.inner
            .lock()
            .map_err(|_| ConfigStoreError::Format("config store lock poisoned".to_string()))
    }
}

impl ConfigStore for MemoryConfigStore {
    fn active_group(&self) -> Result<Option<String>, ConfigStoreError> {
        Ok(self.lock()?.active_group.clone())
    }

    fn set_active_group(&self, name: &str) -> Result<(), ConfigStoreError> {
        self.lock()?.active_group = Some(name.to_string());
        Ok(())
    }

    fn clear_active_group_if_matches(&self, name: &str) -> Result<bool, ConfigStoreError> {
        let mut inner = self.lock()?;
        if inner.active_group.as_deref() == Some(name) {
            inner.active_group = None;
            return Ok(true);
        }
        Ok(false)
    }

    fn source_credentials(&self) -> Result<SourceCredentials, ConfigStoreError> {
        Ok(self.lock()?.credentials.clone())
    }

    fn save_source_credentials(
        &self,
        credentials: &SourceCredentials,
    ) -> Result<(), ConfigStoreError> {
        let mut inner = self.lock()?;
        inner.credentials = credentials.clone();
        inner.credential_saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(org: &str, project: &str, token: &str) -> SourceCredentials {
        SourceCredentials {
            organization: org.to_string(),
            project: project.to_string(),
            token: token.to_string(),
        }
    }

    #[test]
    fn merged_with_only_replaces_non_empty_overrides() {
        let base = creds("org", "proj", "secret");
        let merged = base.merged_with(&creds("", "other", ""));
        assert_eq!(merged, creds("org", "other", "secret"));
    }

    #[test]
    fn missing_fields_reports_blank_values() {
        assert_eq!(
            creds("", " ", "t").missing_fields(),
            vec!["organization", "project"]
        );
        assert!(creds("o", "p", "t").missing_fields().is_empty());
    }

    #[test]
    fn clear_active_group_only_when_matching() {
        let store = MemoryConfigStore::new();
        store.set_active_group("alpha").unwrap();

        assert!(!store.clear_active_group_if_matches("beta").unwrap());
        assert_eq!(store.active_group().unwrap().as_deref(), Some("alpha"));

        assert!(store.clear_active_group_if_matches("alpha").unwrap());
        assert!(store.active_group().unwrap().is_none());
    }

    #[test]
    fn save_source_credentials_counts_writes() {
        let store = MemoryConfigStore::with_credentials(creds("o", "p", "t"));
        assert_eq!(store.credential_saves(), 0);

        store.save_source_credentials(&creds("o2", "p2", "t2")).unwrap();

        assert_eq!(store.credential_saves(), 1);
        assert_eq!(store.source_credentials().unwrap(), creds("o2", "p2", "t2"));
    }
}
