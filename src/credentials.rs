//! API keys for the search and model endpoints.
//!
//! Keys come from the runtime `.env` file, which must be private to the
//! owner. Keys the file leaves out can be filled from the process
//! environment, so CI runs work without writing a file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;

/// Yandex Cloud folder (catalog) id, used by search and model URIs.
pub const YANDEX_FOLDER_ID: &str = "YANDEX_FOLDER_ID";
/// API key for the Yandex XML search endpoint.
pub const YANDEX_SEARCH_API_KEY: &str = "YANDEX_SEARCH_API_KEY";
/// API key for Yandex foundation models.
pub const YANDEX_MODELS_API_KEY: &str = "YANDEX_MODELS_API_KEY";
/// Bearer token for the OpenAI-compatible chat gateway.
pub const CHAT_API_KEY: &str = "CHAT_API_KEY";

/// Every key ghostwriter reads.
pub const KNOWN_KEYS: [&str; 4] = [
    YANDEX_FOLDER_ID,
    YANDEX_SEARCH_API_KEY,
    YANDEX_MODELS_API_KEY,
    CHAT_API_KEY,
];

/// Folder and key pair for the XML search endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchKeys {
    /// Yandex Cloud folder id.
    pub folder_id: String,
    /// Search API key.
    pub api_key: String,
}

impl std::fmt::Debug for SearchKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchKeys")
            .field("folder_id", &self.folder_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Runtime credentials loaded from the `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a non-empty credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns a required credential or an error when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the key does not exist in loaded credentials.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }

    /// Search keys, when both the folder id and the search key are set.
    pub fn search_keys(&self) -> Option<SearchKeys> {
        Some(SearchKeys {
            folder_id: self.get(YANDEX_FOLDER_ID)?.to_owned(),
            api_key: self.get(YANDEX_SEARCH_API_KEY)?.to_owned(),
        })
    }

    /// Fill [`KNOWN_KEYS`] that are missing or blank from `lookup`.
    ///
    /// Values already loaded from the file are kept.
    pub fn fill_missing_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for key in KNOWN_KEYS {
            if self.get(key).is_some() {
                continue;
            }
            if let Some(value) = lookup(key).filter(|value| !value.trim().is_empty()) {
                self.vars.insert(key.to_owned(), value);
            }
        }
        self
    }
}

/// Load credentials from a specific `.env` path.
///
/// # Errors
///
/// Returns an error if the file does not exist, permissions are too broad,
/// or parsing fails.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "credentials file does not exist: {}",
            path.display()
        ));
    }

    validate_private_permissions(path)?;

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    Ok(Credentials { vars })
}

#[cfg(unix)]
fn validate_private_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to inspect credentials file {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;

    if mode & 0o077 != 0 {
        return Err(anyhow::anyhow!(
            "credentials file {} must be 0600, found {:o}",
            path.display(),
            mode
        ));
    }

    Ok(())
}

#[cfg(not(unix))]
fn validate_private_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
