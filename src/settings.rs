use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::llm::ProviderId;

const API_KEY_XOR_KEY: &[u8] = b"portfolio-ai-local-key-v1";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings backend error: {0}")]
    Backend(String),
}

/// Per-user overrides for provider choice and credentials
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSettings {
    pub preferred_provider: Option<ProviderId>,
    pub gemini_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
}

/// Where per-user settings come from (a hosted table, a local file, ...)
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// `Ok(None)` when the user has never saved settings
    async fn load(&self) -> Result<Option<UserSettings>, SettingsError>;
}

/// On-disk form; keys never touch the file in clear text
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct StoredSettings {
    preferred_ai_provider: Option<String>,
    gemini_api_key_obfuscated: Option<String>,
    openrouter_api_key_obfuscated: Option<String>,
}

/// JSON file settings store
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is `None`; a corrupt file is backed up and treated as missing
    pub fn load_sync(&self) -> Result<Option<UserSettings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<StoredSettings>(&raw) {
            Ok(stored) => Ok(Some(decode(stored))),
            Err(e) => {
                let backup = self.path.with_extension("json.bak");
                tracing::warn!(
                    "Corrupt settings file {}: {}. Backing up to {}",
                    self.path.display(),
                    e,
                    backup.display()
                );
                fs::copy(&self.path, &backup)?;
                fs::remove_file(&self.path)?;
                Ok(None)
            }
        }
    }

    pub fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(&encode(settings))?;
        fs::write(&self.path, json)?;
        tracing::info!("Saved user settings to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SettingsSource for FileSettingsStore {
    async fn load(&self) -> Result<Option<UserSettings>, SettingsError> {
        self.load_sync()
    }
}

/// Render a key for display without revealing it
pub fn mask_api_key(api_key: &str) -> String {
    if api_key.len() <= 10 || !api_key.is_ascii() {
        return "******".to_string();
    }

    let prefix = &api_key[..6];
    let suffix = &api_key[api_key.len().saturating_sub(4)..];
    format!("{}********{}", prefix, suffix)
}

fn encode(settings: &UserSettings) -> StoredSettings {
    StoredSettings {
        preferred_ai_provider: settings.preferred_provider.map(|p| p.as_str().to_string()),
        gemini_api_key_obfuscated: normalize_key(settings.gemini_api_key.as_deref())
            .map(|k| obfuscate_api_key(&k)),
        openrouter_api_key_obfuscated: normalize_key(settings.openrouter_api_key.as_deref())
            .map(|k| obfuscate_api_key(&k)),
    }
}

fn decode(stored: StoredSettings) -> UserSettings {
    let preferred_provider = stored.preferred_ai_provider.as_deref().and_then(|name| {
        let parsed = ProviderId::parse(name);
        if parsed.is_none() {
            tracing::warn!("Ignoring unknown preferred provider '{}'", name);
        }
        parsed
    });

    UserSettings {
        preferred_provider,
        gemini_api_key: stored
            .gemini_api_key_obfuscated
            .as_deref()
            .and_then(deobfuscate_api_key),
        openrouter_api_key: stored
            .openrouter_api_key_obfuscated
            .as_deref()
            .and_then(deobfuscate_api_key),
    }
}

fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

fn obfuscate_api_key(api_key: &str) -> String {
    let mut bytes = api_key.as_bytes().to_vec();
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= API_KEY_XOR_KEY[idx % API_KEY_XOR_KEY.len()];
    }
    BASE64_STANDARD.encode(bytes)
}

fn deobfuscate_api_key(obfuscated: &str) -> Option<String> {
    let mut bytes = BASE64_STANDARD.decode(obfuscated).ok()?;
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= API_KEY_XOR_KEY[idx % API_KEY_XOR_KEY.len()];
    }
    String::from_utf8(bytes).ok()
}
