//! Settings groups (general, appearance, database) persisted as a single
//! JSON file under the app config directory, with an in-memory cache.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Japanese => "ja",
            Self::English => "en",
        }
    }
}

impl FromStr for Language {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" | "japanese" => Ok(Self::Japanese),
            "en" | "english" => Ok(Self::English),
            _ => Err(SettingsError::Validation(format!(
                "Invalid language: '{s}'. Expected 'ja' or 'en'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "dark")]
    Dark,
    #[default]
    #[serde(rename = "system")]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(SettingsError::Validation(format!(
                "Invalid theme: '{s}'. Expected 'light', 'dark', or 'system'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralSettings {
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppearanceSettings {
    pub theme: Theme,
}

/// An empty `database_directory` means "use the app data directory"; the
/// concrete default is resolved on read, never written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseSettings {
    pub database_directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub appearance: AppearanceSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// File-backed settings store. Reads go through an async cache so repeated
/// screen visits do not hit the filesystem; every write refreshes both the
/// file and the cache.
pub struct SettingsStore {
    config_dir: PathBuf,
    default_db_dir: PathBuf,
    cache: RwLock<Option<Settings>>,
}

impl SettingsStore {
    pub fn new(config_dir: PathBuf, default_db_dir: PathBuf) -> Self {
        Self {
            config_dir,
            default_db_dir,
            cache: RwLock::new(None),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    async fn load(&self) -> Result<Settings, SettingsError> {
        if let Some(settings) = self.cache.read().await.as_ref() {
            return Ok(settings.clone());
        }

        let path = self.file_path();
        let settings = match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(err) => return Err(err.into()),
        };

        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        fs::create_dir_all(&self.config_dir).await?;
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(self.file_path(), raw).await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(())
    }

    pub async fn general(&self) -> Result<GeneralSettings, SettingsError> {
        Ok(self.load().await?.general)
    }

    pub async fn appearance(&self) -> Result<AppearanceSettings, SettingsError> {
        Ok(self.load().await?.appearance)
    }

    pub async fn database(&self) -> Result<DatabaseSettings, SettingsError> {
        let database = self.load().await?.database;
        Ok(DatabaseSettings {
            database_directory: self.resolve_database_directory(&database.database_directory),
        })
    }

    pub async fn update_general(
        &self,
        language: Option<String>,
    ) -> Result<GeneralSettings, SettingsError> {
        let mut settings = self.load().await?;
        if let Some(language) = language {
            settings.general.language = language.parse()?;
        }
        self.save(&settings).await?;
        Ok(settings.general)
    }

    pub async fn update_appearance(
        &self,
        theme: Option<String>,
    ) -> Result<AppearanceSettings, SettingsError> {
        let mut settings = self.load().await?;
        if let Some(theme) = theme {
            settings.appearance.theme = theme.parse()?;
        }
        self.save(&settings).await?;
        Ok(settings.appearance)
    }

    pub async fn update_database(
        &self,
        database_directory: Option<String>,
    ) -> Result<DatabaseSettings, SettingsError> {
        let mut settings = self.load().await?;
        if let Some(directory) = database_directory {
            validate_database_directory(&directory)?;
            settings.database.database_directory = directory;
        }
        self.save(&settings).await?;
        Ok(DatabaseSettings {
            database_directory: self
                .resolve_database_directory(&settings.database.database_directory),
        })
    }

    /// Delete the settings file and fall back to defaults on the next read.
    pub async fn reset(&self) -> Result<(), SettingsError> {
        let path = self.file_path();
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *self.cache.write().await = None;
        tracing::debug!(target: "libretto", "settings reset to defaults");
        Ok(())
    }

    fn resolve_database_directory(&self, stored: &str) -> String {
        if stored.is_empty() {
            self.default_db_dir.display().to_string()
        } else {
            stored.to_string()
        }
    }
}

fn validate_database_directory(directory: &str) -> Result<(), SettingsError> {
    if directory.is_empty() {
        // Empty resets to the default data directory.
        return Ok(());
    }
    let path = Path::new(directory);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(SettingsError::Validation(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }
    }
    Ok(())
}
