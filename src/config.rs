//! Configuration file handling for rollup.
//!
//! The configuration file is stored at `$ROLLUP_HOME/config.json`. It names the workbook that
//! holds the tables and, optionally, the names of the tables the pipeline reads and writes.

use crate::api::{CsvWorkbook, CATEGORIES, CONFIG, DATA, OPERATION};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "rollup";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const WORKBOOK_DIR: &str = "workbook";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$ROLLUP_HOME` and from there it loads `$ROLLUP_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, an initial `config.json` and a CSV workbook with the standard
    /// tables.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the home directory, e.g. `$HOME/rollup`
    /// - `workbook` - Where the workbook directory goes. Defaults to `$ROLLUP_HOME/workbook`. A
    ///   relative path is resolved against the home directory.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail, or if `config.json` already exists.
    pub async fn create(dir: impl Into<PathBuf>, workbook: Option<&Path>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the rollup home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!("The config file already exists '{}'", config_path.display())
        }

        let workbook_path = workbook
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(WORKBOOK_DIR));
        let config_file = ConfigFile {
            workbook_path,
            ..ConfigFile::default()
        };

        let config = Self {
            root,
            config_path,
            config_file,
        };
        CsvWorkbook::create(config.workbook_path())
            .await
            .context("Unable to create the workbook")?;
        config.config_file.save(&config.config_path).await?;
        Ok(config)
    }

    /// This will
    /// - validate that `rollup_home` exists and that the config file exists
    /// - load the config file
    /// - return the loaded configuration object
    pub async fn load(rollup_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = rollup_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Rollup Home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the stored `workbook_path` if it is absolute, otherwise resolves it against the
    /// home directory.
    pub fn workbook_path(&self) -> PathBuf {
        let p = &self.config_file.workbook_path;
        if p.is_absolute() {
            return p.clone();
        }
        self.root.join(p)
    }

    pub fn tables(&self) -> &Tables {
        &self.config_file.tables
    }
}

/// The names of the tables the program reads and writes.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    /// The table holding the raw data rows.
    pub data: String,
    /// The table that receives the rollup.
    pub operation: String,
    /// The table holding category colors.
    pub categories: String,
    /// The key/value table of chart settings.
    pub config: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            data: DATA.to_string(),
            operation: OPERATION.to_string(),
            categories: CATEGORIES.to_string(),
            config: CONFIG.to_string(),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "rollup",
///   "config_version": 1,
///   "workbook_path": "workbook",
///   "tables": {
///     "data": "data",
///     "operation": "operation",
///     "categories": "categories",
///     "config": "config"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "rollup"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the workbook directory (relative to the home directory or absolute)
    workbook_path: PathBuf,

    /// Table names, each defaulting to its standard name when absent
    #[serde(default)]
    tables: Tables,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            workbook_path: PathBuf::from(WORKBOOK_DIR),
            tables: Tables::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if `app_name` is wrong.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
