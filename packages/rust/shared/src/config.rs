//! Application configuration for qbank.
//!
//! User config lives at `~/.qbank/qbank.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QbankError, Result};
use crate::types::RuleDef;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qbank.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qbank";

// ---------------------------------------------------------------------------
// Config structs (matching qbank.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Stage input/output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Fixed-window chunking bounds.
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Extra rules appended after the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleDef>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Lecture index CSV.
    #[serde(default = "default_index")]
    pub index: PathBuf,

    /// Directory of raw `*.txt` placeholders.
    #[serde(default = "default_placeholders")]
    pub placeholders: PathBuf,

    /// Directory of annotated `*.md` documents.
    #[serde(default = "default_transcripts")]
    pub transcripts: PathBuf,

    /// Directory of per-video segment streams.
    #[serde(default = "default_segments")]
    pub segments: PathBuf,

    /// Draft bank written by the rule engine.
    #[serde(default = "default_draft_bank")]
    pub draft_bank: PathBuf,

    /// Curated bank; when set, `run` packs from it instead of the draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_bank: Option<PathBuf>,

    /// Output directory for packed sets.
    #[serde(default = "default_qbank")]
    pub qbank: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            placeholders: default_placeholders(),
            transcripts: default_transcripts(),
            segments: default_segments(),
            draft_bank: default_draft_bank(),
            final_bank: None,
            qbank: default_qbank(),
        }
    }
}

fn default_index() -> PathBuf {
    "data/index.csv".into()
}
fn default_placeholders() -> PathBuf {
    "data/placeholders".into()
}
fn default_transcripts() -> PathBuf {
    "data/transcripts".into()
}
fn default_segments() -> PathBuf {
    "data/segments".into()
}
fn default_draft_bank() -> PathBuf {
    "data/draft/qbank_draft.jsonl".into()
}
fn default_qbank() -> PathBuf {
    "data/qbank".into()
}

/// `[segmenter]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Upper bound, in characters, of a fixed-window chunk.
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// A newline break is accepted only at or past `min_len / 2`.
    #[serde(default = "default_min_len")]
    pub min_len: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            min_len: default_min_len(),
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(QbankError::config("segmenter.max_len must be positive"));
        }
        Ok(())
    }
}

fn default_max_len() -> usize {
    900
}
fn default_min_len() -> usize {
    600
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qbank/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| QbankError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.qbank/qbank.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QbankError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| QbankError::config(format!("failed to parse {}: {e}", path.display())))?;

    config.segmenter.validate()?;
    for rule in &config.rules {
        rule.validate()?;
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| QbankError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QbankError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QbankError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
