//! Configuration system for papermap.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/papermap/config.toml` and/or `.papermap/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::filter::FilterDimension;
use crate::grouping::GroupingOptions;
use crate::selection::ListPanelDefault;
use crate::tracks::TrackSelection;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PapermapConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub keyword_map: KeywordMapConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where the static JSON files come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory path or `http(s)://` base URL holding `papers.json` and friends.
    pub base: String,
    /// Track to restrict the views to.
    #[serde(default)]
    pub track: TrackSelection,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base: ".".to_string(),
            track: TrackSelection::All,
            timeout_secs: 30,
        }
    }
}

/// Catalog (card list) behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Dimension the search box binds to when the URL names none.
    pub default_filter: FilterDimension,
    /// Shuffle cards after loading.
    pub shuffle_on_load: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_filter: FilterDimension::Titles,
            shuffle_on_load: true,
        }
    }
}

/// Keyword map (treemap) behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordMapConfig {
    /// What the linked list panel shows before any click.
    #[serde(default)]
    pub list_default: ListPanelDefault,
    #[serde(default)]
    pub grouping: GroupingOptions,
}

/// Rendering-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Quiet period before a burst of resize events triggers one re-render.
    pub resize_debounce_ms: u64,
    /// Column width used when printing cards.
    pub card_width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 150,
            card_width: 80,
        }
    }
}

impl UiConfig {
    pub fn resize_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.resize_debounce_ms)
    }
}

/// Read-marks storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store name; also the file stem in the data directory.
    pub namespace: String,
    /// Explicit store path, overriding the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "Mini-Conf-Papers".to_string(),
            path: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| crate::read_marks::ReadMarks::default_path(&self.namespace))
    }
}

impl PapermapConfig {
    /// Check semantic constraints figment cannot express. Returns one message
    /// per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.data.base.trim().is_empty() {
            problems.push("data.base must not be empty".to_string());
        }
        if self.data.timeout_secs == 0 {
            problems.push("data.timeout_secs must be greater than 0".to_string());
        }
        if self.keyword_map.grouping.min_group_size == 0 {
            problems.push("keyword_map.grouping.min_group_size must be at least 1".to_string());
        }
        if self.ui.card_width < 20 {
            problems.push("ui.card_width must be at least 20".to_string());
        }
        if self.storage.namespace.trim().is_empty() {
            problems.push("storage.namespace must not be empty".to_string());
        }
        problems
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `PAPERMAP_`)
/// 3. Workspace-local config (`.papermap/config.toml`)
/// 4. User config (`~/.config/papermap/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&PapermapConfig>,
) -> Result<PapermapConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(PapermapConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "papermap", "papermap") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".papermap").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (PAPERMAP_DATA__BASE, PAPERMAP_UI__CARD_WIDTH, etc.)
    figment = figment.merge(Env::prefixed("PAPERMAP_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Load configuration from an explicit file on top of the defaults and environment.
pub fn load_config_file(path: &Path) -> Result<PapermapConfig, Box<figment::Error>> {
    Figment::from(Serialized::defaults(PapermapConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PAPERMAP_").split("__"))
        .extract()
        .map_err(Box::new)
}

/// Load from an explicit file when given, else from the usual layers, then
/// validate.
pub fn resolve_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> crate::error::Result<PapermapConfig> {
    let loaded = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        Some(path) => load_config_file(path),
        None => load_config(workspace, None),
    };
    let config = loaded.map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;

    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Invalid {
            message: problems.join("; "),
        }
        .into());
    }
    Ok(config)
}
