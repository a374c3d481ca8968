use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which estimator backend handles predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EstimatorConfig {
    /// JSON model artifacts evaluated in-process
    Builtin {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        models_dir: Option<PathBuf>,
    },
    /// External program: record JSON on stdin, cost on stdout
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig::Builtin { models_dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory the chart file names are resolved against
    #[serde(default = "default_assets_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_over_25_chart")]
    pub over_25_chart: String,
    #[serde(default = "default_under_25_chart")]
    pub under_25_chart: String,
    /// Program used to open an available chart
    #[serde(default = "default_viewer")]
    pub viewer: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            over_25_chart: default_over_25_chart(),
            under_25_chart: default_under_25_chart(),
            viewer: default_viewer(),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_over_25_chart() -> String {
    "feature_importance_over_25.jpeg".to_string()
}

fn default_under_25_chart() -> String {
    "feature_importance_under_25.jpeg".to_string()
}

fn default_viewer() -> String {
    "xdg-open".to_string()
}

/// Hex colour overrides (`#RRGGBB` or `#RGB`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Feature importance charts
    #[serde(default)]
    pub assets: AssetsConfig,

    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Models directory used when the config does not name one: `models/` in the
/// working directory, next to the executable, or in the config directory,
/// whichever exists first
pub fn default_models_dir() -> PathBuf {
    let mut candidates = vec![PathBuf::from("models")];
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        candidates.push(dir.join("models"));
    }
    let config_models = AppConfig::config_dir().map(|dir| dir.join("models"));
    if let Ok(dir) = &config_models {
        candidates.push(dir.clone());
    }

    first_existing_dir(&candidates)
        .or_else(|| config_models.ok())
        .unwrap_or_else(|| PathBuf::from("models"))
}

fn first_existing_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|dir| dir.is_dir()).map(|dir| {
        // Absolute so the path stays valid if the working directory changes
        std::fs::canonicalize(dir).unwrap_or_else(|_| dir.clone())
    })
}

impl AppConfig {
    /// Directory holding config.toml and the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("premia");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir)
    }

    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            return Ok(Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("{:#}", e);
                AppConfig::default()
            }));
        }

        let config = AppConfig::default();
        if let Err(e) = config.save_to(&path) {
            tracing::warn!("Could not write default config: {}", e);
        }
        Ok(config)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
