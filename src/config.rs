use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortfolioConfig {
    /// Organizational unit the CLI scopes to by default; empty means
    /// the whole organization.
    #[serde(default)]
    pub default_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub webhook: String,
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
    #[serde(default)]
    pub rules: AlertRulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRulesConfig {
    #[serde(default = "default_true")]
    pub stalled_activities: bool,
    #[serde(default = "default_true")]
    pub critical_projects: bool,
    #[serde(default = "default_true")]
    pub overloaded_resources: bool,
    #[serde(default = "default_true")]
    pub score_drop: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub unit: Option<String>,
    pub db_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/project-pulse/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(unit) = overrides.unit {
            self.portfolio.default_unit = unit;
        }
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Unit filter for entity loads; `None` loads everything.
    pub fn unit_filter(&self) -> Option<&str> {
        let unit = self.portfolio.default_unit.trim();
        if unit.is_empty() {
            None
        } else {
            Some(unit)
        }
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
db_path = "~/.local/share/project-pulse/pulse.db"

[portfolio]
default_unit = ""

[alerts]
webhook = ""
enable_stdout = true

[alerts.rules]
stalled_activities = true
critical_projects = true
overloaded_resources = true
score_drop = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            portfolio: PortfolioConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            webhook: String::new(),
            enable_stdout: default_enable_stdout(),
            rules: AlertRulesConfig::default(),
        }
    }
}

impl Default for AlertRulesConfig {
    fn default() -> Self {
        Self {
            stalled_activities: true,
            critical_projects: true,
            overloaded_resources: true,
            score_drop: true,
        }
    }
}

fn default_db_path() -> String {
    "~/.local/share/project-pulse/pulse.db".to_string()
}

fn default_enable_stdout() -> bool {
    true
}

fn default_true() -> bool {
    true
}
