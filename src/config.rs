use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::feed::FeedVariant;
use crate::models::{BoroughPolicy, MergePolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Source files, processed in order. A file listed earlier marks its
    /// days tracked before a later file is read.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub borough_policy: BoroughPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub variant: FeedVariant,
    pub confirmed: String,
    pub deaths: String,
    pub recovered: Option<String>,

    #[serde(default)]
    pub merge_policy: MergePolicy,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("covid-charts");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("covid.db").to_string_lossy().to_string()
}

fn default_sources() -> Vec<SourceConfig> {
    let base = "COVID-19/csse_covid_19_data/csse_covid_19_time_series";
    vec![
        SourceConfig {
            variant: FeedVariant::Global,
            confirmed: format!("{base}/time_series_covid19_confirmed_global.csv"),
            deaths: format!("{base}/time_series_covid19_deaths_global.csv"),
            recovered: Some(format!("{base}/time_series_covid19_recovered_global.csv")),
            merge_policy: MergePolicy::Replace,
        },
        SourceConfig {
            variant: FeedVariant::UsCounty,
            confirmed: format!("{base}/time_series_covid19_confirmed_US.csv"),
            deaths: format!("{base}/time_series_covid19_deaths_US.csv"),
            recovered: None,
            merge_policy: MergePolicy::Replace,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sources: default_sources(),
            borough_policy: BoroughPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("covid-charts")
            .join("config.toml")
    }
}
