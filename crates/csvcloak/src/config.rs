use ::config::ConfigError;
use anyhow::{anyhow, Result};
use mondrian::AnonymizationCriteria;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CSVCLOAK";

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ColumnConfiguration {
    QuasiIdentifier { name: String },
    Sensitive { name: String },
}

#[derive(Debug, Deserialize)]
pub struct ApplicationConfig {
    pub dataset: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    pub columns: Vec<ColumnConfiguration>,
    pub k: usize,
    #[serde(default)]
    pub l: Option<usize>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub parallel: bool,
}

impl ApplicationConfig {
    pub fn quasi_identifiers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|column| match column {
                ColumnConfiguration::QuasiIdentifier { name } => Some(name.as_str()),
                ColumnConfiguration::Sensitive { .. } => None,
            })
            .collect()
    }

    pub fn sensitive_column(&self) -> Result<&str> {
        let sensitive: Vec<&str> = self
            .columns
            .iter()
            .filter_map(|column| match column {
                ColumnConfiguration::Sensitive { name } => Some(name.as_str()),
                ColumnConfiguration::QuasiIdentifier { .. } => None,
            })
            .collect();

        match sensitive.as_slice() {
            [name] => Ok(*name),
            [] => Err(anyhow!("no sensitive column configured")),
            _ => Err(anyhow!(
                "exactly one sensitive column is supported, got {}",
                sensitive.join(", ")
            )),
        }
    }

    pub fn criteria(&self) -> Result<Vec<AnonymizationCriteria>> {
        let mut criteria = vec![AnonymizationCriteria::KAnonymous { k: self.k }.validated()?];

        if let Some(l) = self.l {
            criteria.push(AnonymizationCriteria::LDiverse { l }.validated()?);
        }

        Ok(criteria)
    }
}

/// Reads the config file, then `CSVCLOAK_*` environment overrides. Relative
/// paths are resolved against the directory of the config file.
pub fn load_config(path: &Path) -> Result<ApplicationConfig, ConfigError> {
    let mut s = config::Config::default();
    s.merge(config::File::from(path))?;
    s.merge(config::Environment::with_prefix(ENV_PREFIX))?;

    let mut config: ApplicationConfig = s.try_into()?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.dataset = base.join(&config.dataset);
    config.output = config.output.map(|output| base.join(output));

    Ok(config)
}
