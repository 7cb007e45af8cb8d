use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CorpusConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BatchingConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub batch_first: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_first: false,
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataConfig {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub batching: BatchingConfig,
}

/// Load a configuration from one or more TOML files applied in order; later
/// files override earlier ones key by key.
pub fn load_data_config(paths: &[PathBuf]) -> Result<DataConfig> {
    if paths.is_empty() {
        return Err(anyhow!("at least one configuration path is required"));
    }

    let mut iter = paths.iter();
    let first_path = iter
        .next()
        .ok_or_else(|| anyhow!("configuration iterator unexpectedly empty"))?;
    let mut value = load_value(first_path)?;

    for path in iter {
        let overlay = load_value(path)?;
        merge_values(&mut value, overlay);
    }

    value.try_into::<DataConfig>().map_err(|err| anyhow!(err))
}

fn load_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    let table: toml::value::Table = toml::from_str(&content)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;
    Ok(Value::Table(table))
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, overlay_value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => {
                        base_table.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn default_batch_size() -> usize {
    32
}

fn default_seed() -> u64 {
    0xBAD5EED
}
