// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG: OnceLock<HiveAggConfig> = OnceLock::new();

pub const CONFIG_ENV: &str = "HIVEAGG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "hiveagg.toml";

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static HiveAggConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = HiveAggConfig::load_from_file(path.as_ref())?;
    Ok(CONFIG.get_or_init(|| cfg))
}

pub fn init_from_env_or_default() -> Result<&'static HiveAggConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = HiveAggConfig::load_from_file(&path)?;
    Ok(CONFIG.get_or_init(|| cfg))
}

pub fn config() -> Result<&'static HiveAggConfig> {
    init_from_env_or_default()
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(CONFIG_ENV)
        && !p.trim().is_empty()
    {
        return Ok(PathBuf::from(p.trim()));
    }

    let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
    if candidate.exists() {
        return Ok(candidate);
    }

    Err(anyhow!(
        "missing config file: set ${} or create ./{}",
        CONFIG_ENV,
        DEFAULT_CONFIG_FILE
    ))
}

#[derive(Clone, Debug, Deserialize)]
pub struct HiveAggConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "hiveagg=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub agg: AggConfig,
}

impl HiveAggConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parse toml: {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: HiveAggConfig = toml::from_str(s)?;
        if cfg.agg.group_table_initial_capacity == 0 {
            return Err(anyhow!("agg.group_table_initial_capacity must be positive"));
        }
        Ok(cfg)
    }

    pub fn effective_log_filter(&self) -> &str {
        self.log_filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.log_level.as_str())
    }
}

impl Default for HiveAggConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            agg: AggConfig::default(),
        }
    }
}

/// Settings read by the surrounding executor and by the grouped aggregator.
///
/// `native_agg_function_enabled` mirrors the dialect option named in the SUM
/// rejection message. The engine only reports it; callers decide whether to
/// route aggregates here at all.
#[derive(Clone, Debug, Deserialize)]
pub struct AggConfig {
    #[serde(default)]
    pub native_agg_function_enabled: bool,
    #[serde(default = "default_group_table_initial_capacity")]
    pub group_table_initial_capacity: usize,
}

fn default_group_table_initial_capacity() -> usize {
    1024
}

impl Default for AggConfig {
    fn default() -> Self {
        Self {
            native_agg_function_enabled: false,
            group_table_initial_capacity: default_group_table_initial_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg = HiveAggConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.agg.native_agg_function_enabled);
        assert_eq!(cfg.agg.group_table_initial_capacity, 1024);
        assert_eq!(cfg.effective_log_filter(), "info");
    }

    #[test]
    fn test_agg_section_parsed() {
        let cfg = HiveAggConfig::from_toml_str(
            r#"
log_level = "warn"
log_filter = "hiveagg=debug"

[agg]
native_agg_function_enabled = true
group_table_initial_capacity = 16
"#,
        )
        .unwrap();
        assert!(cfg.agg.native_agg_function_enabled);
        assert_eq!(cfg.agg.group_table_initial_capacity, 16);
        assert_eq!(cfg.effective_log_filter(), "hiveagg=debug");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = HiveAggConfig::from_toml_str("[agg]\ngroup_table_initial_capacity = 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("group_table_initial_capacity"));
    }

    #[test]
    fn test_load_from_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = HiveAggConfig::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }
}
