//! Configuration file loading for codefix.
//!
//! Discovers and loads `codefix.toml` from the project root and folds it into
//! [`ServiceSettings`].

use std::collections::BTreeMap;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use codefix_diagnostics::RuleLevels;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

use crate::settings::ServiceSettings;

pub const CONFIG_FILE_NAME: &str = "codefix.toml";

/// Top-level configuration from codefix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodefixConfig {
    pub service: ServiceConfig,

    /// Rule enable table, e.g. `S1116 = false`.
    pub rules: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Diagnostics resolved concurrently within one file.
    pub max_concurrent_diagnostics: Option<usize>,

    /// Files processed concurrently by sharded listing.
    pub max_concurrent_files: Option<usize>,
}

/// Returns `None` if the project root has no config file.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<CodefixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<CodefixConfig> {
    let config: CodefixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<CodefixConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(CodefixConfig::default()),
    }
}

impl CodefixConfig {
    /// Settings for `project_root`, with this config layered over the defaults.
    pub fn into_settings(self, project_root: Utf8PathBuf) -> anyhow::Result<ServiceSettings> {
        let defaults = ServiceSettings::default();

        let max_concurrent_diagnostics = self
            .service
            .max_concurrent_diagnostics
            .unwrap_or(defaults.max_concurrent_diagnostics);
        let max_concurrent_files = self
            .service
            .max_concurrent_files
            .unwrap_or(defaults.max_concurrent_files);

        anyhow::ensure!(
            max_concurrent_diagnostics > 0,
            "service.max_concurrent_diagnostics must be at least 1"
        );
        anyhow::ensure!(
            max_concurrent_files > 0,
            "service.max_concurrent_files must be at least 1"
        );

        Ok(ServiceSettings {
            project_root,
            max_concurrent_diagnostics,
            max_concurrent_files,
            rules: RuleLevels::from_table(self.rules),
        })
    }
}

/// Load `codefix.toml` from `project_root` (if any) and build settings.
pub fn load_settings(project_root: &Utf8Path) -> anyhow::Result<ServiceSettings> {
    load_or_default(project_root)?.into_settings(project_root.to_path_buf())
}
