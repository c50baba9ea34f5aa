// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration file loading.

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::types::Config;
use super::utils::expand_tilde;

impl Config {
    /// Default location, `~/.config/gssh/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| {
            dirs.home_dir()
                .join(".config")
                .join("gssh")
                .join("config.yaml")
        })
    }

    /// Load configuration from a file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| format!("Failed to read configuration file at {}. Please check file permissions and ensure the file is accessible.", expanded_path.display()))?;

        Self::parse(&content).with_context(|| {
            format!(
                "Failed to parse YAML configuration file at {}",
                expanded_path.display()
            )
        })
    }

    /// Parse configuration from YAML text. Empty text yields the defaults.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the explicitly requested file, or the default one if present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub async fn load_with_priority(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let expanded_path = expand_tilde(path);
            if !expanded_path.exists() {
                anyhow::bail!("Config file not found: {:?}", expanded_path);
            }
            tracing::debug!("Using explicitly specified config file: {:?}", expanded_path);
            return Self::load(&expanded_path).await;
        }

        match Self::default_path() {
            Some(path) => Self::load(&path).await,
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }
}
