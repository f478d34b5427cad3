//! Layered configuration loaded with figment.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `repair-network.toml` in the working directory, or an explicit file
//! 3. Environment variables prefixed `REPAIR_NET_`, `__` separating sections
//!    (`REPAIR_NET_STYLE__HIGHLIGHT_PATHWAY=HR` sets `style.highlight_pathway`)
//!
//! Environment keys arrive lowercased, so `REPAIR_NET_STYLE__PATHWAY_COLORS__HR`
//! is folded onto the existing `HR` entry of `style.pathway_colors` instead of
//! creating an `hr` entry next to it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::classify::Style;
use crate::community::{Algorithm, ConnectedComponents, Louvain, Partitioner};

pub const DEFAULT_CONFIG_FILE: &str = "repair-network.toml";
pub const ENV_PREFIX: &str = "REPAIR_NET_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub algorithm: Algorithm,
    pub resolution: f64,
    pub seed: u64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        CommunityConfig {
            algorithm: Algorithm::Louvain,
            resolution: 1.0,
            seed: 42,
        }
    }
}

impl CommunityConfig {
    pub fn partitioner(&self) -> Box<dyn Partitioner + Send + Sync> {
        match self.algorithm {
            Algorithm::Louvain => Box::new(Louvain::new(self.resolution, self.seed)),
            Algorithm::Components => Box::new(ConnectedComponents),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    /// Graphviz layout binary; `neato` gives a spring layout.
    pub engine: String,
    pub dot_path: PathBuf,
    pub image_path: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            title: "Protein Clusters Across DNA Repair Mechanisms with G4 Interactions in Black and Thicker Edges".to_string(),
            engine: "neato".to_string(),
            dot_path: PathBuf::from("network.dot"),
            image_path: PathBuf::from("network.png"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl NetworkConfig {
    /// Loads defaults, then `repair-network.toml` if present, then the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`NetworkConfig::load`], reading `path` instead of the default
    /// file when given. An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment(path).extract()?;
        config.fold_env_pathway_colors()?;
        config.validate()?;
        Ok(config)
    }

    /// Moves pathway colors set through the environment onto the
    /// differently-cased key already present, if any.
    fn fold_env_pathway_colors(&mut self) -> Result<(), ConfigError> {
        const KEY: &str = "style.pathway_colors";
        let env = Figment::from(Env::prefixed(ENV_PREFIX).split("__"));
        if !env.contains(KEY) {
            return Ok(());
        }

        let overrides: BTreeMap<String, String> = env.extract_inner(KEY)?;
        let colors = &mut self.style.pathway_colors;
        for (key, color) in overrides {
            let target = colors
                .keys()
                .find(|existing| **existing != key && existing.eq_ignore_ascii_case(&key))
                .cloned();
            if let Some(target) = target {
                colors.remove(&key);
                colors.insert(target, color);
            }
        }
        Ok(())
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let style = &self.style;
        if style.highlight_pathway.trim().is_empty() {
            return Err(invalid("style.highlight_pathway", "must not be empty"));
        }
        for (field, value) in [
            ("style.common_size", style.common_size),
            ("style.pathway_size", style.pathway_size),
            ("style.other_size", style.other_size),
            ("style.highlight_width", style.highlight_width),
            ("style.edge_width", style.edge_width),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be positive"));
            }
        }
        if !(self.community.resolution.is_finite() && self.community.resolution > 0.0) {
            return Err(invalid("community.resolution", "must be a positive number"));
        }
        if self.render.engine.trim().is_empty() {
            return Err(invalid("render.engine", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
