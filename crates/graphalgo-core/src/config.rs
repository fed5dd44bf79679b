use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Storage backend requested at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Dense,
    Huge,
    /// Dense unless a declared count exceeds its capacity.
    #[default]
    Auto,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dense => "dense",
            Self::Huge => "huge",
            Self::Auto => "auto",
        })
    }
}

impl FromStr for Backend {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dense" | "heavy" => Ok(Self::Dense),
            "huge" => Ok(Self::Huge),
            "auto" => Ok(Self::Auto),
            other => Err(GraphError::config(format!(
                "unknown backend '{other}' (expected dense, huge, or auto)"
            ))),
        }
    }
}

/// Whether relationship weights are read from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    /// No weight table; lookups report the default weight.
    #[default]
    None,
    /// Build a weight table from the source's relationship property.
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub weights: WeightMode,
    /// Substituted for relationships that carry no weight.
    #[serde(default)]
    pub default_weight: Option<f64>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            weights: WeightMode::default(),
            default_weight: None,
        }
    }
}

impl LoadConfig {
    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub const fn weighted(mut self, default_weight: Option<f64>) -> Self {
        self.weights = WeightMode::Property;
        self.default_weight = default_weight;
        self
    }

    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for a non-finite or negative default
    /// weight.
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some(weight) = self.default_weight
            && (!weight.is_finite() || weight < 0.0)
        {
            return Err(GraphError::config(format!(
                "default_weight must be a finite non-negative number, got {weight}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LouvainConfig {
    /// Use relationship weights in the modularity gain.
    #[serde(default)]
    pub weighted: bool,
    /// Local-move passes per level.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Coarsening levels.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Worker threads for the partitioned variant.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            weighted: false,
            max_iterations: default_max_iterations(),
            max_levels: default_max_levels(),
            concurrency: default_concurrency(),
        }
    }
}

impl LouvainConfig {
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] when a cap or the concurrency is zero.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_iterations == 0 {
            return Err(GraphError::config("max_iterations must be at least 1"));
        }
        if self.max_levels == 0 {
            return Err(GraphError::config("max_levels must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(GraphError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Everything the CLI reads from `--config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub louvain: LouvainConfig,
    /// Size of the shared worker pool.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            load: LoadConfig::default(),
            louvain: LouvainConfig::default(),
            concurrency: default_concurrency(),
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Propagates the first invalid section.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.load.validate()?;
        self.louvain.validate()?;
        if self.concurrency == 0 {
            return Err(GraphError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Read an [`EngineConfig`] from a TOML file.
///
/// # Errors
///
/// Fails when the file cannot be read, does not parse, or holds invalid
/// values.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_engine_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse and validate an [`EngineConfig`] from TOML text.
///
/// # Errors
///
/// Fails on malformed TOML or invalid values.
pub fn parse_engine_config(content: &str) -> Result<EngineConfig> {
    let config = toml::from_str::<EngineConfig>(content)?;
    config.validate()?;
    Ok(config)
}

const fn default_max_iterations() -> usize {
    20
}

const fn default_max_levels() -> usize {
    10
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
