//! Application Configuration - service, model, dataset and search settings
//!
//! Each section implements `Default` from the constants in `defaults.rs`, so
//! a missing file or a partial file always yields a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::predictor::ArtifactSource;
use crate::search::StrategyKind;
use crate::types::TargetProperty;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$ALLOY_CONFIG` env var
/// 2. `./alloy_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Service identification
    #[serde(default)]
    pub service: ServiceConfig,

    /// Predictor variants and artifact retrieval
    #[serde(default)]
    pub models: ModelsConfig,

    /// Historical training data
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Constraint validator settings
    #[serde(default)]
    pub constraints: ConstraintsConfig,

    /// Inverse search tuning
    #[serde(default)]
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ALLOY_CONFIG` environment variable
    /// 2. `./alloy_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings and otherwise ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Relative artifact, cache and dataset paths are taken relative to the
    /// directory holding the config file.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dir) = self.models.cache_dir.as_mut() {
            fix(dir);
        }
        for artifact in &mut self.models.artifacts {
            if let Some(p) = artifact.path.as_mut() {
                fix(p);
            }
        }
        if let Some(p) = self.dataset.ys_path.as_mut() {
            fix(p);
        }
        if let Some(p) = self.dataset.uts_path.as_mut() {
            fix(p);
        }
    }

    /// Check every section for impossible values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.service.name.trim().is_empty() {
            errors.push("service.name: must not be empty".to_string());
        }

        if self.models.default_mode.trim().is_empty() {
            errors.push("models.default_mode: must not be empty".to_string());
        }
        if self.models.http_timeout_secs == 0 {
            errors.push("models.http_timeout_secs: must be > 0".to_string());
        }
        for (i, a) in self.models.artifacts.iter().enumerate() {
            if a.mode.trim().is_empty() {
                errors.push(format!("models.artifacts[{i}].mode: must not be empty"));
            }
            match (&a.path, &a.url) {
                (Some(_), Some(_)) => errors.push(format!(
                    "models.artifacts[{i}]: set either path or url, not both"
                )),
                (None, None) => errors.push(format!("models.artifacts[{i}]: path or url is required")),
                (None, Some(url)) if !(url.starts_with("https://") || url.starts_with("http://")) => {
                    errors.push(format!("models.artifacts[{i}].url: must be an http(s) URL (got {url:?})"))
                }
                _ => {}
            }
        }

        let eps = self.constraints.sum_epsilon;
        if !eps.is_finite() || eps < 0.0 || eps > 10.0 {
            errors.push(format!("constraints.sum_epsilon: must be in [0, 10] (got {eps})"));
        }

        self.search.collect_errors(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n{}", format_errors(.0))]
    Validation(Vec<String>),
}

fn format_errors(errors: &[String]) -> String {
    errors.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name reported by `health` / `info`
    #[serde(default = "default_service_name")]
    pub name: String,
}

fn default_service_name() -> String {
    defaults::SERVICE_NAME.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
        }
    }
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Mode used when a request omits `mode`
    #[serde(default = "default_mode")]
    pub default_mode: String,

    /// Where downloaded artifacts are cached (no caching when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Download timeout (seconds)
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Additional predictor variants
    #[serde(default)]
    pub artifacts: Vec<ArtifactConfig>,
}

fn default_mode() -> String {
    defaults::DEFAULT_MODE.to_string()
}
fn default_http_timeout() -> u64 {
    defaults::HTTP_TIMEOUT_SECS
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            cache_dir: None,
            http_timeout_secs: default_http_timeout(),
            artifacts: Vec::new(),
        }
    }
}

/// One `[[models.artifacts]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub target: TargetProperty,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ArtifactConfig {
    /// Where to fetch the artifact; a local path wins over a URL.
    pub fn source(&self) -> Option<ArtifactSource> {
        match (&self.path, &self.url) {
            (Some(p), _) => Some(ArtifactSource::File(p.clone())),
            (None, Some(u)) => Some(ArtifactSource::Url(u.clone())),
            (None, None) => None,
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Historical records per target. Unset paths mean an empty dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ys_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uts_path: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn path_for(&self, target: TargetProperty) -> Option<&Path> {
        match target {
            TargetProperty::YieldStrength => self.ys_path.as_deref(),
            TargetProperty::UltimateTensileStrength => self.uts_path.as_deref(),
        }
    }
}

// ============================================================================
// Constraints
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsConfig {
    /// Allowed composition-sum deviation from 100 wt%
    #[serde(default = "default_sum_epsilon")]
    pub sum_epsilon: f64,
}

fn default_sum_epsilon() -> f64 {
    defaults::SUM_EPSILON
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        Self {
            sum_epsilon: default_sum_epsilon(),
        }
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_oversampling_factor")]
    pub oversampling_factor: usize,
    #[serde(default = "default_min_scan_samples")]
    pub min_scan_samples: usize,
    #[serde(default = "default_restarts_per_candidate")]
    pub restarts_per_candidate: usize,
    #[serde(default = "default_min_restarts")]
    pub min_restarts: usize,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    #[serde(default = "default_step_shrink")]
    pub step_shrink: f64,
    #[serde(default = "default_stall_iterations")]
    pub stall_iterations: usize,
    #[serde(default = "default_improvement_epsilon")]
    pub improvement_epsilon: f64,
    #[serde(default = "default_optimizer_merge_distance")]
    pub optimizer_merge_distance: f64,
    #[serde(default = "default_dedup_distance")]
    pub dedup_distance: f64,
    #[serde(default = "default_max_training_matches")]
    pub max_training_matches: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// Generators to run, in order
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,
}

fn default_oversampling_factor() -> usize {
    defaults::OVERSAMPLING_FACTOR
}

fn default_min_scan_samples() -> usize {
    defaults::MIN_SCAN_SAMPLES
}

fn default_restarts_per_candidate() -> usize {
    defaults::RESTARTS_PER_CANDIDATE
}

fn default_min_restarts() -> usize {
    defaults::MIN_RESTARTS
}

fn default_max_iterations() -> usize {
    defaults::MAX_ITERATIONS
}

fn default_initial_step() -> f64 {
    defaults::INITIAL_STEP
}

fn default_min_step() -> f64 {
    defaults::MIN_STEP
}

fn default_step_shrink() -> f64 {
    defaults::STEP_SHRINK
}

fn default_stall_iterations() -> usize {
    defaults::STALL_ITERATIONS
}

fn default_improvement_epsilon() -> f64 {
    defaults::IMPROVEMENT_EPSILON
}

fn default_optimizer_merge_distance() -> f64 {
    defaults::OPTIMIZER_MERGE_DISTANCE
}

fn default_dedup_distance() -> f64 {
    defaults::DEDUP_DISTANCE
}

fn default_max_training_matches() -> usize {
    defaults::MAX_TRAINING_MATCHES
}

fn default_seed() -> u64 {
    defaults::SEED
}

fn default_deadline_ms() -> u64 {
    defaults::DEADLINE_MS
}

fn default_strategies() -> Vec<StrategyKind> {
    StrategyKind::ALL.to_vec()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            oversampling_factor: default_oversampling_factor(),
            min_scan_samples: default_min_scan_samples(),
            restarts_per_candidate: default_restarts_per_candidate(),
            min_restarts: default_min_restarts(),
            max_iterations: default_max_iterations(),
            initial_step: default_initial_step(),
            min_step: default_min_step(),
            step_shrink: default_step_shrink(),
            stall_iterations: default_stall_iterations(),
            improvement_epsilon: default_improvement_epsilon(),
            optimizer_merge_distance: default_optimizer_merge_distance(),
            dedup_distance: default_dedup_distance(),
            max_training_matches: default_max_training_matches(),
            seed: default_seed(),
            deadline_ms: default_deadline_ms(),
            strategies: default_strategies(),
        }
    }
}

impl SearchConfig {
    /// Random-scan sample count for a request of `count` candidates.
    pub fn scan_samples(&self, count: usize) -> usize {
        count.saturating_mul(self.oversampling_factor).max(self.min_scan_samples)
    }

    /// Optimizer restart count for a request of `count` candidates.
    pub fn restarts(&self, count: usize) -> usize {
        count.saturating_mul(self.restarts_per_candidate).max(self.min_restarts)
    }

    fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.max_iterations == 0 {
            errors.push("search.max_iterations: must be > 0".to_string());
        }
        if self.stall_iterations == 0 {
            errors.push("search.stall_iterations: must be > 0".to_string());
        }
        Self::check_fraction(self.initial_step, "search.initial_step", errors);
        Self::check_fraction(self.min_step, "search.min_step", errors);
        if self.min_step.is_finite() && self.initial_step.is_finite() && self.min_step > self.initial_step {
            errors.push(format!(
                "search.min_step ({}) must be <= search.initial_step ({})",
                self.min_step, self.initial_step
            ));
        }
        if !(self.step_shrink.is_finite() && self.step_shrink > 0.0 && self.step_shrink < 1.0) {
            errors.push(format!("search.step_shrink: must be in (0, 1) (got {})", self.step_shrink));
        }
        for (name, v) in [
            ("search.improvement_epsilon", self.improvement_epsilon),
            ("search.optimizer_merge_distance", self.optimizer_merge_distance),
            ("search.dedup_distance", self.dedup_distance),
        ] {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("{name}: must be a finite value >= 0 (got {v})"));
            }
        }
        if self.deadline_ms == 0 {
            errors.push("search.deadline_ms: must be > 0".to_string());
        }
        if self.strategies.is_empty() {
            errors.push("search.strategies: at least one strategy is required".to_string());
        }
    }

    fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            errors.push(format!("{name}: must be in (0, 1] (got {value})"));
        }
    }
}
