//! Engine configuration for the classification engine
//!
//! The category weight caps, fuzzy similarity threshold, auto-apply
//! threshold, and learning parameters are tunable configuration, not
//! hard-coded constants.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sift/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Per-category score caps
///
/// A category's matched rule weights are summed and clamped to its cap, so
/// the maximum single-sided confidence equals the sum of the three caps.
#[derive(Debug, Clone, Copy)]
pub struct CategoryCaps {
    pub keyword: f64,
    pub merchant: f64,
    pub tag_repetition: f64,
}

impl Default for CategoryCaps {
    fn default() -> Self {
        Self {
            keyword: 0.4,
            merchant: 0.3,
            tag_repetition: 0.3,
        }
    }
}

/// Feedback learner parameters
#[derive(Debug, Clone, Copy)]
pub struct LearningConfig {
    /// Weight nudge applied per adjustment
    pub step: f64,
    /// Agreement ratio above which a rule is promoted
    pub promote_ratio: f64,
    /// Agreement ratio below which a rule is demoted
    pub demote_ratio: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            step: 0.02,
            promote_ratio: 0.8,
            demote_ratio: 0.3,
        }
    }
}

/// Tunable parameters for classification, auto-tagging, and learning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub caps: CategoryCaps,
    /// Minimum normalized similarity for merchant_fuzzy rules
    pub fuzzy_threshold: f64,
    /// Default confidence threshold for auto-applying suggestions
    pub auto_apply_threshold: f64,
    pub learning: LearningConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            caps: CategoryCaps::default(),
            fuzzy_threshold: 0.82,
            auto_apply_threshold: 0.7,
            learning: LearningConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load config with the default two-layer resolution
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load config from an explicit path (falls back to embedded defaults
    /// if the file does not exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }
}

/// Default override location in the platform data directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config").join("engine.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    let content = if let Some(path) = override_path {
        if path.exists() {
            fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        } else {
            DEFAULT_CONFIG.to_string()
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            fs::read_to_string(&default_path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        } else {
            DEFAULT_CONFIG.to_string()
        }
    } else {
        DEFAULT_CONFIG.to_string()
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    classifier: Option<RawClassifier>,
    autotag: Option<RawAutotag>,
    learning: Option<RawLearning>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    keyword_cap: Option<f64>,
    merchant_cap: Option<f64>,
    tag_repetition_cap: Option<f64>,
    fuzzy_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAutotag {
    confidence_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLearning {
    step: Option<f64>,
    promote_ratio: Option<f64>,
    demote_ratio: Option<f64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(classifier) = raw.classifier {
        if let Some(cap) = classifier.keyword_cap {
            config.caps.keyword = cap;
        }
        if let Some(cap) = classifier.merchant_cap {
            config.caps.merchant = cap;
        }
        if let Some(cap) = classifier.tag_repetition_cap {
            config.caps.tag_repetition = cap;
        }
        if let Some(threshold) = classifier.fuzzy_threshold {
            config.fuzzy_threshold = threshold;
        }
    }

    if let Some(autotag) = raw.autotag {
        if let Some(threshold) = autotag.confidence_threshold {
            config.auto_apply_threshold = threshold;
        }
    }

    if let Some(learning) = raw.learning {
        if let Some(step) = learning.step {
            config.learning.step = step;
        }
        if let Some(ratio) = learning.promote_ratio {
            config.learning.promote_ratio = ratio;
        }
        if let Some(ratio) = learning.demote_ratio {
            config.learning.demote_ratio = ratio;
        }
    }

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &EngineConfig) -> Result<()> {
    let unit_bounded = [
        ("keyword_cap", config.caps.keyword),
        ("merchant_cap", config.caps.merchant),
        ("tag_repetition_cap", config.caps.tag_repetition),
        ("fuzzy_threshold", config.fuzzy_threshold),
        ("confidence_threshold", config.auto_apply_threshold),
        ("promote_ratio", config.learning.promote_ratio),
        ("demote_ratio", config.learning.demote_ratio),
    ];
    for (name, value) in unit_bounded {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Config(format!(
                "{} must be in [0, 1], got {}",
                name, value
            )));
        }
    }
    if config.learning.step <= 0.0 || config.learning.step > 1.0 {
        return Err(Error::Config(format!(
            "learning step must be in (0, 1], got {}",
            config.learning.step
        )));
    }
    if config.learning.demote_ratio > config.learning.promote_ratio {
        return Err(Error::Config(
            "demote_ratio must not exceed promote_ratio".to_string(),
        ));
    }
    Ok(())
}
