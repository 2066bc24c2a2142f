use serde::{Deserialize, Serialize};

/// Feature flags controlling which optional layers are active.
///
/// Loaded from `config.toml` at server startup. Every field defaults to
/// `false` so that a missing or incomplete config file disables them.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeatureFlags {
    #[serde(default)]
    pub telemetry: bool,
    #[serde(default)]
    pub rate_limit: bool,
}

/// How a semester GPA treats subjects whose credit value is unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicy {
    /// Unknown subjects are excluded from numerator and denominator.
    #[default]
    Strict,
    /// Unknown subjects count with `GradingConfig::default_credit`.
    DefaultCredits,
}

impl CreditPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditPolicy::Strict => "strict",
            CreditPolicy::DefaultCredits => "default_credits",
        }
    }
}

/// Flat credit assumed for a subject when no credit is known.
pub const DEFAULT_SUBJECT_CREDIT: u32 = 3;

fn default_credit() -> u32 {
    DEFAULT_SUBJECT_CREDIT
}

/// `[grading]` section of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradingConfig {
    #[serde(default)]
    pub credit_policy: CreditPolicy,
    #[serde(default = "default_credit")]
    pub default_credit: u32,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            credit_policy: CreditPolicy::default(),
            default_credit: DEFAULT_SUBJECT_CREDIT,
        }
    }
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_seconds() -> u64 {
    60
}

/// `[rate_limit]` section of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}
