use shared_types::AppConfig;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the working directory.
const CONFIG_PATH: &str = "config.toml";

/// Parse a config document. Invalid documents fall back to defaults.
pub fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!(path = CONFIG_PATH, error = %e, "failed to parse config, using defaults");
        AppConfig::default()
    })
}

/// Read `config.toml` once and keep it for the life of the process.
/// Later calls return the first result.
///
/// A missing or unparseable file yields `AppConfig::default()`.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        let config = match std::fs::read_to_string(CONFIG_PATH) {
            Ok(contents) => parse_config(&contents),
            Err(e) => {
                tracing::info!(path = CONFIG_PATH, error = %e, "config file not found, using defaults");
                AppConfig::default()
            }
        };
        tracing::info!(
            features = ?config.features,
            credit_policy = config.grading.credit_policy.as_str(),
            "configuration loaded"
        );
        config
    })
}
