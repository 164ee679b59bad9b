use crate::Result;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "fundlab";
const ENV_PREFIX: &str = "FUNDLAB";

/// Root settings, layered from defaults, an optional `fundlab.toml` and
/// `FUNDLAB__SECTION__KEY` environment variables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gemini: GeminiSettings,
    pub simulation: SimulationSettings,
    pub monitor: MonitorSettings,
}

/// Generative-AI service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used for code generation
    pub code_model: String,
    /// Model used for commentary, advice and fund signals
    pub default_model: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            code_model: "gemini-3-pro-preview".to_string(),
            default_model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
            requests_per_minute: 15,
        }
    }
}

/// Backtest simulator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Per-step volatility scale (0.015 = 1.5%)
    pub volatility: f64,
    pub default_horizon_days: u32,
    pub initial_capital: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            volatility: 0.015,
            default_horizon_days: 365,
            initial_capital: 10_000.0,
        }
    }
}

/// Fund monitor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub tick_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3_000,
        }
    }
}

impl MonitorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Settings {
    /// Load settings from `.env`, `fundlab.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings, reading `path` instead of the default config file.
    /// An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        settings.gemini.api_key = non_blank(settings.gemini.api_key.take())
            .or_else(|| non_blank(std::env::var("GEMINI_API_KEY").ok()))
            .or_else(|| non_blank(std::env::var("API_KEY").ok()));

        tracing::debug!(
            model = %settings.gemini.default_model,
            has_api_key = settings.gemini.api_key.is_some(),
            "Settings loaded"
        );

        Ok(settings)
    }

    /// Parse settings from TOML text only, without touching the environment
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut settings: Settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.gemini.api_key = non_blank(settings.gemini.api_key.take());
        Ok(settings)
    }
}

/// Blank values (e.g. `GEMINI_API_KEY=` in `.env`) count as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
