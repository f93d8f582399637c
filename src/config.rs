//! Process configuration
//!
//! Loaded once at startup and handed to the components that need it.
//! Nothing below the binaries reads the environment.

use crate::error::AdvisoryError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Upper estimate of UTF-8 bytes one output token can decode to
const BYTES_PER_TOKEN: usize = 16;

/// Settings for the external text-generation service
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Gemini API key. `None` runs every advisor on its fallback.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Upper bound for a single generation call
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Longest model text the runner will normalize
    pub fn max_response_bytes(&self) -> usize {
        (self.max_output_tokens as usize).max(1) * BYTES_PER_TOKEN
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// `generateContent` endpoint for the configured model
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(AdvisoryError::Config(
                "GENERATION_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AdvisoryError::Config(format!(
                "GENERATION_TEMPERATURE must be within 0.0..=2.0 (got {})",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AdvisoryError::Config("GEMINI_MODEL must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            temperature: 0.3,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Read configuration from the process environment (after `.env`)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationConfig::default();

        let generation = GenerationConfig {
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: parse_var(&lookup, "GENERATION_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeout_secs),
            temperature: parse_var(&lookup, "GENERATION_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            max_output_tokens: parse_var(&lookup, "GENERATION_MAX_OUTPUT_TOKENS")?
                .unwrap_or(defaults.max_output_tokens),
        };
        generation.validate()?;

        let port = match parse_var(&lookup, "PORT")? {
            Some(port) => port,
            None => parse_var(&lookup, "API_PORT")?.unwrap_or(ServerConfig::default().port),
        };

        Ok(Self {
            generation,
            server: ServerConfig { port },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AdvisoryError::Config(format!("{} has invalid value {:?}: {}", key, raw, e))),
    }
}
