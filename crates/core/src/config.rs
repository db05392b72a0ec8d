use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        tracing::debug!("no .env file found, using process environment only");
    }
}

/// Profiled view over a key/value lookup.
///
/// When a profile is set (e.g. `PROD`), every key is first looked up as
/// `{PROFILE}_{KEY}`, falling back to `{KEY}`. Empty values count as unset.
struct Env<'a> {
    profile: String,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = (self.lookup)(&prefixed).filter(|s| !s.is_empty()) {
                return Some(v);
            }
        }
        (self.lookup)(key).filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.opt(key) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: v }),
            None => Ok(default),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from the `AGORA_PROFILE` env var.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Fails if the upstream
    /// credential is missing or a numeric setting does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("AGORA_PROFILE").unwrap_or_default().to_uppercase();
        let env = Env {
            profile: profile.clone(),
            lookup: &lookup,
        };
        Ok(Self {
            profile,
            server: ServerConfig::from_env(&env)?,
            llm: LlmConfig::from_env(&env)?,
            relay: RelayConfig::from_env(&env)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:  {}:{}", self.server.host, self.server.port);
        tracing::info!("  cors:    {}", self.server.cors_origins.join(", "));
        tracing::info!("  llm:     model={}, base_url={}", self.llm.model, self.llm.base_url);
        tracing::info!("  relay:   pacing={}ms", self.relay.pacing_ms);
    }
}

// ── Server ────────────────────────────────────────────────────

pub const DEFAULT_PORT: u16 = 4000;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,https://emersoncoronel.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let cors_origins = env
            .or("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Ok(Self {
            host: env.or("HOST", "0.0.0.0"),
            port: env.parsed("PORT", DEFAULT_PORT)?,
            cors_origins,
        })
    }
}

// ── Upstream LLM ──────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let api_key = env
            .opt("OPENAI_API_KEY")
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        Ok(Self {
            api_key,
            model: env.or("OPENAI_MODEL", "gpt-3.5-turbo"),
            base_url: env
                .or("OPENAI_BASE_URL", "https://api.openai.com")
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ── Relay ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Delay after each emitted fragment, for a typing cadence.
    pub pacing_ms: u64,
}

impl RelayConfig {
    pub const DEFAULT_PACING_MS: u64 = 100;

    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            pacing_ms: env.parsed("RELAY_PACING_MS", Self::DEFAULT_PACING_MS)?,
        })
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}
