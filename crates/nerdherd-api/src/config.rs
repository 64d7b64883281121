//! Service configuration.
//!
//! Read from the JSON file named by `NERDHERD_CONFIG`, falling back to
//! `<config dir>/nerdherd/config.json` and then to built-in defaults.
//! `NERDHERD_*` environment variables override whatever the file says.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use nerdherd_bedrock::chat::InferenceParams;
use nerdherd_diagnosis::session::{
    DEFAULT_MAX_QUESTIONS, DEFAULT_REQUEST_TIMEOUT, SessionSettings,
};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 2;

/// Idle time after which a session is dropped from memory.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    pub config_version: u32,
    pub region: String,
    pub bucket: String,
    /// Bedrock model or inference profile used for replies.
    pub model_id: String,
    pub guardrail_id: String,
    pub guardrail_version: String,
    pub bind_addr: String,
    pub admin_token: Option<String>,
    pub request_timeout_secs: u64,
    pub max_questions: u32,
    /// Sessions not touched for this long are evicted.
    pub session_ttl_secs: u64,
    /// Sampling temperature for replies.
    pub temperature: f32,
    /// Reply length cap, in tokens.
    pub max_tokens: i32,
    pub credentials: CredentialSource,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: "us-east-1".to_string(),
            bucket: "nerdherd".to_string(),
            model_id: "us.anthropic.claude-3-5-haiku-20241022-v1:0".to_string(),
            guardrail_id: String::new(),
            guardrail_version: "DRAFT".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            admin_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_questions: DEFAULT_MAX_QUESTIONS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            temperature: 0.6,
            max_tokens: 256,
            credentials: CredentialSource::DefaultChain,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Profile {
        profile_name: String,
    },
    #[default]
    DefaultChain,
}

impl ServiceConfig {
    /// Load from disk (if a file is present) and apply env overrides.
    pub fn load() -> eyre::Result<Self> {
        let mut config = match config_path() {
            Some(path) => {
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    eyre::eyre!("failed to read config at {}: {e}", path.display())
                })?;
                tracing::info!(path = %path.display(), "loading config file");
                Self::from_json(&contents)?
            }
            None => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, migrating older versions first.
    pub fn from_json(contents: &str) -> eyre::Result<Self> {
        // Parse as raw JSON so we can run migrations before deserializing.
        let json: serde_json::Value = serde_json::from_str(contents)?;
        let on_disk_version = json
            .get("config_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let migrated = migrate(json, on_disk_version)?;
        Ok(serde_json::from_value(migrated)?)
    }

    /// Override fields from `NERDHERD_*` variables. `lookup` is
    /// `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<()> {
        let set = |target: &mut String, name: &str| {
            if let Some(value) = lookup(name) {
                *target = value;
            }
        };
        set(&mut self.region, "NERDHERD_REGION");
        set(&mut self.bucket, "NERDHERD_BUCKET");
        set(&mut self.model_id, "NERDHERD_MODEL_ID");
        set(&mut self.guardrail_id, "NERDHERD_GUARDRAIL_ID");
        set(&mut self.guardrail_version, "NERDHERD_GUARDRAIL_VERSION");
        set(&mut self.bind_addr, "NERDHERD_BIND_ADDR");

        if let Some(token) = lookup("NERDHERD_ADMIN_TOKEN") {
            self.admin_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = lookup("NERDHERD_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .parse()
                .map_err(|e| eyre::eyre!("NERDHERD_REQUEST_TIMEOUT_SECS={secs:?}: {e}"))?;
        }
        if let Some(max) = lookup("NERDHERD_MAX_QUESTIONS") {
            self.max_questions = max
                .parse()
                .map_err(|e| eyre::eyre!("NERDHERD_MAX_QUESTIONS={max:?}: {e}"))?;
        }
        if let Some(ttl) = lookup("NERDHERD_SESSION_TTL_SECS") {
            self.session_ttl_secs = ttl
                .parse()
                .map_err(|e| eyre::eyre!("NERDHERD_SESSION_TTL_SECS={ttl:?}: {e}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.guardrail_id.is_empty() {
            return Err(eyre::eyre!(
                "guardrail_id is required (set NERDHERD_GUARDRAIL_ID or add it to the config file)"
            ));
        }
        if self.max_questions == 0 {
            return Err(eyre::eyre!("max_questions must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(eyre::eyre!("request_timeout_secs must be at least 1"));
        }
        if self.session_ttl_secs == 0 {
            return Err(eyre::eyre!("session_ttl_secs must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(eyre::eyre!("temperature must be between 0 and 1"));
        }
        if self.max_tokens < 1 {
            return Err(eyre::eyre!("max_tokens must be at least 1"));
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_questions: self.max_questions,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn inference_params(&self) -> InferenceParams {
        InferenceParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("NERDHERD_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    dirs::config_dir()
        .map(|base| base.join("nerdherd").join("config.json"))
        .filter(|p| p.exists())
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        ));
    }

    // v0 → v1: `timeout_secs` renamed to `request_timeout_secs`
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if let Some(timeout) = obj.remove("timeout_secs") {
            obj.entry("request_timeout_secs").or_insert(timeout);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (renamed timeout_secs)");
    }

    // v1 → v2: add session_ttl_secs
    if from_version < 2 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("session_ttl_secs")
            .or_insert(serde_json::Value::Number(DEFAULT_SESSION_TTL_SECS.into()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(2.into()),
        );
        tracing::info!("migrated config v1 → v2 (added session_ttl_secs)");
    }

    Ok(json)
}
