//! Configuration: the intake script and server settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_THINK_DELAY_MS: u64 = 1500;
const DEFAULT_CAPTURE_DELAY_MS: u64 = 2000;
const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;
/// Sessions kept before creation starts evicting or refusing
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read script {path}: {source}")]
    ReadScript {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse script {path}: {source}")]
    ParseScript {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },
    #[error("invalid script: {0}")]
    InvalidScript(String),
}

/// The fixed dialogue an intake walks through.
///
/// `prompts[k - 1]` is asked after step `k` is answered; the closing message
/// follows the last step, so the flow has `prompts.len() + 1` steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeScript {
    pub opening_message: String,
    pub prompts: Vec<String>,
    pub closing_message: String,
    /// Canned answers for simulated capture, one per step
    #[serde(default)]
    pub capture_samples: Vec<String>,
}

impl Default for IntakeScript {
    fn default() -> Self {
        Self {
            opening_message: "Welcome! I'm your AI Health Assistant. I'm here to help complete \
                your intake faster, so you can see your doctor sooner. This service is completely \
                optional. To start, please tell me your main reason for today's visit."
                .to_string(),
            prompts: vec![
                "Thank you for sharing that. How long have you been experiencing these symptoms?"
                    .to_string(),
                "I understand. Have you taken any medications to help with these symptoms?"
                    .to_string(),
                "Thank you for providing this information. Is there anything else you'd like to \
                    share with your doctor before the consultation?"
                    .to_string(),
            ],
            closing_message: "Thank you for completing the intake process. Your doctor will \
                review this information before your consultation. You'll be connected with your \
                doctor shortly."
                .to_string(),
            capture_samples: vec![
                "I've been having severe headaches for the past week.".to_string(),
                "About three days now. They're worse in the morning.".to_string(),
                "I took some over-the-counter pain relievers but they didn't help much."
                    .to_string(),
                "I've also been feeling more tired than usual, and I'm concerned it might be \
                    related to my blood pressure medication."
                    .to_string(),
            ],
        }
    }
}

impl IntakeScript {
    /// Load and validate a JSON script
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadScript {
            path: path.to_path_buf(),
            source,
        })?;
        let script: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseScript {
                path: path.to_path_buf(),
                source,
            })?;
        script.validate()?;
        Ok(script)
    }

    pub fn total_steps(&self) -> u32 {
        u32::try_from(self.prompts.len() + 1).unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.opening_message.trim().is_empty() {
            return Err(ConfigError::InvalidScript(
                "opening_message is empty".to_string(),
            ));
        }
        if self.closing_message.trim().is_empty() {
            return Err(ConfigError::InvalidScript(
                "closing_message is empty".to_string(),
            ));
        }
        if let Some(index) = self.prompts.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidScript(format!(
                "prompt {} is empty",
                index + 1
            )));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            total_steps: self.total_steps(),
            opening_message: self.opening_message.clone(),
        }
    }
}

/// Bootstrap values for one intake session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub total_steps: u32,
    pub opening_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        IntakeScript::default().session_config()
    }
}

/// Settings for the HTTP server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub script: IntakeScript,
    /// Simulated latency of the scripted generator
    pub think_delay: Duration,
    /// Simulated listening time of the scripted capture
    pub capture_delay: Duration,
    pub reply_timeout: Duration,
    /// Live sessions kept before completed ones are evicted
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            script: IntakeScript::default(),
            think_delay: Duration::from_millis(DEFAULT_THINK_DELAY_MS),
            capture_delay: Duration::from_millis(DEFAULT_CAPTURE_DELAY_MS),
            reply_timeout: Duration::from_millis(DEFAULT_REPLY_TIMEOUT_MS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("MEDINTAKE_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
                var: "MEDINTAKE_PORT",
                value,
            })?,
            None => defaults.port,
        };

        let script = match lookup("MEDINTAKE_SCRIPT") {
            Some(path) => IntakeScript::load(Path::new(&path))?,
            None => defaults.script,
        };

        let max_sessions = match lookup("MEDINTAKE_MAX_SESSIONS") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: "MEDINTAKE_MAX_SESSIONS",
                        value,
                    })
                }
            },
            None => defaults.max_sessions,
        };

        Ok(Self {
            port,
            script,
            max_sessions,
            think_delay: millis_var(&lookup, "MEDINTAKE_THINK_DELAY_MS", defaults.think_delay)?,
            capture_delay: millis_var(
                &lookup,
                "MEDINTAKE_CAPTURE_DELAY_MS",
                defaults.capture_delay,
            )?,
            reply_timeout: millis_var(
                &lookup,
                "MEDINTAKE_REPLY_TIMEOUT_MS",
                defaults.reply_timeout,
            )?,
        })
    }
}

fn millis_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        None => Ok(default),
    }
}
