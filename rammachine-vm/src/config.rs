//! Interpreter configuration

use crate::error::{Error, ErrorKind, Result};
use crate::parser::DEFAULT_COMMENT_MARKER;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for one interpreter instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Pause after every step of `execute_async`, in milliseconds
    pub step_delay_ms: u64,
    /// Abort a run after this many executed operations
    pub max_steps: Option<u64>,
    /// Comment start character in program text
    pub comment_marker: char,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 0,
            max_steps: None,
            comment_marker: DEFAULT_COMMENT_MARKER,
        }
    }
}

impl InterpreterConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay_ms = delay.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, format!("invalid config: {}", e))
                .with_operation("config::from_json")
                .set_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.comment_marker.is_whitespace() || matches!(self.comment_marker, '*' | '=' | ':') {
            return Err(Error::config_invalid(format!(
                "comment marker {:?} clashes with program syntax",
                self.comment_marker
            ))
            .with_operation("config::validate"));
        }
        Ok(())
    }
}
