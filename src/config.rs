use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FilterError, Result};

/// Fallback when no (or a zero) debounce delay is configured.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Options shared by the filter hook, the widgets and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Request parameter holding the column → value object.
    pub param_key: String,
    /// Quiet period before the search form auto-submits.
    pub debounce_ms: u64,
    /// Class toggled on the filter icon while the panel is open.
    pub highlight_class: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            param_key: "filters".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            highlight_class: "text-blue-600".to_string(),
        }
    }
}

impl FilterConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| FilterError::io(path, e))?;
        let config: FilterConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.param_key.trim().is_empty() {
            return Err(FilterError::Config("param_key must not be blank".into()));
        }
        if self.highlight_class.chars().any(char::is_whitespace) {
            return Err(FilterError::Config(format!(
                "highlight_class must be a single class, got {:?}",
                self.highlight_class
            )));
        }
        Ok(())
    }

    pub fn debounce_delay(&self) -> Duration {
        match self.debounce_ms {
            0 => Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            ms => Duration::from_millis(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"debounce_ms": 150}}"#).unwrap();
        let config = FilterConfig::from_path(file.path()).unwrap();
        assert_eq!(config.debounce_delay(), Duration::from_millis(150));
        assert_eq!(config.param_key, "filters");
    }

    #[test]
    fn zero_delay_falls_back() {
        let config = FilterConfig {
            debounce_ms: 0,
            ..FilterConfig::default()
        };
        assert_eq!(config.debounce_delay(), Duration::from_millis(300));
    }

    #[test]
    fn blank_param_key_is_rejected() {
        let config = FilterConfig {
            param_key: " ".into(),
            ..FilterConfig::default()
        };
        assert!(matches!(config.validate(), Err(FilterError::Config(_))));
    }
}
