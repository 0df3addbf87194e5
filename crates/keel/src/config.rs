//! Configuration types for the Keel editor.
//!
//! All types implement [`serde::Deserialize`] and default every missing
//! section, so an empty document is a valid configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining history and deletion settings.
//! - [`HistoryConfig`] - Controls how much undo history is kept.
//! - [`DeletionConfig`] - Controls deletions that cannot be ordered safely.
//!
//! # Example
//!
//! ```
//! # use keel::config::AppConfig;
//! let config = AppConfig::from_toml_str(
//!     r#"
//!     [history]
//!     max_depth = 50
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.history().max_depth(), Some(50));
//! assert!(!config.deletion().allow_unordered());
//! ```

use log::debug;
use serde::Deserialize;

use crate::KeelError;

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Undo history section.
    #[serde(default)]
    history: HistoryConfig,

    /// Deletion section.
    #[serde(default)]
    deletion: DeletionConfig,
}

impl AppConfig {
    pub fn new(history: HistoryConfig, deletion: DeletionConfig) -> Self {
        Self { history, deletion }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`KeelError::Config`] if the text is not valid TOML or does not
    /// match the configuration layout.
    pub fn from_toml_str(source: &str) -> Result<Self, KeelError> {
        let config: Self = toml::from_str(source)?;
        debug!(config:?; "Loaded configuration");
        Ok(config)
    }

    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }

    pub fn deletion(&self) -> &DeletionConfig {
        &self.deletion
    }
}

/// Undo history settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands kept; unlimited when absent.
    #[serde(default)]
    max_depth: Option<usize>,
}

impl HistoryConfig {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }

    /// Returns the undo depth limit, or `None` for unlimited history.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

/// Deletion settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeletionConfig {
    /// Accept PSM deletions that have no safe removal order. Such deletions
    /// cannot be undone and clear the history.
    #[serde(default)]
    allow_unordered: bool,
}

impl DeletionConfig {
    pub fn new(allow_unordered: bool) -> Self {
        Self { allow_unordered }
    }

    pub fn allow_unordered(&self) -> bool {
        self.allow_unordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.history().max_depth(), None);
    }

    #[test]
    fn test_full_document() {
        let config = AppConfig::from_toml_str(
            r#"
            [history]
            max_depth = 10

            [deletion]
            allow_unordered = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            AppConfig::new(HistoryConfig::new(Some(10)), DeletionConfig::new(true))
        );
    }

    #[test]
    fn test_wrong_type_is_a_config_error() {
        let result = AppConfig::from_toml_str("[history]\nmax_depth = \"ten\"");

        assert!(matches!(result, Err(KeelError::Config(_))));
    }
}
