//! Style file handling
//!
//! Styles are stored as TOML:
//!
//! ```toml
//! [dots]
//! kind = "lines"
//! direction = "vertical"
//! cap = "rounded"
//!
//! [foreground]
//! kind = "linear_gradient"
//! start = "#1e3a8a"
//! end = "#9333ea"
//! direction = "top_left_to_bottom_right"
//! ```

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::style::StyleConfig;

impl StyleConfig {
    /// Load a style from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded style");
        Ok(config)
    }

    /// Parse a style from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the style to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
