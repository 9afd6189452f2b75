//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/mapnotate/mapnotate.toml`
//! 3. Environment variables: `MAPNOTATE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::AnnotationError;

/// Vocabulary bases and engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URI prepended to type names in `itemtype` attributes
    pub vocabulary_base: String,
    /// Dublin Core legacy element namespace
    pub dc_elements_base: String,
    /// Dublin Core terms namespace
    pub dc_terms_base: String,
    /// Geo property name used when an entity declares none
    pub default_geoprop: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vocabulary_base: "http://schema.org/".into(),
            dc_elements_base: "http://purl.org/dc/elements/1.1/".into(),
            dc_terms_base: "http://purl.org/dc/terms/".into(),
            default_geoprop: "geo".into(),
        }
    }
}

/// Raw settings for intermediate parsing (fields are Option to detect
/// "not specified", which inherits from the lower layer).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    vocabulary_base: Option<String>,
    dc_elements_base: Option<String>,
    dc_terms_base: Option<String>,
    default_geoprop: Option<String>,
}

/// Get the XDG config directory for mapnotate.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mapnotate").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("mapnotate.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, AnnotationError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| AnnotationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            vocabulary_base: overlay
                .vocabulary_base
                .clone()
                .unwrap_or_else(|| self.vocabulary_base.clone()),
            dc_elements_base: overlay
                .dc_elements_base
                .clone()
                .unwrap_or_else(|| self.dc_elements_base.clone()),
            dc_terms_base: overlay
                .dc_terms_base
                .clone()
                .unwrap_or_else(|| self.dc_terms_base.clone()),
            default_geoprop: overlay
                .default_geoprop
                .clone()
                .unwrap_or_else(|| self.default_geoprop.clone()),
        }
    }

    /// Load settings with layered precedence.
    pub fn load() -> Result<Self, AnnotationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        Ok(current)
    }

    /// Load a config file directly, merged over the compiled defaults.
    pub fn load_from(path: &Path) -> Result<Self, AnnotationError> {
        let raw = load_raw_settings(path)?;
        Ok(Self::default().merge_with(&raw))
    }

    /// Apply MAPNOTATE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, AnnotationError> {
        let builder =
            Config::builder().add_source(Environment::with_prefix("MAPNOTATE").separator("__"));
        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("vocabulary_base") {
            settings.vocabulary_base = val;
        }
        if let Ok(val) = config.get_string("dc_elements_base") {
            settings.dc_elements_base = val;
        }
        if let Ok(val) = config.get_string("dc_terms_base") {
            settings.dc_terms_base = val;
        }
        if let Ok(val) = config.get_string("default_geoprop") {
            settings.default_geoprop = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, AnnotationError> {
        toml::to_string_pretty(self).map_err(|e| AnnotationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# mapnotate configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/mapnotate/mapnotate.toml
#   Env:    MAPNOTATE_* environment variables (explicit overrides)

# Base URI for itemtype attributes
# vocabulary_base = "http://schema.org/"

# Dublin Core namespaces for bibliographic meta elements
# dc_elements_base = "http://purl.org/dc/elements/1.1/"
# dc_terms_base = "http://purl.org/dc/terms/"

# Geo property name applied when an entity declares none
# default_geoprop = "geo"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> AnnotationError {
    AnnotationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.vocabulary_base, "http://schema.org/");
        assert_eq!(settings.default_geoprop, "geo");
    }

    #[test]
    fn given_partial_file_when_loading_then_unspecified_fields_inherit() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "default_geoprop = \"contentLocation\"").unwrap();

        let settings = Settings::load_from(file.path()).expect("load");
        assert_eq!(settings.default_geoprop, "contentLocation");
        assert_eq!(settings.vocabulary_base, "http://schema.org/");
    }

    #[test]
    fn given_invalid_toml_when_loading_then_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "vocabulary_base = [not toml").unwrap();

        let result = Settings::load_from(file.path());
        assert!(matches!(result, Err(AnnotationError::Config { .. })));
    }

    #[test]
    fn given_settings_when_serializing_then_round_trips() {
        let settings = Settings::default();
        let toml_text = settings.to_toml().expect("serialize");
        let parsed: Settings = toml::from_str(&toml_text).expect("parse");
        assert_eq!(parsed, settings);
    }
}
