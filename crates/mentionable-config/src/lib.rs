use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Declarative engine setup: the markup template plus one entry per mention
/// source. Providers and grouping classifiers are code, not data; the host
/// attaches those when it builds an engine from these settings.
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Markup template string; `None` means the engine default
    /// (`@[__display__](__id__)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub type_key: String,
    /// Literal trigger token, e.g. `@` or `#`.
    pub trigger: String,
    #[serde(default)]
    pub allow_space_in_query: bool,
    #[serde(default)]
    pub append_space_on_add: bool,
    #[serde(default)]
    pub group_order: Vec<String>,
    /// Optional inline candidate list for word-list-backed sources.
    #[serde(default)]
    pub candidates: Vec<CandidateSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSettings {
    pub id: String,
    pub display: String,
    /// Group name within the source's `group_order`; candidates without one
    /// fall into the first declared group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl EngineConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: EngineConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = EngineConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = EngineConfig {
            template: Some("@[__display__](__id__)".to_string()),
            sources: vec![SourceSettings {
                type_key: "user".to_string(),
                trigger: "@".to_string(),
                allow_space_in_query: false,
                append_space_on_add: true,
                group_order: vec!["admins".to_string(), "all".to_string()],
                candidates: vec![CandidateSettings {
                    id: "1".to_string(),
                    display: "alice".to_string(),
                    group: Some("admins".to_string()),
                }],
            }],
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.template, original.template);
        assert_eq!(deserialized.sources.len(), 1);
        let source = &deserialized.sources[0];
        assert_eq!(source.type_key, "user");
        assert!(source.append_space_on_add);
        assert_eq!(source.group_order, vec!["admins", "all"]);
        assert_eq!(source.candidates[0].display, "alice");
        assert_eq!(source.candidates[0].group.as_deref(), Some("admins"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mentions.toml");

        let config = EngineConfig {
            template: None,
            sources: vec![SourceSettings {
                type_key: "channel".to_string(),
                trigger: "#".to_string(),
                allow_space_in_query: true,
                append_space_on_add: false,
                group_order: vec![],
                candidates: vec![],
            }],
        };
        config.save_to_path(&path).unwrap();

        let loaded = EngineConfig::load_from_path(&path).unwrap().unwrap();
        assert!(loaded.template.is_none());
        assert_eq!(loaded.sources[0].trigger, "#");
        assert!(loaded.sources[0].allow_space_in_query);
    }

    #[test]
    fn test_minimal_toml_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [[sources]]
            type_key = "user"
            trigger = "@"

            [[sources.candidates]]
            id = "1"
            display = "alice"
            "#,
        )
        .unwrap();

        let source = &config.sources[0];
        assert!(!source.allow_space_in_query);
        assert!(!source.append_space_on_add);
        assert!(source.group_order.is_empty());
        assert!(source.candidates[0].group.is_none());
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "sources = 3").unwrap();

        let err = EngineConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
