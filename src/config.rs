//! Optional `natdoc.toml` inside a draft directory.
//!
//! ```toml
//! category = "fundamental"
//! chapter = "basics"
//! name = "fhe-counter"
//! template = "docs/README.md.hbs"
//!
//! [[authors]]
//! name = "Zama"
//! email = "hello@zama.ai"
//! ```

use crate::metadata::{Author, MetadataDefaults};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "natdoc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: Option<String>,
    pub category: Option<String>,
    pub chapter: Option<String>,
    /// Relative paths resolve against the draft directory.
    pub template: Option<PathBuf>,
    pub authors: Vec<Author>,
}

impl Config {
    /// Load `<draft>/natdoc.toml`; a missing file yields the empty config.
    pub fn load(draft: &Path) -> Result<Self, ConfigError> {
        let path = draft.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        if let Some(template) = config.template.take() {
            config.template = Some(if template.is_absolute() {
                template
            } else {
                draft.join(template)
            });
        }
        Ok(config)
    }

    /// Defaults for synthesis. `overrides` (CLI flags) win over file values.
    pub fn defaults(&self, overrides: &MetadataDefaults) -> MetadataDefaults {
        MetadataDefaults {
            name: overrides.name.clone().or_else(|| self.name.clone()),
            category: overrides.category.clone().or_else(|| self.category.clone()),
            chapter: overrides.chapter.clone().or_else(|| self.chapter.clone()),
            authors: if overrides.authors.is_empty() {
                self.authors.clone()
            } else {
                overrides.authors.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn parses_and_ignores_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "category = \"applied\"\ntemplate = \"tpl.hbs\"\nflavour = \"mint\"\n\n[[authors]]\nname = \"Zama\"\nemail = \"hello@zama.ai\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.category.as_deref(), Some("applied"));
        assert_eq!(config.template, Some(dir.path().join("tpl.hbs")));
        assert_eq!(config.authors[0].email.as_deref(), Some("hello@zama.ai"));
    }

    #[test]
    fn malformed_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "category = ").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn cli_overrides_file() {
        let config = Config {
            category: Some("applied".into()),
            chapter: Some("games".into()),
            ..Default::default()
        };
        let defaults = config.defaults(&MetadataDefaults {
            chapter: Some("defi".into()),
            ..Default::default()
        });
        assert_eq!(defaults.category.as_deref(), Some("applied"));
        assert_eq!(defaults.chapter.as_deref(), Some("defi"));
    }
}
