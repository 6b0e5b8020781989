//! User configuration (`config.toml`).
//!
//! ```toml
//! version = "1.0"      # version tag for new documents, expected when opening
//! normalize = "upper"  # "upper", "lower" or "none"
//! max_row = 9999       # optional: reject names with a larger row number
//! ```

use cellgraph_core::{DEFAULT_VERSION, NameRules};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalize {
    #[default]
    Upper,
    Lower,
    None,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: Option<String>,
    pub normalize: Normalize,
    pub max_row: Option<u64>,
}

impl Config {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    pub fn name_rules(&self) -> NameRules {
        let rules = match self.normalize {
            Normalize::Upper => NameRules::default(),
            Normalize::Lower => NameRules::default().with_normalizer(|name| name.to_ascii_lowercase()),
            Normalize::None => NameRules::default().with_normalizer(str::to_string),
        };
        match self.max_row {
            Some(max_row) => rules.with_validator(move |name| row_number(name).is_some_and(|row| row <= max_row)),
            None => rules,
        }
    }
}

/// The digits after the column letters.
fn row_number(name: &str) -> Option<u64> {
    name.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// Load the config file, falling back to defaults.
///
/// Uses `path` if given, otherwise `config.toml` in the user's config
/// directory. A missing default file is silent; every other problem is
/// returned as a warning.
pub fn load_config(path: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(config_path) = path.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !config_path.exists() {
        if path.is_some() {
            warnings.push(format!("Config file not found: {}", config_path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&config_path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                config_path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", config_path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", config_path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                config_path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "cellgraph", "cellgraph")?;
    Some(proj.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.version(), DEFAULT_VERSION);
        assert_eq!(config.name_rules().resolve("a1").as_deref(), Some("A1"));
    }

    #[test]
    fn test_load_config_reads_keys() {
        let (_dir, path) = write_config("version = \"2.0\"\nnormalize = \"lower\"\nmax_row = 100\n");
        let (config, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.version(), "2.0");
        assert_eq!(config.normalize, Normalize::Lower);

        let rules = config.name_rules();
        assert_eq!(rules.resolve("B7").as_deref(), Some("b7"));
        assert!(rules.is_valid("c100"));
        assert!(!rules.is_valid("c101"));
    }

    #[test]
    fn test_normalize_none_keeps_case() {
        let config = Config {
            normalize: Normalize::None,
            ..Config::default()
        };
        assert_eq!(config.name_rules().resolve("aB3").as_deref(), Some("aB3"));
    }

    #[test]
    fn test_bad_config_falls_back_with_warning() {
        let (_dir, path) = write_config("normalize = \"sideways\"\n");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let (_dir, path) = write_config("colour = \"red\"\n");
        let (_, warnings) = load_config(Some(&path));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, Config::default());
        assert!(warnings[0].starts_with("Config file not found"));
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let (_dir, path) = write_config(&"#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1));
        let (_, warnings) = load_config(Some(&path));
        assert!(warnings[0].starts_with("Refusing to read"));
    }
}
