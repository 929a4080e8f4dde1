//! Driver configuration: optional TOML file, overridden by flags

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ifacegen_core::NamingConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTDIR: &str = "gen";

/// Contents of an `ifacegen.toml` file
///
/// ```toml
/// [naming]
/// prefix = "IF"
///
/// [output]
/// dir = "generated"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub naming: NamingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Settings for one driver run, shared by every input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub naming: NamingConfig,
    pub outdir: PathBuf,
    pub verbose: bool,
    pub to_stdout: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::new(),
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            verbose: false,
            to_stdout: false,
        }
    }
}

impl GeneratorConfig {
    /// Layer command-line values over the config file. A flag that was not
    /// given keeps the file value, then the built-in default.
    pub fn layered(file: ConfigFile, prefix: Option<String>, outdir: Option<PathBuf>) -> Self {
        let prefix = prefix.or(file.naming.prefix).unwrap_or_default();
        Self {
            naming: NamingConfig::with_prefix(prefix),
            outdir: outdir
                .or(file.output.dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            [naming]
            prefix = "IF"

            [output]
            dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(file.naming.prefix.as_deref(), Some("IF"));
        assert_eq!(file.output.dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_sections_are_optional() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_flags_override_file() {
        let file: ConfigFile =
            toml::from_str("[naming]\nprefix = \"IF\"\n[output]\ndir = \"out\"").unwrap();
        let config = GeneratorConfig::layered(file, Some("XY".into()), None);
        assert_eq!(config.naming.prefix.as_deref(), Some("XY"));
        assert_eq!(config.outdir, PathBuf::from("out"));

        let config = GeneratorConfig::layered(ConfigFile::default(), None, None);
        assert_eq!(config.naming.prefix, None);
        assert_eq!(config.outdir, PathBuf::from(DEFAULT_OUTDIR));
    }

    #[test]
    fn test_empty_prefix_flag_clears_file_prefix() {
        let file: ConfigFile = toml::from_str("[naming]\nprefix = \"IF\"").unwrap();
        let config = GeneratorConfig::layered(file, Some(String::new()), None);
        assert_eq!(config.naming.prefix, None);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = ConfigFile::from_file(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
