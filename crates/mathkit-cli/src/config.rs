//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$MATHKIT_CONFIG` environment variable
//! 2. `<platform config dir>/mathkit/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use mathkit_core::NormalizeMethod;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// How results are printed.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Decimal places in text output.
    pub precision: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Used when `--method` is not given.
    pub method: NormalizeMethod,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            precision: 6,
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MATHKIT_CONFIG") {
        return Some(PathBuf::from(p));
    }

    directories::ProjectDirs::from("dev", "mathkit", "mathkit")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Show the active config path (for `mathkit config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.precision, 6);
        assert_eq!(config.normalize.method, NormalizeMethod::ZScore);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[output]
precision = 3
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.precision, 3);
        // Other fields should be defaults
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.normalize.method, NormalizeMethod::ZScore);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[output]
format = "json"
precision = 2

[normalize]
method = "robust"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.precision, 2);
        assert_eq!(config.normalize.method, NormalizeMethod::Robust);
    }

    #[test]
    fn test_rejects_unknown_method() {
        let toml_str = r#"
[normalize]
method = "log"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[normalize]\nmethod = \"minmax\"").unwrap();
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.normalize.method, NormalizeMethod::MinMax);
    }

    #[test]
    fn test_load_config_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output\nprecision = ").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("parsing"));
    }
}
