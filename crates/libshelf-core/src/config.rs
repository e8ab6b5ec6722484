use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::snapshot::DEFAULT_SNAPSHOT;

/// File name of the optional config file kept next to the snapshot.
pub const CONFIG_FILE: &str = "libshelf.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_true")]
    pub demangle: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            demangle: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub names: NameStyle,
    #[serde(default)]
    pub quote: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Preferred output mode (`pretty`, `text` or `json`).
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            names: NameStyle::default(),
            quote: String::new(),
            separator: default_separator(),
            format: None,
        }
    }
}

/// How library names are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    /// Canonical identifier (`foo`).
    #[default]
    Short,
    /// File name (`libfoo.so`).
    Full,
}

impl FromStr for NameStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown name style '{other}' (expected short or full)")),
        }
    }
}

impl fmt::Display for NameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Short => "short",
            Self::Full => "full",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub snapshot_path: PathBuf,
    pub nm_program: String,
    pub resolved_output: String,
}

/// Config file that belongs to a snapshot path.
#[must_use]
pub fn config_path_for(snapshot: &Path) -> PathBuf {
    snapshot
        .parent()
        .map_or_else(|| PathBuf::from(CONFIG_FILE), |dir| dir.join(CONFIG_FILE))
}

pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(cli_project: Option<&Path>, cli_format: Option<&str>) -> Result<EffectiveConfig> {
    let snapshot_path = resolve_snapshot_path(cli_project, env::var("LIBSHELF_PROJECT").ok());
    let project = load_project_config(&config_path_for(&snapshot_path))?;

    let nm_program = env::var("LIBSHELF_NM")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| project.extractor.program.clone());

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, project.output.format.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        snapshot_path,
        nm_program,
        resolved_output,
    })
}

fn resolve_snapshot_path(cli_project: Option<&Path>, env_project: Option<String>) -> PathBuf {
    if let Some(path) = cli_project {
        return path.to_path_buf();
    }
    env_project
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT), PathBuf::from)
}

fn resolve_output(
    cli_format: Option<&str>,
    config_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if let Some(raw) = cli_format {
        return normalize_output_mode(raw)
            .map(str::to_string)
            .with_context(|| format!("Unknown output format '{raw}'"));
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = config_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_true() -> bool {
    true
}

fn default_program() -> String {
    "nm".to_string()
}

fn default_separator() -> String {
    ", ".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(&dir.path().join(CONFIG_FILE)).expect("load should succeed");
        assert_eq!(cfg.extractor.program, "nm");
        assert!(cfg.extractor.demangle);
        assert_eq!(cfg.output.names, NameStyle::Short);
        assert_eq!(cfg.output.separator, ", ");
        assert!(cfg.output.quote.is_empty());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[extractor]
program = "llvm-nm"
demangle = false

[output]
names = "full"
quote = "'"
format = "json"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(&path).expect("parse");
        assert_eq!(cfg.extractor.program, "llvm-nm");
        assert!(!cfg.extractor.demangle);
        assert_eq!(cfg.output.names, NameStyle::Full);
        assert_eq!(cfg.output.quote, "'");
        assert_eq!(cfg.output.separator, ", ");
        assert_eq!(cfg.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn malformed_config_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[output\nnames = 3").expect("write");
        let err = load_project_config(&path).expect_err("invalid toml");
        assert!(format!("{err}").contains("Failed to parse"));
    }

    #[test]
    fn config_lives_next_to_snapshot() {
        assert_eq!(
            config_path_for(Path::new("/work/proj/libs.json")),
            PathBuf::from("/work/proj/libshelf.toml")
        );
        assert_eq!(config_path_for(Path::new("libs.json")), PathBuf::from("libshelf.toml"));
    }

    #[test]
    fn cli_project_overrides_env() {
        let path = resolve_snapshot_path(Some(Path::new("cli.json")), Some("env.json".into()));
        assert_eq!(path, PathBuf::from("cli.json"));
        let path = resolve_snapshot_path(None, Some("env.json".into()));
        assert_eq!(path, PathBuf::from("env.json"));
        let path = resolve_snapshot_path(None, Some("  ".into()));
        assert_eq!(path, PathBuf::from(DEFAULT_SNAPSHOT));
    }

    #[test]
    fn cli_format_overrides_env_and_config() {
        let output = resolve_output(Some("json"), Some("pretty".to_string()), Some("text".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "json");
    }

    #[test]
    fn env_format_overrides_config() {
        let output = resolve_output(None, Some("json".to_string()), Some("TEXT".to_string()))
            .expect("resolve should succeed");
        assert_eq!(output, "text");
    }

    #[test]
    fn unknown_cli_format_is_an_error() {
        assert!(resolve_output(Some("yaml"), None, None).is_err());
    }

    #[test]
    fn name_style_parses() {
        assert_eq!("short".parse::<NameStyle>(), Ok(NameStyle::Short));
        assert_eq!("FULL".parse::<NameStyle>(), Ok(NameStyle::Full));
        assert!("long".parse::<NameStyle>().is_err());
        assert_eq!(NameStyle::Full.to_string(), "full");
    }
}
