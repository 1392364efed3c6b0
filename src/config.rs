use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub analysis: AnalysisConfig,
    pub cache: CacheConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// Analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Additional exclude globs, merged on top of resolved ignore rules
    pub exclude: Vec<String>,
    /// File globs selected for extraction
    pub include: Vec<String>,
    /// Maximum dependency-traversal depth reported in metrics
    pub max_depth: usize,
    /// Whether test files participate in analysis
    pub include_tests: bool,
    /// Files larger than this many bytes keep their content unread
    pub max_file_size: u64,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds before a cached analysis expires
    pub max_age_secs: u64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            description: None,
            version: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude: vec![],
            include: vec![
                "**/*.ts".to_string(),
                "**/*.tsx".to_string(),
                "**/*.js".to_string(),
                "**/*.jsx".to_string(),
            ],
            max_depth: 10,
            include_tests: false,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_age_secs: 3600 }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        exclude: Vec<String>,
        max_depth: Option<usize>,
        include_tests: bool,
    ) {
        if !exclude.is_empty() {
            self.analysis.exclude.extend(exclude);
        }

        if let Some(d) = max_depth {
            self.analysis.max_depth = d;
        }

        if include_tests {
            self.analysis.include_tests = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_depth == 0 {
            return Err(Error::config_validation("max_depth must be at least 1"));
        }

        if self.analysis.max_depth > 100 {
            return Err(Error::config_validation("max_depth cannot exceed 100"));
        }

        if self.analysis.include.is_empty() {
            return Err(Error::config_validation(
                "at least one include pattern required",
            ));
        }

        if self.analysis.max_file_size == 0 {
            return Err(Error::config_validation("max_file_size must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.name, "Untitled Project");
        assert_eq!(config.analysis.max_depth, 10);
        assert!(!config.analysis.include_tests);
        assert_eq!(config.cache.max_age_secs, 3600);
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[project]
name = "My Project"
description = "Test project"

[analysis]
max_depth = 4
include_tests = true

[cache]
max_age_secs = 60
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.project.name, "My Project");
        assert_eq!(config.analysis.max_depth, 4);
        assert!(config.analysis.include_tests);
        assert_eq!(config.cache.max_age_secs, 60);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_max_depth_zero() {
        let mut config = Config::default();
        config.analysis.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_max_depth_too_high() {
        let mut config = Config::default();
        config.analysis.max_depth = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_include() {
        let mut config = Config::default();
        config.analysis.include.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_cli_exclude() {
        let mut config = Config::default();
        config.merge_cli(vec!["vendor/**".to_string()], None, false);
        assert!(config.analysis.exclude.contains(&"vendor/**".to_string()));
    }

    #[test]
    fn test_merge_cli_depth_and_tests() {
        let mut config = Config::default();
        config.merge_cli(vec![], Some(3), true);
        assert_eq!(config.analysis.max_depth, 3);
        assert!(config.analysis.include_tests);
    }
}
