use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable naming the configuration file to load.
pub const CONFIG_PATH_ENV: &str = "FLOE_CONFIG_PATH";
/// Configuration file consulted when `FLOE_CONFIG_PATH` is unset. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "crates/common/config/default.toml";
/// Name of the catalog document inside `file.location`.
pub const METADATA_FILE_NAME: &str = "metadata.json";

const DEFAULT_LINES_PER_SPLIT: u64 = 10_000;

/// How a table's files are turned into splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// One split covering each regular file.
    #[default]
    PerFile,
    /// Consecutive line ranges of at most `lines_per_split` lines per file.
    PerLineRange { lines_per_split: NonZeroU64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitPolicyKind {
    #[default]
    PerFile,
    PerLineRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSettings {
    /// The `file.location` option: root holding `metadata.json` and table directories.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub split_policy: SplitPolicyKind,
    #[serde(default = "default_lines_per_split")]
    pub lines_per_split: u64,
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("FLOE")
        .separator("__")
        .try_parsing(true)
}

fn default_lines_per_split() -> u64 {
    DEFAULT_LINES_PER_SPLIT
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            location: String::new(),
            split_policy: SplitPolicyKind::default(),
            lines_per_split: default_lines_per_split(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub file: FileSettings,
}

impl Settings {
    /// Loads settings from `FLOE_CONFIG_PATH` (or the default file, if present),
    /// overridden by `FLOE__FILE__*` environment variables.
    pub fn new() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Same as [`Settings::new`], reading variables from `vars` instead of the
    /// process environment.
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self> {
        let config_file_path = vars.get(CONFIG_PATH_ENV).cloned();
        Self::build(config_file_path.as_deref(), environment().source(Some(vars)))
    }

    /// Loads settings from an explicit file, which must exist.
    pub fn load(config_file_path: Option<&str>) -> Result<Self> {
        Self::build(config_file_path, environment())
    }

    fn build(config_file_path: Option<&str>, env: config::Environment) -> Result<Self> {
        let file_source = match config_file_path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let s = config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()?;
        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            file: FileSettings {
                location: location.into(),
                ..FileSettings::default()
            },
        }
    }

    pub fn with_split_policy(mut self, policy: SplitPolicy) -> Self {
        match policy {
            SplitPolicy::PerFile => self.file.split_policy = SplitPolicyKind::PerFile,
            SplitPolicy::PerLineRange { lines_per_split } => {
                self.file.split_policy = SplitPolicyKind::PerLineRange;
                self.file.lines_per_split = lines_per_split.get();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.file.location.trim().is_empty() {
            return Err(Error::Config("file.location must be set".to_string()));
        }
        self.split_policy().map(|_| ())
    }

    pub fn location(&self) -> &Path {
        Path::new(&self.file.location)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.location().join(METADATA_FILE_NAME)
    }

    pub fn split_policy(&self) -> Result<SplitPolicy> {
        match self.file.split_policy {
            SplitPolicyKind::PerFile => Ok(SplitPolicy::PerFile),
            SplitPolicyKind::PerLineRange => NonZeroU64::new(self.file.lines_per_split)
                .map(|lines_per_split| SplitPolicy::PerLineRange { lines_per_split })
                .ok_or_else(|| {
                    Error::Config("file.lines_per_split must be greater than zero".to_string())
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> String {
        let path = dir.path().join("connector.toml");
        fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[file]\nlocation = \"/srv/data\"\nsplit_policy = \"per-line-range\"\nlines_per_split = 500\n",
        );

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.location(), Path::new("/srv/data"));
        assert_eq!(settings.metadata_path(), Path::new("/srv/data/metadata.json"));
        assert_eq!(
            settings.split_policy().unwrap(),
            SplitPolicy::PerLineRange { lines_per_split: NonZeroU64::new(500).unwrap() }
        );
    }

    #[test]
    fn test_defaults_to_per_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[file]\nlocation = \"/srv/data\"\n");

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.split_policy().unwrap(), SplitPolicy::PerFile);
        assert_eq!(settings.file.lines_per_split, DEFAULT_LINES_PER_SPLIT);
    }

    #[test]
    fn test_missing_location_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[file]\nlocation = \"  \"\n");

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = Settings::load(Some("/nonexistent/floe/connector.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_lines_per_split_rejected() {
        let mut settings = Settings::from_location("/srv/data");
        settings.file.split_policy = SplitPolicyKind::PerLineRange;
        settings.file.lines_per_split = 0;
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_with_split_policy() {
        let lines = NonZeroU64::new(42).unwrap();
        let settings = Settings::from_location("/srv/data")
            .with_split_policy(SplitPolicy::PerLineRange { lines_per_split: lines });
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.split_policy().unwrap(),
            SplitPolicy::PerLineRange { lines_per_split: lines }
        );
    }

    #[test]
    fn test_env_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[file]\nlocation = \"/srv/file\"\nsplit_policy = \"per-file\"\n");

        let vars = config::Map::from([
            (CONFIG_PATH_ENV.to_string(), path),
            ("FLOE__FILE__LOCATION".to_string(), "/srv/env".to_string()),
            ("FLOE__FILE__SPLIT_POLICY".to_string(), "per-line-range".to_string()),
            ("FLOE__FILE__LINES_PER_SPLIT".to_string(), "250".to_string()),
        ]);

        let settings = Settings::from_vars(vars).unwrap();
        assert_eq!(settings.location(), Path::new("/srv/env"));
        assert_eq!(
            settings.split_policy().unwrap(),
            SplitPolicy::PerLineRange { lines_per_split: NonZeroU64::new(250).unwrap() }
        );
    }

    #[test]
    fn test_config_path_variable_is_required_to_exist() {
        let vars = config::Map::from([(
            CONFIG_PATH_ENV.to_string(),
            "/nonexistent/floe/connector.toml".to_string(),
        )]);
        assert!(matches!(Settings::from_vars(vars), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_only_settings() {
        let vars = config::Map::from([
            ("FLOE__FILE__LOCATION".to_string(), "/srv/env-only".to_string()),
            ("UNRELATED".to_string(), "ignored".to_string()),
        ]);

        let settings = Settings::from_vars(vars).unwrap();
        assert_eq!(settings.location(), Path::new("/srv/env-only"));
        assert_eq!(settings.split_policy().unwrap(), SplitPolicy::PerFile);
    }

    #[test]
    fn test_shipped_default_config_points_at_sample_data() {
        let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let default_config = workspace_root.join(DEFAULT_CONFIG_PATH);

        let settings = Settings::load(Some(default_config.to_str().unwrap())).unwrap();
        assert_eq!(settings.split_policy().unwrap(), SplitPolicy::PerFile);
        assert!(workspace_root.join(settings.metadata_path()).is_file());
    }
}
