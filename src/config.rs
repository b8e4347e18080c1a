//! Build configuration
//!
//! Loaded from a TOML file (`sdksplit.toml` by default). Every field has a
//! default, so an empty file is valid as long as the source root is supplied
//! some other way.
//!
//! Precedence for the output root: file value, then the `OUTPUT_PATH`
//! environment variable, then the command line.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::splitter::{
    ImportSet, OutputLayout, ParserOptions, SourceLayout, DEFAULT_FRAMEWORK_IMPORT,
    DEFAULT_IGNORED_DIRS,
};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "sdksplit.toml";

/// Environment variable overriding `output_root`.
pub const OUTPUT_PATH_ENV: &str = "OUTPUT_PATH";

/// Upper bound for `jobs`.
pub const MAX_JOBS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Root of the monolithic SDK (`types/`, one dir per resource group).
    pub source_root: PathBuf,
    /// Where split packages are written.
    pub output_root: PathBuf,
    /// Prefix of every published package name, e.g. `@scope/`.
    pub package_prefix: String,
    /// Import line seeding slices and prepended to implementation files.
    pub framework_import: String,
    /// Source file extension, without the dot.
    pub extension: String,
    /// Emit one `types` tree per API version.
    pub split_versions: bool,
    /// Remove the output root before building.
    pub clean: bool,
    /// Worker threads (0 = use all cores)
    pub jobs: usize,
    /// Source root directories that are not resource groups.
    pub ignored_dirs: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            source_root: PathBuf::new(),
            output_root: PathBuf::from("output/packages"),
            package_prefix: "@azure-native-split/".to_string(),
            framework_import: DEFAULT_FRAMEWORK_IMPORT.to_string(),
            extension: "ts".to_string(),
            split_versions: true,
            clean: false,
            jobs: 0,
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BuildConfig {
    /// Load from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else `sdksplit.toml` if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply the `OUTPUT_PATH` environment variable, if set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_output_override(std::env::var_os(OUTPUT_PATH_ENV).map(PathBuf::from));
    }

    pub fn apply_output_override(&mut self, output: Option<PathBuf>) {
        if let Some(output) = output.filter(|p| !p.as_os_str().is_empty()) {
            self.output_root = output;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "source_root is not set (config file or --source)".to_string(),
            ));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output_root is empty".to_string()));
        }
        if self.jobs > MAX_JOBS {
            return Err(ConfigError::Invalid(format!(
                "jobs = {} exceeds the maximum of {}",
                self.jobs, MAX_JOBS
            )));
        }
        if self.package_prefix.is_empty() {
            return Err(ConfigError::Invalid("package_prefix is empty".to_string()));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "extension '{}' must be non-empty and given without a leading dot",
                self.extension
            )));
        }
        Ok(())
    }

    /// Worker thread count with `0` resolved to the number of cores.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }

    pub fn source_layout(&self) -> SourceLayout {
        SourceLayout::new(&self.source_root, &self.extension)
    }

    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_root)
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            header: self.framework_import.clone(),
            split_versions: self.split_versions,
        }
    }

    pub fn imports(&self) -> ImportSet {
        ImportSet::new(&self.framework_import, &self.package_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: BuildConfig = toml::from_str("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.ignored_dirs, vec!["scripts", "types"]);
        assert!(config.split_versions);
    }

    #[test]
    fn test_partial_file_overrides() {
        let config: BuildConfig = toml::from_str(
            r#"
source_root = "sdk/nodejs"
split_versions = false
jobs = 4
"#,
        )
        .unwrap();
        assert_eq!(config.source_root, PathBuf::from("sdk/nodejs"));
        assert!(!config.split_versions);
        assert_eq!(config.effective_jobs(), 4);
        assert_eq!(config.extension, "ts");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sdksplit.toml");
        std::fs::write(&path, "sourceroot = \"x\"\n").unwrap();
        assert!(matches!(
            BuildConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            BuildConfig::from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = BuildConfig::default();
        assert!(config.validate().is_err(), "source_root required");

        config.source_root = PathBuf::from("sdk");
        assert!(config.validate().is_ok());

        config.extension = ".ts".to_string();
        assert!(config.validate().is_err());
        config.extension = "ts".to_string();

        config.jobs = MAX_JOBS + 1;
        assert!(config.validate().is_err());
        config.jobs = 0;

        config.package_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_override_ignores_empty() {
        let mut config = BuildConfig::default();
        config.apply_output_override(Some(PathBuf::new()));
        assert_eq!(config.output_root, PathBuf::from("output/packages"));
        config.apply_output_override(Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
        config.apply_output_override(None);
        assert_eq!(config.output_root, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_zero_jobs_uses_all_cores() {
        assert_eq!(BuildConfig::default().effective_jobs(), num_cpus::get());
    }
}
