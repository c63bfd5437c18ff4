//! Run settings and extension filtering.
//!
//! Settings come from two places: an optional TOML configuration file and the
//! command line. The command line wins field by field. The merged result is a
//! [`SortSettings`] value that the rest of the crate only ever reads.
//!
//! # Configuration File Format
//!
//! ```toml
//! [settings]
//! source = "/home/user/Camera"
//! target = "/home/user/Pictures/sorted"
//! backup = true
//! include = [".jpg", ".png"]
//! exclude = []
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the audit log written inside the target directory.
pub const LOG_FILE_NAME: &str = "log.txt";

/// Name of the backup directory created inside the target directory.
pub const BACKUP_DIR_NAME: &str = "_BACKUP_";

/// Errors that can occur while loading or validating settings.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
    /// The source or target directory was not given.
    MissingDirectory(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::MissingDirectory(which) => {
                write!(f, "{} directory must be specified", which)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings as they appear in a configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub target: Option<PathBuf>,
    #[serde(default)]
    pub backup: Option<bool>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: FileSettings,
}

impl ConfigFile {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.datesortrc.toml` in the current directory
    /// 3. Look for `~/.config/datesort/config.toml` in home directory
    /// 4. Fall back to an empty configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".datesortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("datesort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Include and exclude extension lists.
///
/// Entries are stored lower-cased with a leading dot, in the order they were
/// first given, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            include: normalize_all(include),
            exclude: normalize_all(exclude),
        }
    }

    /// Builds a filter from two comma-separated lists, as typed by a user.
    pub fn from_lists(include: &str, exclude: &str) -> Self {
        Self::new(parse_list(include), parse_list(exclude))
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Extensions present in both lists, in include-list order.
    pub fn overlap(&self) -> Vec<String> {
        self.include
            .iter()
            .filter(|ext| self.exclude.contains(ext))
            .cloned()
            .collect()
    }

    /// True when a non-empty include list does not contain `extension`.
    pub fn include_rejects(&self, extension: &str) -> bool {
        !self.include.is_empty() && !self.include.iter().any(|e| e == extension)
    }

    /// True when the exclude list contains `extension`.
    pub fn exclude_rejects(&self, extension: &str) -> bool {
        self.exclude.iter().any(|e| e == extension)
    }

    /// Include list as shown in the run log: `All` when empty.
    pub fn include_display(&self) -> String {
        if self.include.is_empty() {
            "All".to_string()
        } else {
            self.include.join(", ")
        }
    }

    /// Exclude list as shown in the run log: `None` when empty.
    pub fn exclude_display(&self) -> String {
        if self.exclude.is_empty() {
            "None".to_string()
        } else {
            self.exclude.join(", ")
        }
    }
}

/// Splits a comma-separated list, trimming items and dropping empty ones.
pub fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_extension(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

fn normalize_all<T>(items: T) -> Vec<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if item.as_ref().trim().is_empty() {
            continue;
        }
        let ext = normalize_extension(item.as_ref());
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// Immutable settings for one sort run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSettings {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub backup: bool,
    pub filters: ExtensionFilter,
}

impl SortSettings {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        backup: bool,
        filters: ExtensionFilter,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            backup,
            filters,
        }
    }

    /// Path of the append-only audit log.
    pub fn log_file(&self) -> PathBuf {
        self.target_dir.join(LOG_FILE_NAME)
    }

    /// Path of the backup directory, used only when backup is enabled.
    pub fn backup_dir(&self) -> PathBuf {
        self.target_dir.join(BACKUP_DIR_NAME)
    }
}

/// Values collected from the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub backup: bool,
    pub include: Option<String>,
    pub exclude: Option<String>,
}

impl SettingsOverrides {
    /// Merges these overrides over a configuration file and validates the result.
    ///
    /// # Arguments
    ///
    /// * `file` - Settings loaded from the configuration file, possibly empty
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingDirectory` if neither source names a source or target.
    pub fn resolve(self, file: ConfigFile) -> Result<SortSettings, ConfigError> {
        let file = file.settings;

        let source_dir = self
            .source
            .or(file.source)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingDirectory("Source"))?;
        let target_dir = self
            .target
            .or(file.target)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingDirectory("Target"))?;

        let backup = self.backup || file.backup.unwrap_or(false);

        let include = match self.include {
            Some(list) => parse_list(&list),
            None => file.include.unwrap_or_default(),
        };
        let exclude = match self.exclude {
            Some(list) => parse_list(&list),
            None => file.exclude.unwrap_or_default(),
        };

        Ok(SortSettings::new(
            source_dir,
            target_dir,
            backup,
            ExtensionFilter::new(include, exclude),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        assert_eq!(parse_list(" .jpg, .png ,,"), vec![".jpg", ".png"]);
        assert!(parse_list("").is_empty());
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_extensions_are_normalized() {
        let filter = ExtensionFilter::from_lists("JPG, .Png, jpg", "");
        assert_eq!(filter.include(), &[".jpg".to_string(), ".png".to_string()]);
    }

    #[test]
    fn test_overlap_detects_conflict() {
        let filter = ExtensionFilter::from_lists(".txt, .jpg", "TXT");
        assert_eq!(filter.overlap(), vec![".txt".to_string()]);

        let clean = ExtensionFilter::from_lists(".jpg", ".txt");
        assert!(clean.overlap().is_empty());
    }

    #[test]
    fn test_empty_include_accepts_everything() {
        let filter = ExtensionFilter::default();
        assert!(!filter.include_rejects(".txt"));
        assert!(!filter.include_rejects(""));
        assert!(!filter.exclude_rejects(".txt"));
    }

    #[test]
    fn test_include_and_exclude_rules() {
        let filter = ExtensionFilter::from_lists(".jpg", ".tmp");
        assert!(!filter.include_rejects(".jpg"));
        assert!(filter.include_rejects(".tmp"));
        assert!(filter.include_rejects(""));
        assert!(filter.exclude_rejects(".tmp"));
        assert!(!filter.exclude_rejects(".jpg"));
    }

    #[test]
    fn test_display_forms() {
        let filter = ExtensionFilter::default();
        assert_eq!(filter.include_display(), "All");
        assert_eq!(filter.exclude_display(), "None");

        let filter = ExtensionFilter::from_lists(".jpg,.png", ".tmp");
        assert_eq!(filter.include_display(), ".jpg, .png");
        assert_eq!(filter.exclude_display(), ".tmp");
    }

    #[test]
    fn test_settings_paths() {
        let settings = SortSettings::new("/in", "/out", true, ExtensionFilter::default());
        assert_eq!(settings.log_file(), PathBuf::from("/out/log.txt"));
        assert_eq!(settings.backup_dir(), PathBuf::from("/out/_BACKUP_"));
    }

    #[test]
    fn test_config_file_parses() {
        let content = r#"
            [settings]
            source = "/in"
            target = "/out"
            backup = true
            include = [".jpg"]
        "#;
        let file: ConfigFile = toml::from_str(content).unwrap();
        let settings = SettingsOverrides::default().resolve(file).unwrap();

        assert_eq!(settings.source_dir, PathBuf::from("/in"));
        assert!(settings.backup);
        assert_eq!(settings.filters.include(), &[".jpg".to_string()]);
        assert!(settings.filters.exclude().is_empty());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = ConfigFile {
            settings: FileSettings {
                source: Some(PathBuf::from("/file/in")),
                target: Some(PathBuf::from("/file/out")),
                backup: Some(false),
                include: Some(vec![".png".to_string()]),
                exclude: None,
            },
        };
        let overrides = SettingsOverrides {
            source: Some(PathBuf::from("/cli/in")),
            backup: true,
            include: Some("".to_string()),
            exclude: Some(".tmp".to_string()),
            ..Default::default()
        };
        let settings = overrides.resolve(file).unwrap();

        assert_eq!(settings.source_dir, PathBuf::from("/cli/in"));
        assert_eq!(settings.target_dir, PathBuf::from("/file/out"));
        assert!(settings.backup);
        assert!(settings.filters.include().is_empty());
        assert_eq!(settings.filters.exclude(), &[".tmp".to_string()]);
    }

    #[test]
    fn test_missing_directories_are_rejected() {
        let result = SettingsOverrides::default().resolve(ConfigFile::default());
        assert!(matches!(result, Err(ConfigError::MissingDirectory("Source"))));

        let overrides = SettingsOverrides {
            source: Some(PathBuf::from("/in")),
            target: Some(PathBuf::new()),
            ..Default::default()
        };
        let result = overrides.resolve(ConfigFile::default());
        assert!(matches!(result, Err(ConfigError::MissingDirectory("Target"))));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[settings\nsource = ").unwrap();

        let result = ConfigFile::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_returns_error() {
        let result = ConfigFile::load(Some(Path::new("/non/existent/datesort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
