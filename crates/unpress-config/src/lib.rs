//! Configuration management for unpress.
//!
//! Parses `unpress.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the directory scanned for export files.
    pub export_dir: Option<PathBuf>,
    /// Override the output tree root.
    pub build_dir: Option<PathBuf>,
    /// Override the target markup format.
    pub target_format: Option<String>,
    /// Override the image download flag.
    pub download_images: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "unpress.toml";

/// Target markup formats accepted in `output.target_format`.
///
/// Must stay in sync with `MarkupFormat` in the markdown crate.
const KNOWN_FORMATS: &[&str] = &["markdown", "html"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input configuration (paths are relative strings from TOML).
    input: InputConfigRaw,
    /// Output configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Taxonomy filtering and renaming.
    pub taxonomies: TaxonomiesConfig,
    /// Item type and field filtering.
    pub items: ItemsConfig,
    /// Body text substitutions.
    pub body: BodyConfig,

    /// Resolved input configuration (set after loading).
    #[serde(skip)]
    pub input_resolved: InputConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw input configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InputConfigRaw {
    export_dir: Option<String>,
}

/// Resolved input configuration with absolute paths.
#[derive(Debug, Default)]
pub struct InputConfig {
    /// Directory scanned for `*.xml` export files.
    pub export_dir: PathBuf,
}

/// Raw output configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    build_dir: Option<String>,
    target_format: Option<String>,
    download_images: Option<bool>,
    date_format: Option<String>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug)]
pub struct OutputConfig {
    /// Output tree root.
    pub build_dir: PathBuf,
    /// Target markup format identifier ("markdown" or "html").
    pub target_format: String,
    /// Whether referenced images are downloaded next to the output.
    pub download_images: bool,
    /// strftime format used to parse item dates for uid prefixes.
    pub date_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            target_format: "markdown".to_owned(),
            download_images: false,
            date_format: "%Y-%m-%d %H:%M:%S".to_owned(),
        }
    }
}

/// Taxonomy filtering and renaming configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TaxonomiesConfig {
    /// Taxonomy domains dropped entirely.
    pub filter: Vec<String>,
    /// Exact (domain, value) pairs dropped.
    pub entry_filter: HashMap<String, String>,
    /// Domain to front-matter display name mapping.
    pub name_mapping: HashMap<String, String>,
}

/// Item type and field filtering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ItemsConfig {
    /// Item types recognized but never written.
    pub type_filter: Vec<String>,
    /// Field name to exact value; a match skips the item entirely.
    pub field_filter: HashMap<String, String>,
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            type_filter: vec!["attachment".to_owned(), "nav_menu_item".to_owned()],
            field_filter: HashMap::new(),
        }
    }
}

/// Body text substitution configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BodyConfig {
    /// Ordered regex substitutions applied to every item body.
    pub replace: Vec<BodyReplace>,
}

/// One body substitution rule.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyReplace {
    /// Regular expression matched against the body.
    pub pattern: String,
    /// Replacement text.
    pub replacement: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `unpress.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(export_dir) = &settings.export_dir {
            self.input_resolved.export_dir.clone_from(export_dir);
        }
        if let Some(build_dir) = &settings.build_dir {
            self.output_resolved.build_dir.clone_from(build_dir);
        }
        if let Some(target_format) = &settings.target_format {
            self.output_resolved.target_format.clone_from(target_format);
        }
        if let Some(download_images) = settings.download_images {
            self.output_resolved.download_images = download_images;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            input: InputConfigRaw::default(),
            output: OutputConfigRaw::default(),
            taxonomies: TaxonomiesConfig::default(),
            items: ItemsConfig::default(),
            body: BodyConfig::default(),
            input_resolved: InputConfig {
                export_dir: base.join("wordpress-xml"),
            },
            output_resolved: OutputConfig {
                build_dir: base.join("build"),
                ..OutputConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that the target format is known, the date format is usable, and
    /// every body substitution pattern compiles.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let format = &self.output_resolved.target_format;
        if !KNOWN_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output.target_format must be one of {KNOWN_FORMATS:?}, got \"{format}\""
            )));
        }

        require_non_empty(&self.output_resolved.date_format, "output.date_format")?;

        for rule in &self.body.replace {
            regex::Regex::new(&rule.pattern).map_err(|e| {
                ConfigError::Validation(format!(
                    "body.replace pattern \"{}\" is not a valid regex: {e}",
                    rule.pattern
                ))
            })?;
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.input_resolved = InputConfig {
            export_dir: resolve(self.input.export_dir.as_deref(), "wordpress-xml"),
        };

        let defaults = OutputConfig::default();
        self.output_resolved = OutputConfig {
            build_dir: resolve(self.output.build_dir.as_deref(), "build"),
            target_format: self
                .output
                .target_format
                .clone()
                .unwrap_or(defaults.target_format),
            download_images: self
                .output
                .download_images
                .unwrap_or(defaults.download_images),
            date_format: self
                .output
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        };
    }
}
