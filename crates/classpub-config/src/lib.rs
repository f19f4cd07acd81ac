//! Configuration management for classpub.
//!
//! Parses `classpub.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! The `[explorer]` section carries the navigation pipeline configuration
//! as plain strings; the CLI resolves them into typed strategies, ignoring
//! unknown step names as forward-compatible no-ops.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override course code.
    pub course_code: Option<String>,
    /// Override content source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override social preview generation.
    pub social_previews: Option<bool>,
    /// Override forced dependency reinstall.
    pub reinstall: Option<bool>,
    /// Override use of saved explorer state.
    pub use_saved_state: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "classpub.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Course identity.
    pub course: CourseConfig,
    /// Content layout (paths are relative strings from TOML).
    content: ContentConfigRaw,
    /// Navigation explorer configuration.
    pub explorer: ExplorerConfig,
    /// Build switches recorded for the downstream renderer.
    pub build: BuildConfig,

    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Course identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    /// Course code (e.g., "ICS3U").
    pub code: String,
    /// Formal course name.
    pub name: String,
    /// Number of sections taught.
    pub sections: u32,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            sections: 1,
        }
    }
}

/// Raw content configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    shared_dirs: Option<Vec<String>>,
    shared_files: Option<Vec<String>>,
    section_dirs: Option<Vec<String>>,
    section_files: Option<Vec<String>>,
}

/// Resolved content configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ContentConfig {
    /// Directory containing shared and per-section content folders.
    pub source_dir: PathBuf,
    /// Project directory for classpub data (.classpub/).
    pub project_dir: PathBuf,
    /// Output directory for composed section sites.
    pub output_dir: PathBuf,
    /// Folder names shared across all sections.
    pub shared_dirs: Vec<String>,
    /// Individual files shared across all sections.
    pub shared_files: Vec<String>,
    /// Folder names taken from each section's own directory.
    pub section_dirs: Vec<String>,
    /// Individual files taken from each section's own directory.
    pub section_files: Vec<String>,
}

impl ContentConfig {
    /// Explorer state file path (.classpub/explorer-state.json).
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.project_dir.join("explorer-state.json")
    }
}

/// Navigation explorer configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Entry names omitted from navigation (files by title, folders by
    /// name).
    pub hidden: Vec<String>,
    /// Allow-list of expandable folder names (case-insensitive).
    pub expandable: Vec<String>,
    /// Collapse state for folders without saved state
    /// ("collapsed" or "expanded").
    pub folder_default_state: String,
    /// Folder label click behavior ("link" or "collapse").
    pub folder_click_behavior: String,
    /// Whether saved collapse state is honored.
    pub use_saved_state: bool,
    /// Pipeline step order; unknown names are ignored.
    pub pipeline_order: Vec<String>,
    /// Sort strategy name ("alphabetical" or "newest-first").
    pub sort: String,
    /// Title-case synthesized folder titles.
    pub titleize_folders: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            hidden: Vec::new(),
            expandable: Vec::new(),
            folder_default_state: "collapsed".to_owned(),
            folder_click_behavior: "link".to_owned(),
            use_saved_state: true,
            pipeline_order: vec!["filter".to_owned(), "map".to_owned(), "sort".to_owned()],
            sort: "alphabetical".to_owned(),
            titleize_folders: false,
        }
    }
}

/// Build switches recorded for the downstream renderer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Generate social media preview images.
    pub social_previews: bool,
    /// Force dependency reinstall in the render step.
    pub reinstall: bool,
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

/// Require a string field to be one of a fixed set of values.
fn require_one_of(value: &str, allowed: &[&str], field: &str) -> Result<(), ConfigError> {
    if !allowed.contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `classpub.toml` in current directory and
    /// parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing
    /// CLI arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing
    /// fails.
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

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(course_code) = &settings.course_code {
            self.course.code.clone_from(course_code);
        }
        if let Some(source_dir) = &settings.source_dir {
            self.content_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.content_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(social_previews) = settings.social_previews {
            self.build.social_previews = social_previews;
        }
        if let Some(reinstall) = settings.reinstall {
            self.build.reinstall = reinstall;
        }
        if let Some(use_saved_state) = settings.use_saved_state {
            self.explorer.use_saved_state = use_saved_state;
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

    /// Create default config with paths relative to current working
    /// directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            course: CourseConfig::default(),
            content: ContentConfigRaw::default(),
            explorer: ExplorerConfig::default(),
            build: BuildConfig::default(),
            content_resolved: ContentConfig {
                source_dir: base.join("content"),
                project_dir: base.join(".classpub"),
                output_dir: base.join(".classpub").join("output"),
                shared_dirs: Vec::new(),
                shared_files: Vec::new(),
                section_dirs: Vec::new(),
                section_files: Vec::new(),
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

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid
    /// values. Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.course.code, "course.code")?;

        if self.course.sections == 0 {
            return Err(ConfigError::Validation(
                "course.sections must be at least 1".to_owned(),
            ));
        }

        require_one_of(
            &self.explorer.folder_default_state,
            &["collapsed", "expanded"],
            "explorer.folder_default_state",
        )?;
        require_one_of(
            &self.explorer.folder_click_behavior,
            &["link", "collapse"],
            "explorer.folder_click_behavior",
        )?;
        require_one_of(
            &self.explorer.sort,
            &["alphabetical", "newest-first"],
            "explorer.sort",
        )?;

        // pipeline_order entries are deliberately not validated: unknown
        // step names are forward-compatible no-ops

        Ok(())
    }

    /// Validate that a section number targets an existing section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the number is 0 or exceeds the
    /// configured section count.
    pub fn require_section(&self, section: u32) -> Result<(), ConfigError> {
        if section == 0 || section > self.course.sections {
            return Err(ConfigError::Validation(format!(
                "section {section} is out of range (course has {} section(s))",
                self.course.sections
            )));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let project_dir = config_dir.join(".classpub");
        let default_output = project_dir.join("output");

        self.content_resolved = ContentConfig {
            source_dir: resolve(self.content.source_dir.as_deref(), "content"),
            output_dir: self
                .content
                .output_dir
                .as_deref()
                .map_or(default_output, |dir| config_dir.join(dir)),
            project_dir,
            shared_dirs: self.content.shared_dirs.clone().unwrap_or_default(),
            shared_files: self.content.shared_files.clone().unwrap_or_default(),
            section_dirs: self.content.section_dirs.clone().unwrap_or_default(),
            section_files: self.content.section_files.clone().unwrap_or_default(),
        };
    }
}
