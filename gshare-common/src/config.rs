//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a small TOML file. Root folder
//! resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`GSHARE_ROOT_FOLDER`, then `GSHARE_ROOT`)
//! 3. TOML config file (`~/.config/gshare/<module>.toml`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup: a warning is
//! logged and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "GSHARE_ROOT_FOLDER";

/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "GSHARE_ROOT";

/// Capability identifiers granted by default in the bootstrap config
pub const DEFAULT_GRANTED_PERMISSIONS: [&str; 2] = [
    "android.permission.WRITE_EXTERNAL_STORAGE",
    "android.permission.READ_MEDIA_IMAGES",
];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TomlConfig {
    /// Root folder holding the media database and shared storage
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults applied to new share sessions
    #[serde(default)]
    pub session: SessionSettings,

    /// Simulated platform characteristics
    #[serde(default)]
    pub platform: PlatformSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Prefix prepended to the source file name to form the display name
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Skip transfers whose display name is already indexed
    #[serde(default)]
    pub suppress_duplicates: bool,

    /// Hold the host context for the whole application lifetime
    #[serde(default)]
    pub application_context: bool,

    /// Sniff the mime type instead of always recording image/jpeg
    #[serde(default)]
    pub infer_mime: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            suppress_duplicates: false,
            application_context: false,
            infer_mime: false,
        }
    }
}

/// Platform characteristics used by the CLI host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Platform API level driving permission and strategy selection
    #[serde(default = "default_api_level")]
    pub api_level: u32,

    /// Capability identifiers the permission subsystem grants
    #[serde(default = "default_granted_permissions")]
    pub granted_permissions: Vec<String>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
            granted_permissions: default_granted_permissions(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_name_prefix() -> String {
    "album_".to_string()
}

fn default_api_level() -> u32 {
    34
}

fn default_granted_permissions() -> Vec<String> {
    DEFAULT_GRANTED_PERMISSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was compiled for
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/gshare
            dirs::data_local_dir()
                .map(|d| d.join("gshare"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/gshare"))
        } else if cfg!(target_os = "macos") {
            // ~/Library/Application Support/gshare
            dirs::data_dir()
                .map(|d| d.join("gshare"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/gshare"))
        } else if cfg!(target_os = "windows") {
            // %LOCALAPPDATA%\gshare
            dirs::data_local_dir()
                .map(|d| d.join("gshare"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gshare"))
        } else {
            PathBuf::from("./gshare_data")
        };

        Self {
            root_folder,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_override: None,
            toml_root: None,
        }
    }

    /// Command-line value, takes priority over everything else
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    /// Root folder from an already loaded config, used instead of the
    /// module's TOML file at the same priority
    pub fn with_toml_root(mut self, path: Option<PathBuf>) -> Self {
        self.toml_root = path;
        self
    }

    /// Path of this module's TOML file, if a config directory exists
    pub fn config_file_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gshare").join(format!("{}.toml", self.module_name)))
    }

    /// Resolve the root folder; never fails
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_override {
            debug!(path = %path.display(), "Root folder from command line");
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    debug!(var, path = %path, "Root folder from environment");
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            debug!(path = %path.display(), "Root folder from loaded config");
            return path.clone();
        }
        if let Some(config_path) = self.config_file_path() {
            if config_path.exists() {
                match load_toml_config(&config_path) {
                    Ok(TomlConfig {
                        root_folder: Some(root),
                        ..
                    }) => return root,
                    Ok(_) => {}
                    Err(e) => warn!("Ignoring unreadable config {}: {}", config_path.display(), e),
                }
            }
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder).map_err(|e| {
                Error::Config(format!(
                    "Failed to create root folder {}: {}",
                    self.root_folder.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// SQLite media catalog location
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("gshare.db")
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Directory standing in for the platform's shared external storage
    pub fn shared_storage_path(&self) -> PathBuf {
        self.root_folder.join("shared")
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Load config for a module, falling back to defaults when missing
///
/// An explicit path that cannot be read is an error; the implicit
/// per-module file is optional.
pub fn load_module_config(module_name: &str, explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    let resolver = RootFolderResolver::new(module_name);
    match resolver.config_file_path() {
        Some(path) if path.exists() => match load_toml_config(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("{}; using defaults", e);
                Ok(TomlConfig::default())
            }
        },
        _ => {
            debug!(module = module_name, "No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write config atomically (temp file + rename), 0600 on Unix
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize TOML: {}", e)))?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp_name = target.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&temp_path, target)?;
    Ok(())
}
