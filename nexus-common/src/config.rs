//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents (`~/.config/nexus/<module>.toml`)
///
/// All fields are optional; services fall back to environment variables
/// and compiled defaults for anything not present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root data folder override
    pub root_folder: Option<String>,
    /// Port the service listens on
    pub port: Option<u16>,
    /// API key for the external scoring service
    pub gemini_api_key: Option<String>,
    /// Model name for the external scoring service
    pub gemini_model: Option<String>,
    /// Base URL of the graph engine service
    pub graph_base_url: Option<String>,
    /// Base URL of the connection-import service
    pub import_base_url: Option<String>,
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_config: Option<&TomlConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = toml_config.and_then(|c| c.root_folder.as_deref()) {
        return PathBuf::from(root_folder);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Load the TOML configuration file for a module, if one exists
///
/// Looks for `<config_dir>/nexus/<module_name>.toml` (e.g.
/// `~/.config/nexus/nexus-er.toml` on Linux). A missing file is not an
/// error; a file that fails to parse is.
pub fn load_toml_config(module_name: &str) -> Result<Option<TomlConfig>> {
    let Some(path) = config_file_path(module_name) else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    Ok(Some(config))
}

/// Parse a TOML configuration from a string (used by tests and tooling)
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
}

/// Default configuration file path for the platform
fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nexus").join(format!("{}.toml", module_name)))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/nexus (or /var/lib/nexus for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("nexus"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/nexus"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/nexus
        dirs::data_dir()
            .map(|d| d.join("nexus"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/nexus"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\nexus
        dirs::data_local_dir()
            .map(|d| d.join("nexus"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\nexus"))
    } else {
        PathBuf::from("./nexus_data")
    }
}

/// Ensure the root folder exists, creating it if necessary
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder).map_err(|e| {
            Error::Config(format!(
                "Failed to create root folder {}: {}",
                root_folder.display(),
                e
            ))
        })?;
        tracing::info!("Created root folder: {}", root_folder.display());
    }
    Ok(())
}

/// Database file path inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("nexus.db")
}
