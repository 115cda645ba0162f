//! Configuration resolution for nexus-er
//!
//! Multi-tier resolution with ENV -> TOML -> default priority. The
//! scoring API key is resolved once here and injected into the scorer at
//! construction; nothing reads the environment inside the scoring call
//! path.

use crate::services::scorer::ScorerConfig;
use nexus_common::config::{load_toml_config, resolve_root_folder, TomlConfig};
use nexus_common::Result;
use std::path::PathBuf;
use tracing::{info, warn};

const MODULE_NAME: &str = "nexus-er";
const DEFAULT_PORT: u16 = 5731;
const DEFAULT_GRAPH_BASE_URL: &str = "http://127.0.0.1:5732";
const DEFAULT_IMPORT_BASE_URL: &str = "http://127.0.0.1:5733";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root data folder (holds nexus.db)
    pub root_folder: PathBuf,
    /// Port the service listens on
    pub port: u16,
    /// Scorer configuration (API key, base URL, model)
    pub scorer: ScorerConfig,
    /// Base URL of the graph engine service
    pub graph_base_url: String,
    /// Base URL of the connection-import service
    pub import_base_url: String,
}

/// Resolve the full service configuration
///
/// A missing scoring API key is not fatal: the service still starts and
/// every analysis fails with a credentials error until one is configured.
pub fn resolve(cli_root_folder: Option<&str>) -> Result<ServiceConfig> {
    let toml_config = load_toml_config(MODULE_NAME)?;

    let root_folder =
        resolve_root_folder(cli_root_folder, "NEXUS_ROOT_FOLDER", toml_config.as_ref());

    let port = std::env::var("NEXUS_ER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .or_else(|| toml_config.as_ref().and_then(|c| c.port))
        .unwrap_or(DEFAULT_PORT);

    let mut scorer = ScorerConfig::new(resolve_gemini_api_key(toml_config.as_ref()));
    if let Some(model) = resolve_string("NEXUS_GEMINI_MODEL", toml_config.as_ref(), |c| {
        c.gemini_model.clone()
    }) {
        scorer = scorer.with_model(model);
    }

    let graph_base_url = resolve_string("NEXUS_GRAPH_URL", toml_config.as_ref(), |c| {
        c.graph_base_url.clone()
    })
    .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string());

    let import_base_url = resolve_string("NEXUS_IMPORT_URL", toml_config.as_ref(), |c| {
        c.import_base_url.clone()
    })
    .unwrap_or_else(|| DEFAULT_IMPORT_BASE_URL.to_string());

    Ok(ServiceConfig {
        root_folder,
        port,
        scorer,
        graph_base_url,
        import_base_url,
    })
}

/// Resolve the Gemini API key from ENV -> TOML
///
/// Warns on multiple sources (potential misconfiguration) and on none
/// (analysis will fail until configured). Returns an empty string when
/// unset.
fn resolve_gemini_api_key(toml_config: Option<&TomlConfig>) -> String {
    let env_key = std::env::var("NEXUS_GEMINI_API_KEY")
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .and_then(|c| c.gemini_api_key.clone())
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Gemini API key found in both environment and TOML config. Using environment (highest priority).");
    }

    if let Some(key) = env_key {
        info!("Gemini API key loaded from environment variable");
        return key;
    }
    if let Some(key) = toml_key {
        info!("Gemini API key loaded from TOML config");
        return key;
    }

    warn!(
        "Gemini API key not configured. Comparison analysis will fail until one is set via:\n\
         1. Environment: NEXUS_GEMINI_API_KEY=your-key-here\n\
         2. TOML config: ~/.config/nexus/nexus-er.toml (gemini_api_key = \"your-key\")"
    );
    String::new()
}

fn resolve_string(
    env_var: &str,
    toml_config: Option<&TomlConfig>,
    from_toml: impl Fn(&TomlConfig) -> Option<String>,
) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| toml_config.and_then(from_toml))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
