/// Config file loading and creation for the pairrank CLI.
///
/// Config lives at ~/.config/pairrank/config.toml.
/// All fields are optional. CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PairrankConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub concurrency: Option<usize>,
    pub top_k: Option<usize>,
    pub temperature: Option<f64>,
    pub retries: Option<usize>,
    pub timeout_secs: Option<u64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# pairrank configuration
# All values here can be overridden by CLI flags.

# OpenAI-compatible API endpoint
# endpoint = \"https://api.openai.com\"

# Model ID used as the relevance judge
# model = \"gpt-4o-mini\"

# API key: use OPENAI_API_KEY env var or --api-key flag (not stored in config)

# Max concurrent judge requests (required, here or via --concurrency)
# concurrency = 16

# How many top candidates to return
# top_k = 3

# Judge sampling temperature
# temperature = 0.3

# Retries per comparison on network errors, 429 and 5xx
# retries = 3

# Abort the whole ranking run after this many seconds
# timeout_secs = 300
";

/// Returns the default config path: ~/.config/pairrank/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("pairrank").join("config.toml")
}

/// Parse config file contents.
pub fn parse_config(content: &str) -> Result<PairrankConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> PairrankConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => PairrankConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Write the default config file to `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {}: {e}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| format!("Failed to write config to {}: {e}", path.display()))
}
