// Configuration management for the visor CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/visor/config.json
// - Linux: ~/.config/visor/config.json
// - Windows: %APPDATA%\visor\config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use visor_core::rpc::httputil::split_rpc_addr;
use visor_core::rpc::DEFAULT_RPC_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address of the visor RPC endpoint (host:port)
    pub rpc_addr: String,

    /// Prefix qualifying every RPC method name
    pub rpc_prefix: String,

    /// Per-call timeout in seconds
    pub request_timeout: u64,

    /// Settings of the simulated visor started by `serve`
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Upper bound on generated transports
    pub transports: usize,

    /// Upper bound on generated route groups
    pub rules: usize,

    /// RNG seed, random when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_addr: "localhost:3435".to_string(),
            rpc_prefix: DEFAULT_RPC_PREFIX.to_string(),
            request_timeout: 10,
            mock: MockConfig::default(),
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            transports: 6,
            rules: 4,
            seed: None,
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("visor");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default file, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Set a config value. Call `save` to persist it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "rpc_addr" => {
                split_rpc_addr(value).context("Invalid RPC address")?;
                self.rpc_addr = value.to_string();
            }
            "rpc_prefix" => {
                self.rpc_prefix = value.to_string();
            }
            "request_timeout" => {
                self.request_timeout = value.parse().context("Invalid number")?;
            }
            "mock_transports" => {
                self.mock.transports = value.parse().context("Invalid number")?;
            }
            "mock_rules" => {
                self.mock.rules = value.parse().context("Invalid number")?;
            }
            "mock_seed" => {
                self.mock.seed = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().context("Invalid seed")?)
                };
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "rpc_addr" => Some(self.rpc_addr.clone()),
            "rpc_prefix" => Some(self.rpc_prefix.clone()),
            "request_timeout" => Some(self.request_timeout.to_string()),
            "mock_transports" => Some(self.mock.transports.to_string()),
            "mock_rules" => Some(self.mock.rules.to_string()),
            "mock_seed" => self.mock.seed.map(|s| s.to_string()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("rpc_addr".to_string(), self.rpc_addr.clone()),
            ("rpc_prefix".to_string(), self.rpc_prefix.clone()),
            ("request_timeout".to_string(), format!("{}s", self.request_timeout)),
            ("mock_transports".to_string(), self.mock.transports.to_string()),
            ("mock_rules".to_string(), self.mock.rules.to_string()),
            (
                "mock_seed".to_string(),
                self.mock
                    .seed
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "(random)".to_string()),
            ),
        ]
    }
}
