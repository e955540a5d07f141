// Thu Aug 27 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CAPACITY: usize = 128 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings for both endpoints. The request channel carries
/// client-to-service commands, the reply channel carries responses back;
/// both sides must agree on names and the creator fixes the capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub request_channel: String,
    pub reply_channel: String,
    pub channel_capacity: usize,
    pub max_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_channel: "/memprobe-tx".to_string(),
            reply_channel: "/memprobe-rx".to_string(),
            channel_capacity: DEFAULT_CAPACITY,
            max_threads: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.request_channel, "/memprobe-tx");
        assert_eq!(config.reply_channel, "/memprobe-rx");
        assert_eq!(config.channel_capacity, 128 * 1024 * 1024);
        assert!(config.max_threads >= 1);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("memprobe-config-{}.json", std::process::id()));
        let mut config = Config::default();
        config.channel_capacity = 4096;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.channel_capacity, 4096);
        assert_eq!(loaded.request_channel, config.request_channel);
        let _ = std::fs::remove_file(path);
    }
}
