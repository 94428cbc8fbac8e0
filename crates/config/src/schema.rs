use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub server: ServerConfig,
    pub tracker: TrackerConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Channel tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory of grouped channel documents.
    pub data_dir: std::path::PathBuf,
    /// Seconds before a live snapshot is considered stale.
    pub max_age_secs: u64,
    /// Base URL the resolver fetches channel pages from.
    pub base_url: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: "./streamers".into(),
            max_age_secs: 300,
            base_url: "https://www.youtube.com".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = BeaconConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tracker.max_age_secs, 300);
        assert_eq!(config.tracker.data_dir, std::path::PathBuf::from("./streamers"));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: BeaconConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.tracker.max_age_secs, 300);
    }
}
