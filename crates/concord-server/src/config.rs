use serde::{Deserialize, Serialize};

/// Configuration of the storage adapter. The core never reads these; they
/// belong to whichever backend implements [`crate::storage::Storage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub connection_uri: String,
    pub database: String,
    pub connect_timeout_secs: u64,
    pub ping_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            connection_uri: "mongodb://localhost:27017".to_string(),
            database: "concord".to_string(),
            connect_timeout_secs: 5,
            ping_timeout_secs: 3,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    /// Take a snapshot once this many changes accumulated past the newest
    /// stored snapshot.
    pub snapshot_threshold: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::default(),
            snapshot_threshold: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serde() {
        let config = Config::default();
        let raw = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.snapshot_threshold, config.snapshot_threshold);
        assert_eq!(back.storage.database, config.storage.database);
    }

    #[test]
    fn partial_input_fails_loudly_rather_than_guessing() {
        assert!(serde_json::from_str::<Config>("{}").is_err());
    }
}
