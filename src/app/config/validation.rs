use super::{Config, ConfigError};
use crate::domain::QueueKind;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate queue capacities
        for kind in QueueKind::ALL_KINDS {
            if self.capacities.for_kind(kind) == 0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "Capacity of the {kind} queue must be greater than 0"
                )));
            }
        }

        // Validate topic names
        for kind in QueueKind::ALL_KINDS {
            if self.topics.for_kind(kind).trim().is_empty() {
                return Err(ConfigError::InvalidConfig(format!(
                    "Topic of the {kind} queue must not be empty"
                )));
            }
        }

        // Validate broker address if pub/sub is enabled
        if self.pubsub_enabled {
            if !cfg!(feature = "redis") {
                return Err(ConfigError::InvalidConfig(
                    "Pub/sub is enabled but this build has no broker backend (enable the `redis` feature)"
                        .to_string(),
                ));
            }
            if self.broker.host.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "Broker host must not be empty".to_string(),
                ));
            }
            if self.broker.port == 0 {
                return Err(ConfigError::InvalidConfig(
                    "Broker port must be greater than 0".to_string(),
                ));
            }
        }

        // Validate fallback path
        if self.fallback_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Fallback path must not be empty".to_string(),
            ));
        }
        if self.fallback_path.is_dir() {
            return Err(ConfigError::InvalidConfig(format!(
                "Fallback path is a directory: {}",
                self.fallback_path.display()
            )));
        }

        if self.service_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Service name must not be empty".to_string(),
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Shutdown timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
