use crate::domain::QueueKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub db: u32,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

/// Broker topic per severity queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNames {
    pub all: String,
    pub info: String,
    pub warning: String,
    pub error: String,
    pub custom: String,
}

impl TopicNames {
    pub fn for_kind(&self, kind: QueueKind) -> &str {
        match kind {
            QueueKind::All => &self.all,
            QueueKind::Info => &self.info,
            QueueKind::Warning => &self.warning,
            QueueKind::Error => &self.error,
            QueueKind::Custom => &self.custom,
        }
    }
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            all: QueueKind::All.default_topic().to_string(),
            info: QueueKind::Info.default_topic().to_string(),
            warning: QueueKind::Warning.default_topic().to_string(),
            error: QueueKind::Error.default_topic().to_string(),
            custom: QueueKind::Custom.default_topic().to_string(),
        }
    }
}

/// Bounded capacity per severity queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueCapacities {
    pub all: usize,
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub custom: usize,
}

impl QueueCapacities {
    pub fn for_kind(&self, kind: QueueKind) -> usize {
        match kind {
            QueueKind::All => self.all,
            QueueKind::Info => self.info,
            QueueKind::Warning => self.warning,
            QueueKind::Error => self.error,
            QueueKind::Custom => self.custom,
        }
    }
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            all: QueueKind::All.default_capacity(),
            info: QueueKind::Info.default_capacity(),
            warning: QueueKind::Warning.default_capacity(),
            error: QueueKind::Error.default_capacity(),
            custom: QueueKind::Custom.default_capacity(),
        }
    }
}
