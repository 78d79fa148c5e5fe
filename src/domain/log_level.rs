use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Severity carried inside a `LogEvent`.
///
/// The three built-in levels serialize as `INFO`, `WARNING` and `ERROR`. Any other string
/// (for example `DEBUG` or `AUDIT`) is kept verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Custom(String),
}

impl Level {
    pub fn as_str(&self) -> &str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Custom(level) => level.as_str(),
        }
    }

    /// Severity queue an event of this level is routed to.
    pub fn queue_kind(&self) -> QueueKind {
        match self {
            Level::Info => QueueKind::Info,
            Level::Warning => QueueKind::Warning,
            Level::Error => QueueKind::Error,
            Level::Custom(_) => QueueKind::Custom,
        }
    }
}

impl From<&str> for Level {
    fn from(level: &str) -> Self {
        match level {
            "INFO" => Level::Info,
            "WARNING" => Level::Warning,
            "ERROR" => Level::Error,
            other => Level::Custom(other.to_string()),
        }
    }
}

impl From<String> for Level {
    fn from(level: String) -> Self {
        match level.as_str() {
            "INFO" | "WARNING" | "ERROR" => Level::from(level.as_str()),
            _ => Level::Custom(level),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level = String::deserialize(deserializer)?;
        Ok(Level::from(level))
    }
}

/// One of the five bounded queues of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    /// Receives every event regardless of severity.
    All,
    Info,
    Warning,
    Error,
    /// Debug and ad-hoc levels submitted through `log_message`.
    Custom,
}

impl QueueKind {
    pub const ALL_KINDS: [QueueKind; 5] = [
        QueueKind::All,
        QueueKind::Info,
        QueueKind::Warning,
        QueueKind::Error,
        QueueKind::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::All => "all",
            QueueKind::Info => "info",
            QueueKind::Warning => "warning",
            QueueKind::Error => "error",
            QueueKind::Custom => "custom",
        }
    }

    pub fn default_topic(self) -> &'static str {
        match self {
            QueueKind::All => "logs",
            QueueKind::Info => "log-info",
            QueueKind::Warning => "log-warn",
            QueueKind::Error => "log-error",
            QueueKind::Custom => "log-custom",
        }
    }

    /// Default capacity, sized to the expected relative volume of each class.
    pub fn default_capacity(self) -> usize {
        match self {
            QueueKind::All => 10_000,
            QueueKind::Info => 8_000,
            QueueKind::Warning => 1_000,
            QueueKind::Error => 500,
            QueueKind::Custom => 500,
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
