use super::log_level::Level;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single application log event.
///
/// Built once by the ingestion API and never mutated afterwards. Downstream of
/// serialization the pipeline only sees the opaque JSON payload returned by
/// [`LogEvent::to_payload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    timestamp: DateTime<Utc>,
    level: Level,
    service: String,
    message: String,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(Utc::now(), level, service, message)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        level: Level,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serialize to the wire form shared by broker messages and fallback lines.
    pub fn to_payload(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payload_uses_documented_field_names() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let event = LogEvent::at(timestamp, Level::Info, "Main", "INFO 0");

        let payload = event.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["timestamp"], "2024-05-01T12:30:00Z");
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["service"], "Main");
        assert_eq!(value["message"], "INFO 0");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn payload_is_a_single_line() {
        let event = LogEvent::new(Level::Error, "svc", "first line\nsecond line");
        let payload = event.to_payload().unwrap();
        assert!(!payload.contains(&b'\n'));

        let decoded = LogEvent::from_payload(&payload).unwrap();
        assert_eq!(decoded.message(), "first line\nsecond line");
    }

    #[test]
    fn custom_level_survives_serialization() {
        let event = LogEvent::new(Level::from("DEBUG"), "worker", "tick");
        let decoded = LogEvent::from_payload(&event.to_payload().unwrap()).unwrap();
        assert_eq!(decoded.level(), &Level::Custom("DEBUG".to_string()));
        assert_eq!(decoded, event);
    }
}
