use crate::domain::QueueKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BufferError {
    #[error("Invalid capacity {capacity} for queue '{kind}'")]
    InvalidCapacity { kind: QueueKind, capacity: usize },

    #[error("Queue '{kind}' is full (capacity {capacity})")]
    Full { kind: QueueKind, capacity: usize },

    #[error("Queue '{kind}' is closed")]
    Closed { kind: QueueKind },
}

impl BufferError {
    pub fn kind(&self) -> QueueKind {
        match self {
            BufferError::InvalidCapacity { kind, .. }
            | BufferError::Full { kind, .. }
            | BufferError::Closed { kind } => *kind,
        }
    }

    /// A full queue may accept the next payload once its worker catches up; the other
    /// errors are permanent for the lifetime of the queue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BufferError::Full { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_full_is_recoverable() {
        assert!(
            BufferError::Full {
                kind: QueueKind::Info,
                capacity: 1
            }
            .is_recoverable()
        );
        assert!(!BufferError::Closed { kind: QueueKind::All }.is_recoverable());
        assert!(
            !BufferError::InvalidCapacity {
                kind: QueueKind::Error,
                capacity: 0
            }
            .is_recoverable()
        );
    }

    #[test]
    fn messages_name_the_queue() {
        let err = BufferError::Full {
            kind: QueueKind::Error,
            capacity: 500,
        };
        assert_eq!(err.to_string(), "Queue 'error' is full (capacity 500)");
        assert_eq!(err.kind(), QueueKind::Error);
    }
}
