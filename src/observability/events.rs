//! Observable events for rosterdb
//!
//! Every log line carries one of these as its `event` field, so log
//! consumers can match on stable names instead of message text.

use std::fmt;

/// Observable events in rosterdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Shutdown complete
    ShutdownComplete,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Store lifecycle
    /// Storage replay begins
    ReplayBegin,
    /// Storage replay complete, index rebuilt
    ReplayComplete,
    /// Storage replay hit a corrupt record (FATAL)
    ReplayFailed,
    /// Store handle opened
    StoreOpened,
    /// Store handle released
    StoreClosed,

    // Record operations
    /// Student inserted
    StudentInserted,
    /// Insert collided with an existing key
    DuplicateRejected,
    /// Caller input failed validation
    ValidationRejected,
    /// Student updated
    StudentUpdated,
    /// Student deleted
    StudentDeleted,
    /// A storage write failed
    WriteFailed,

    // Seeding
    /// Sample data seeded
    SeedComplete,

    // Server
    /// HTTP server listening
    Serving,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ROSTERDB_STARTUP_BEGIN",
            Event::BootComplete => "ROSTERDB_STARTUP_COMPLETE",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ReplayBegin => "STORAGE_REPLAY_BEGIN",
            Event::ReplayComplete => "STORAGE_REPLAY_COMPLETE",
            Event::ReplayFailed => "STORAGE_REPLAY_FAILED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreClosed => "STORE_CLOSED",

            Event::StudentInserted => "STUDENT_INSERTED",
            Event::DuplicateRejected => "DUPLICATE_KEY_REJECTED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::StudentUpdated => "STUDENT_UPDATED",
            Event::StudentDeleted => "STUDENT_DELETED",
            Event::WriteFailed => "STORAGE_WRITE_FAILED",

            Event::SeedComplete => "SEED_COMPLETE",

            Event::Serving => "ROSTERDB_SERVING",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ReplayFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::BootStart,
            Event::BootComplete,
            Event::ShutdownComplete,
            Event::ConfigLoaded,
            Event::ReplayBegin,
            Event::ReplayComplete,
            Event::ReplayFailed,
            Event::StoreOpened,
            Event::StoreClosed,
            Event::StudentInserted,
            Event::DuplicateRejected,
            Event::ValidationRejected,
            Event::StudentUpdated,
            Event::StudentDeleted,
            Event::WriteFailed,
            Event::SeedComplete,
            Event::Serving,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::ReplayFailed.is_fatal());
        assert!(!Event::StudentInserted.is_fatal());
    }
}
