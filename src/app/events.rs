//! Outbound application events.
//!
//! The [`LedService`](super::service::LedService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup replay finished.
    Started { groups: usize, replayed: usize, skipped: usize },

    /// A group's asserted state was committed through arbitration.
    GroupChanged { group: String, asserted: bool },

    /// Physical writes for a committed transition went through.
    LedsDriven { group: String, asserted: usize, deasserted: usize },

    /// Some physical writes for a committed transition failed.
    DriveFailed { group: String, failed: Vec<String> },

    /// An override handler took the transition instead of arbitration.
    Overridden { group: String, asserted: bool },

    /// A persisted group could not be replayed at startup.
    ReplaySkipped { group: String, reason: String },
}
