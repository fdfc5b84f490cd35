//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LedService (domain)
//! ```
//!
//! Driven adapters (physical LEDs, durable storage, config files, event
//! sinks) implement these traits.  The [`LedService`](super::service::LedService)
//! consumes them via generics injected at call sites, so the arbitration
//! core never touches sysfs or the filesystem directly.
//!
//! ## Contract notes
//!
//! - **PhysicalLedPort** writes are synchronous; a failure must surface as
//!   an error, never as a silent no-op.
//! - **StoragePort** writes MUST be atomic: after a crash the old or the
//!   new value is visible, never a torn one.
//! - **ConfigPort** implementations MUST validate before persisting.

use serde::{Deserialize, Serialize};

use crate::config::ManagerConfig;
use crate::layout::LedState;

// ───────────────────────────────────────────────────────────────
// Physical LED port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Addressable property of a physical LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedProperty {
    State,
    /// Percentage of the blink period the LED is lit (0–100).
    DutyOn,
    /// Blink period in milliseconds.
    Period,
}

/// A property together with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue {
    State(LedState),
    DutyOn(u8),
    Period(u16),
}

/// Per-LED property store with no policy of its own.
pub trait PhysicalLedPort {
    /// Read one property of `led`.
    fn get(&self, led: &str, property: LedProperty) -> Result<PropertyValue, LedError>;

    /// Write one property of `led`.  The property is implied by the value.
    fn set(&mut self, led: &str, value: PropertyValue) -> Result<(), LedError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ disk)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage, namespaced by subsystem.
pub trait StoragePort {
    /// Read a value.  Missing keys are [`StorageError::NotFound`].
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically and durably.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

/// Persisted group intent, ordered by last change.
///
/// Recording a group moves it to the end, so the asserted entries read
/// front to back are in assertion order.  Replay relies on this to
/// rebuild the same last-asserted tie-breaks the live session had.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupIntent {
    entries: Vec<(String, bool)>,
}

impl GroupIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `asserted` for `name` as the most recent change.
    pub fn record(&mut self, name: &str, asserted: bool) {
        self.entries.retain(|(n, _)| n != name);
        self.entries.push((name.to_owned(), asserted));
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| *a)
    }

    /// Every entry, oldest change first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    /// Asserted groups in the order they were asserted.
    pub fn asserted(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, a)| *a).map(|(n, _)| n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, bool)> for GroupIntent {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut intent = Self::new();
        for (name, asserted) in iter {
            intent.record(name.as_ref(), asserted);
        }
        intent
    }
}

/// Durable group intent store.
pub trait GroupStorePort {
    /// Record `asserted` for `name`.  Durable before returning.
    fn store_group(&mut self, name: &str, asserted: bool) -> Result<(), StorageError>;

    /// Every recorded group, oldest change first.  An absent record is
    /// empty.
    fn load_all(&self) -> Result<GroupIntent, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists daemon configuration.
pub trait ConfigPort {
    /// Load configuration.  Returns [`ManagerConfig::default()`] if none
    /// is stored.
    fn load(&self) -> Result<ManagerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ManagerConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`PhysicalLedPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedError {
    /// No such LED on this controller.
    NotFound,
    /// The property value is outside what the LED accepts.
    InvalidValue,
    /// The backend cannot represent this property.
    Unsupported,
    /// Underlying read/write failed.
    Io(String),
}

/// Errors from [`StoragePort`] / [`GroupStorePort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Stored bytes failed to decode.
    Corrupted,
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError(String),
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted(String),
    /// A config field failed validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing file.
    IoError(String),
}

impl core::fmt::Display for LedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no such LED"),
            Self::InvalidValue => write!(f, "invalid property value"),
            Self::Unsupported => write!(f, "property not supported"),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Corrupted => write!(f, "stored record corrupted"),
            Self::Full => write!(f, "storage full"),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for LedError {}
impl std::error::Error for StorageError {}
impl std::error::Error for ConfigError {}
