//! Unified error types for the LED manager.
//!
//! A single `Error` enum for every group request, so the dispatch loop
//! can report any failure as a failed property-set on the group surface.
//! Port-level errors (`LedError`, `StorageError`, `ConfigError`) live
//! next to their traits in [`crate::app::ports`].  Startup failures
//! (layout, config) stay in their own types and reach `main` through
//! `anyhow`.

use core::fmt;

use crate::app::ports::{LedError, StorageError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible group operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request named a group absent from the static layout.
    /// Rejected before any state mutation.
    InvalidGroup(String),
    /// One or more physical LED writes in a batch failed.  The group's
    /// logical state and persisted record were already committed.
    HardwareWrite(HardwareWriteFailure),
    /// A physical LED could not be read (startup readback).
    Led { led: String, source: LedError },
    /// The durable group record could not be written.  Nothing else
    /// was changed.
    Persistence(StorageError),
    /// A group's override handler refused or failed the transition.
    Override { group: String, reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGroup(name) => write!(f, "unknown LED group '{name}'"),
            Self::HardwareWrite(e) => write!(f, "hardware: {e}"),
            Self::Led { led, source } => write!(f, "LED '{led}': {source}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Override { group, reason } => write!(f, "override for '{group}': {reason}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<HardwareWriteFailure> for Error {
    fn from(e: HardwareWriteFailure) -> Self {
        Self::HardwareWrite(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Aggregated hardware failure
// ---------------------------------------------------------------------------

/// Per-LED failures collected over one drive batch.
///
/// The batch is always attempted in full; this carries every LED that
/// did not take its write, in the order the writes were issued.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HardwareWriteFailure {
    pub failures: Vec<(String, LedError)>,
}

impl HardwareWriteFailure {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Names of the LEDs that failed.
    pub fn leds(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(led, _)| led.as_str())
    }
}

impl fmt::Display for HardwareWriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} LED write(s) failed", self.failures.len())?;
        for (i, (led, e)) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{led} ({e})")?;
        }
        Ok(())
    }
}

impl std::error::Error for HardwareWriteFailure {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
