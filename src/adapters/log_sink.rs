//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the daemon).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { groups, replayed, skipped } => {
                info!("START | groups={} replayed={} skipped={}", groups, replayed, skipped);
            }
            AppEvent::GroupChanged { group, asserted } => {
                info!("GROUP | {} asserted={}", group, asserted);
            }
            AppEvent::LedsDriven { group, asserted, deasserted } => {
                info!("DRIVE | {} assert={} deassert={}", group, asserted, deasserted);
            }
            AppEvent::DriveFailed { group, failed } => {
                warn!("DRIVE | {} failed LEDs: {}", group, failed.join(","));
            }
            AppEvent::Overridden { group, asserted } => {
                info!("OVERRIDE | {} asserted={}", group, asserted);
            }
            AppEvent::ReplaySkipped { group, reason } => {
                warn!("REPLAY | {} skipped: {}", group, reason);
            }
        }
    }
}
