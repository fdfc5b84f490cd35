//! Per-group override handlers.
//!
//! Some groups are not a static LED list: chassis identify, for
//! example, fans out across every slot's LEDs.  Such a group is tagged
//! [`GroupHandler::Custom`] at construction and its transitions go to the
//! service's [`OverrideHandler`] instead of arbitration.  The handler owns
//! every hardware effect and its return value becomes the group's state;
//! nothing is persisted for it.

use log::info;

use crate::app::ports::PhysicalLedPort;
use crate::drivers::led_driver::drive_batch;
use crate::error::{Error, Result};
use crate::layout::LedAction;

/// Handle passed back to the override handler to pick its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u16);

/// How a group's transitions are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupHandler {
    /// Reference-counted arbitration, persistence, then drive.
    #[default]
    Standard,
    /// Delegate to the service's override handler.
    Custom(HandlerId),
}

/// Takes over transitions for groups tagged [`GroupHandler::Custom`].
pub trait OverrideHandler {
    /// Carry out `group -> value` and return the committed value.
    ///
    /// On error the group's state is left unchanged.
    fn handle<L: PhysicalLedPort>(
        &mut self,
        id: HandlerId,
        group: &str,
        value: bool,
        leds: &mut L,
    ) -> Result<bool>;
}

/// Handler for services with no custom groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverride;

impl OverrideHandler for NoOverride {
    fn handle<L: PhysicalLedPort>(
        &mut self,
        _id: HandlerId,
        group: &str,
        _value: bool,
        _leds: &mut L,
    ) -> Result<bool> {
        Err(Error::Override {
            group: group.to_owned(),
            reason: "no override handler installed".to_owned(),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Identify fan-out
// ───────────────────────────────────────────────────────────────

/// LEDs an identify group fans out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyTarget {
    pub leds: Vec<String>,
    pub action: LedAction,
}

/// Drives a fixed LED list directly: asserting shows the target action
/// on every LED, de-asserting switches them all Off.
#[derive(Debug, Clone, Default)]
pub struct IdentifyFanout {
    targets: Vec<IdentifyTarget>,
}

impl IdentifyFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target and return the id to tag its group with.
    pub fn add(&mut self, target: IdentifyTarget) -> HandlerId {
        let id = HandlerId(self.targets.len() as u16);
        self.targets.push(target);
        id
    }

    pub fn target(&self, id: HandlerId) -> Option<&IdentifyTarget> {
        self.targets.get(id.0 as usize)
    }
}

impl OverrideHandler for IdentifyFanout {
    fn handle<L: PhysicalLedPort>(
        &mut self,
        id: HandlerId,
        group: &str,
        value: bool,
        leds: &mut L,
    ) -> Result<bool> {
        let target = self.target(id).ok_or_else(|| Error::Override {
            group: group.to_owned(),
            reason: format!("no identify target #{}", id.0),
        })?;

        let names = target.leds.iter().map(String::as_str);
        if value {
            drive_batch(leds, names.map(|led| (led, target.action)), [])?;
        } else {
            drive_batch(leds, [], names)?;
        }
        info!("Identify {}: {} LED(s) -> {}", group, target.leds.len(), if value { "asserted" } else { "off" });
        Ok(value)
    }
}
