//! Application service: the group façade.
//!
//! [`LedService`] owns the arbitration engine and the per-group state.
//! It exposes a clean, hardware-agnostic API.  All I/O flows through
//! port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  GroupStorePort ◀── ┌────────────────────────┐ ──▶ EventSink
//!                     │       LedService        │
//! PhysicalLedPort ◀── │  Manager · overrides    │
//!                     └────────────────────────┘
//! ```
//!
//! ## Transition order
//!
//! 1. Arbitration plans the transition (no state touched).
//! 2. The new value is persisted.  If that fails, the request fails and
//!    nothing else changes.
//! 3. The plan is committed and the group's `asserted` updated.
//! 4. The physical LEDs are driven.  If some writes fail, the request
//!    fails but the group stays committed: persisted and in-memory state
//!    say "asserted" while some LEDs may lag.  This window is reported,
//!    not rolled back.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::overrides::{GroupHandler, HandlerId, NoOverride, OverrideHandler};
use crate::app::ports::{EventSink, GroupStorePort, LedError, LedProperty, PhysicalLedPort, StorageError};
use crate::drivers::led_driver::drive;
use crate::error::{Error, Result};
use crate::layout::{GroupId, Layout};
use crate::manager::Manager;

// ───────────────────────────────────────────────────────────────
// Group state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct GroupState {
    /// Last committed value of the `Asserted` property.
    asserted: bool,
    handler: GroupHandler,
}

/// What startup replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Persisted-asserted groups rebuilt through arbitration.
    pub replayed: Vec<String>,
    /// Persisted-asserted groups that could not be replayed, with why.
    pub skipped: Vec<(String, String)>,
}

// ───────────────────────────────────────────────────────────────
// LedService
// ───────────────────────────────────────────────────────────────

/// The group façade.  `H` handles groups tagged [`GroupHandler::Custom`].
pub struct LedService<H = NoOverride> {
    manager: Manager,
    /// Indexed by [`GroupId`].
    groups: Vec<GroupState>,
    overrides: H,
}

impl LedService<NoOverride> {
    pub fn new(layout: Layout) -> Self {
        Self::with_overrides(layout, NoOverride)
    }
}

impl<H: OverrideHandler> LedService<H> {
    /// Build the service with every group de-asserted.
    ///
    /// Call [`start`](Self::start) before serving requests.
    pub fn with_overrides(layout: Layout, overrides: H) -> Self {
        let groups = vec![GroupState::default(); layout.group_count()];
        Self {
            manager: Manager::new(layout),
            groups,
            overrides,
        }
    }

    /// Route `group`'s transitions to the override handler under `id`.
    pub fn register_override(&mut self, group: &str, id: HandlerId) -> Result<()> {
        let gid = self.resolve(group)?;
        self.groups[gid.index()].handler = GroupHandler::Custom(id);
        info!("Group {} handled by override #{}", group, id.0);
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Replay persisted intent.
    ///
    /// Every group recorded as asserted goes through the same arbitration
    /// path as a live request, so the reference tables and the physical
    /// LEDs are rebuilt consistently.  Groups are replayed in the order
    /// they were asserted, which restores last-asserted tie-breaks.  A
    /// group that cannot be replayed is logged and skipped; the rest of
    /// startup proceeds.
    pub fn start(
        &mut self,
        store: &impl GroupStorePort,
        leds: &mut impl PhysicalLedPort,
        sink: &mut impl EventSink,
    ) -> StartupReport {
        let persisted = match store.load_all() {
            Ok(intent) => intent,
            Err(StorageError::NotFound) => Default::default(),
            Err(e) => {
                warn!("Persisted groups unreadable ({}), starting with all groups de-asserted", e);
                Default::default()
            }
        };

        let mut report = StartupReport::default();
        for name in persisted.asserted() {
            match self.replay(name, leds) {
                Ok(()) => report.replayed.push(name.to_owned()),
                Err(e) => {
                    warn!("Replay of {} skipped: {}", name, e);
                    sink.emit(&AppEvent::ReplaySkipped {
                        group: name.to_owned(),
                        reason: e.to_string(),
                    });
                    report.skipped.push((name.to_owned(), e.to_string()));
                }
            }
        }

        sink.emit(&AppEvent::Started {
            groups: self.groups.len(),
            replayed: report.replayed.len(),
            skipped: report.skipped.len(),
        });
        info!(
            "LedService started: {} group(s), {} replayed, {} skipped",
            self.groups.len(),
            report.replayed.len(),
            report.skipped.len()
        );
        report
    }

    fn replay(&mut self, name: &str, leds: &mut impl PhysicalLedPort) -> Result<()> {
        let id = self.resolve(name)?;
        if let GroupHandler::Custom(_) = self.groups[id.index()].handler {
            return Err(Error::Override {
                group: name.to_owned(),
                reason: "override groups are not replayed".to_owned(),
            });
        }

        // Only a LED the backend reports as absent blocks replay; a
        // write-only backend answers Unsupported.
        let layout = self.manager.layout();
        for req in &layout.group(id).requirements {
            let led = layout.led_name(req.led);
            if let Err(LedError::NotFound) = leds.get(led, LedProperty::State) {
                return Err(Error::Led {
                    led: led.to_owned(),
                    source: LedError::NotFound,
                });
            }
        }

        let transition = self.manager.plan_id(id, true);
        self.manager.commit(&transition);
        self.groups[id.index()].asserted = true;

        // The intent is restored even if some LEDs lag behind.
        if let Err(failure) = drive(leds, self.manager.layout(), &transition.assert, &transition.deassert) {
            error!("Replay of {}: {}", name, failure);
        }
        Ok(())
    }

    // ── Group surface ─────────────────────────────────────────

    /// Set a group's `Asserted` property and return the committed value.
    pub fn set_asserted(
        &mut self,
        group: &str,
        value: bool,
        store: &mut impl GroupStorePort,
        leds: &mut impl PhysicalLedPort,
        sink: &mut impl EventSink,
    ) -> Result<bool> {
        let id = self.resolve(group)?;
        let state = self.groups[id.index()];
        if state.asserted == value {
            debug!("{}: already {}", group, value);
            return Ok(value);
        }

        match state.handler {
            GroupHandler::Custom(handler) => {
                let committed = self.overrides.handle(handler, group, value, leds)?;
                self.groups[id.index()].asserted = committed;
                sink.emit(&AppEvent::Overridden {
                    group: group.to_owned(),
                    asserted: committed,
                });
                Ok(committed)
            }
            GroupHandler::Standard => self.arbitrate(id, value, store, leds, sink),
        }
    }

    /// Last committed value of a group's `Asserted` property.
    pub fn asserted(&self, group: &str) -> Result<bool> {
        let id = self.resolve(group)?;
        Ok(self.groups[id.index()].asserted)
    }

    /// Every group with its committed state, in layout order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, bool)> {
        self.manager
            .layout()
            .groups()
            .map(|(id, g)| (g.name.as_str(), self.groups[id.index()].asserted))
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn layout(&self) -> &Layout {
        self.manager.layout()
    }

    // ── Internal ──────────────────────────────────────────────

    fn resolve(&self, group: &str) -> Result<GroupId> {
        self.manager
            .layout()
            .group_id(group)
            .ok_or_else(|| Error::InvalidGroup(group.to_owned()))
    }

    fn arbitrate(
        &mut self,
        id: GroupId,
        value: bool,
        store: &mut impl GroupStorePort,
        leds: &mut impl PhysicalLedPort,
        sink: &mut impl EventSink,
    ) -> Result<bool> {
        let name = self.manager.layout().group(id).name.clone();
        let transition = self.manager.plan_id(id, value);

        if let Err(e) = store.store_group(&name, transition.asserted) {
            error!("{}: persisting {} failed: {}", name, transition.asserted, e);
            return Err(Error::Persistence(e));
        }

        self.manager.commit(&transition);
        self.groups[id.index()].asserted = transition.asserted;
        sink.emit(&AppEvent::GroupChanged {
            group: name.clone(),
            asserted: transition.asserted,
        });
        info!(
            "{} -> {} ({} assert, {} de-assert)",
            name,
            transition.asserted,
            transition.assert.len(),
            transition.deassert.len()
        );

        match drive(leds, self.manager.layout(), &transition.assert, &transition.deassert) {
            Ok(()) => {
                sink.emit(&AppEvent::LedsDriven {
                    group: name,
                    asserted: transition.assert.len(),
                    deasserted: transition.deassert.len(),
                });
                Ok(transition.asserted)
            }
            Err(failure) => {
                sink.emit(&AppEvent::DriveFailed {
                    group: name,
                    failed: failure.leds().map(str::to_owned).collect(),
                });
                Err(Error::HardwareWrite(failure))
            }
        }
    }
}
