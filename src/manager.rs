//! Arbitration engine.
//!
//! Owns the per-LED reference table (which asserted groups claim each
//! LED, and with what action) and the effective state believed to be
//! driven on the hardware.  A group transition is turned into the
//! minimal sets of LEDs to (re)assert and to de-assert.
//!
//! ## Resolution rule
//!
//! Among the current claims on a LED the winner is the highest-ranked
//! action, **Blink > On > Off**.  Ties between claims with the same
//! action go to the most recently asserted group, which only matters
//! for Blink parameters.
//!
//! ## Two-phase use
//!
//! [`Manager::plan`] is pure: it computes a [`Transition`] without
//! touching the tables.  [`Manager::commit`] installs it.  The façade
//! persists between the two so a failed durable write leaves the engine
//! exactly as it was.  [`Manager::set_group_state`] does both at once.
//!
//! The tables are never locked; every call happens on the dispatch
//! thread.

use std::collections::BTreeMap;

use log::debug;

use crate::error::{Error, Result};
use crate::layout::{GroupId, Layout, LedAction, LedId};

/// LED changes produced by one transition, keyed by LED.
pub type ActionSet = BTreeMap<LedId, LedAction>;

// ───────────────────────────────────────────────────────────────
// Reference table
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Claim {
    group: GroupId,
    action: LedAction,
    /// Assertion sequence number of the claiming group.
    seq: u64,
}

/// Currently-asserted groups claiming one LED.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Sorted by ascending `seq`.
    claims: Vec<Claim>,
}

impl ReferenceEntry {
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Claiming groups with their requested action, oldest first.
    pub fn claims(&self) -> impl Iterator<Item = (GroupId, LedAction)> + '_ {
        self.claims.iter().map(|c| (c.group, c.action))
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.claims.iter().any(|c| c.group == group)
    }

    /// The action that should be on the LED, or `None` if unclaimed.
    pub fn winner(&self) -> Option<LedAction> {
        self.claims
            .iter()
            .max_by_key(|c| (c.action.priority(), c.seq))
            .map(|c| c.action)
    }

    fn insert(&mut self, claim: Claim) {
        self.claims.retain(|c| c.group != claim.group);
        let pos = self.claims.partition_point(|c| c.seq <= claim.seq);
        self.claims.insert(pos, claim);
    }

    fn remove(&mut self, group: GroupId) {
        self.claims.retain(|c| c.group != group);
    }
}

// ───────────────────────────────────────────────────────────────
// Transition
// ───────────────────────────────────────────────────────────────

/// Result of arbitrating one group transition.
///
/// `assert` and `deassert` are disjoint; every LED of the group appears
/// in at most one of them.  LEDs that are already showing the right
/// action are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub group: GroupId,
    /// Committed state of the group (always the requested value).
    pub asserted: bool,
    /// LEDs to drive, with their new effective action.
    pub assert: ActionSet,
    /// LEDs no longer claimed by anyone; always `Off`.
    pub deassert: ActionSet,
    changed: bool,
    seq: u64,
    generation: u64,
    effective: Vec<(LedId, Option<LedAction>)>,
}

impl Transition {
    /// `true` when the group was already in the requested state.
    pub fn is_noop(&self) -> bool {
        !self.changed
    }

    /// `true` when there is nothing to write to the hardware.
    pub fn is_quiet(&self) -> bool {
        self.assert.is_empty() && self.deassert.is_empty()
    }
}

/// Comparable view of the arbitration tables, without sequence numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArbitrationSnapshot {
    pub references: BTreeMap<LedId, Vec<(GroupId, LedAction)>>,
    pub effective: BTreeMap<LedId, LedAction>,
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

/// The arbitration engine.  One instance per process.
#[derive(Debug)]
pub struct Manager {
    layout: Layout,
    references: BTreeMap<LedId, ReferenceEntry>,
    effective: BTreeMap<LedId, LedAction>,
    /// Asserted groups and the sequence number they were asserted at.
    asserted: BTreeMap<GroupId, u64>,
    next_seq: u64,
    /// Bumped on every commit; plans are only valid against the
    /// generation they were computed from.
    generation: u64,
}

impl Manager {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            references: BTreeMap::new(),
            effective: BTreeMap::new(),
            asserted: BTreeMap::new(),
            next_seq: 0,
            generation: 0,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // ── Transitions ───────────────────────────────────────────

    /// Arbitrate and commit a group transition in one step.
    pub fn set_group_state(&mut self, group: &str, asserted: bool) -> Result<Transition> {
        let transition = self.plan(group, asserted)?;
        self.commit(&transition);
        Ok(transition)
    }

    /// Compute the transition for `group` without changing any table.
    pub fn plan(&self, group: &str, asserted: bool) -> Result<Transition> {
        let id = self
            .layout
            .group_id(group)
            .ok_or_else(|| Error::InvalidGroup(group.to_owned()))?;
        Ok(self.plan_id(id, asserted))
    }

    /// [`plan`](Self::plan) for an already-resolved group id.
    pub fn plan_id(&self, group: GroupId, asserted: bool) -> Transition {
        let mut t = Transition {
            group,
            asserted,
            assert: ActionSet::new(),
            deassert: ActionSet::new(),
            changed: false,
            seq: self.next_seq,
            generation: self.generation,
            effective: Vec::new(),
        };
        if self.is_asserted(group) == asserted {
            return t;
        }
        t.changed = true;

        for req in &self.layout.group(group).requirements {
            let mut entry = self.references.get(&req.led).cloned().unwrap_or_default();
            if asserted {
                entry.insert(Claim {
                    group,
                    action: req.action,
                    seq: t.seq,
                });
            } else {
                entry.remove(group);
            }

            let before = self.effective.get(&req.led).copied();
            let after = entry.winner();
            match after {
                None => {
                    if before.is_some() {
                        t.deassert.insert(req.led, LedAction::Off);
                    }
                }
                Some(action) if before != Some(action) => {
                    t.assert.insert(req.led, action);
                }
                Some(_) => {}
            }
            t.effective.push((req.led, after));
        }

        debug!(
            "plan {} -> {}: assert={} deassert={}",
            self.layout.group(group).name,
            asserted,
            t.assert.len(),
            t.deassert.len()
        );
        t
    }

    /// Install a transition computed by [`plan`](Self::plan).
    ///
    /// Must be called before any other commit, or the plan is stale.
    pub fn commit(&mut self, t: &Transition) {
        if !t.changed {
            return;
        }
        debug_assert_eq!(t.generation, self.generation, "stale transition");

        for req in &self.layout.group(t.group).requirements {
            let entry = self.references.entry(req.led).or_default();
            if t.asserted {
                entry.insert(Claim {
                    group: t.group,
                    action: req.action,
                    seq: t.seq,
                });
            } else {
                entry.remove(t.group);
                if entry.is_empty() {
                    self.references.remove(&req.led);
                }
            }
        }

        for (led, action) in &t.effective {
            match action {
                Some(a) => {
                    self.effective.insert(*led, *a);
                }
                None => {
                    self.effective.remove(led);
                }
            }
        }

        if t.asserted {
            self.asserted.insert(t.group, t.seq);
            self.next_seq = t.seq + 1;
        } else {
            self.asserted.remove(&t.group);
        }
        self.generation += 1;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_asserted(&self, group: GroupId) -> bool {
        self.asserted.contains_key(&group)
    }

    /// Asserted groups, in assertion order.
    pub fn asserted_groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<(u64, GroupId)> = self.asserted.iter().map(|(g, s)| (*s, *g)).collect();
        groups.sort_unstable();
        groups.into_iter().map(|(_, g)| g).collect()
    }

    /// Action currently believed to be on `led`, if anyone claims it.
    pub fn effective(&self, led: LedId) -> Option<LedAction> {
        self.effective.get(&led).copied()
    }

    pub fn reference(&self, led: LedId) -> Option<&ReferenceEntry> {
        self.references.get(&led)
    }

    /// LEDs with at least one claim.
    pub fn driven_leds(&self) -> impl Iterator<Item = LedId> + '_ {
        self.effective.keys().copied()
    }

    pub fn snapshot(&self) -> ArbitrationSnapshot {
        ArbitrationSnapshot {
            references: self
                .references
                .iter()
                .map(|(led, entry)| (*led, entry.claims().collect()))
                .collect(),
            effective: self.effective.clone(),
        }
    }
}
