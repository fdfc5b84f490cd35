//! Static group → LED layout.
//!
//! Loaded once at startup and immutable afterwards.  Group and LED names
//! are interned into [`GroupId`] / [`LedId`] so the arbitration tables
//! can key on small copyable ids instead of strings.
//!
//! ## File format
//!
//! ```json
//! {
//!   "leds": [
//!     {
//!       "group": "enclosure_identify",
//!       "members": [
//!         { "Name": "front_id", "Action": "Blink", "DutyOn": 50, "Period": 1000 },
//!         { "Name": "rear_id",  "Action": "On" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `DutyOn` and `Period` are only meaningful for `Blink` and default to
//! 50 % and 0 ms.

use core::fmt;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_DUTY_ON: u8 = 50;

// ───────────────────────────────────────────────────────────────
// Ids
// ───────────────────────────────────────────────────────────────

/// Interned physical LED identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedId(u32);

impl LedId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(u32);

impl GroupId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ───────────────────────────────────────────────────────────────
// Actions
// ───────────────────────────────────────────────────────────────

/// Value of a physical LED's `State` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedState {
    Off,
    On,
    Blink,
}

impl LedState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::On => "On",
            Self::Blink => "Blink",
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a group wants a LED to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedAction {
    Off,
    On,
    Blink { duty_on: u8, period_ms: u16 },
}

impl LedAction {
    /// Build an action from its wire parts.  Blink parameters are
    /// dropped for `Off`/`On`.
    pub const fn from_parts(state: LedState, duty_on: u8, period_ms: u16) -> Self {
        match state {
            LedState::Off => Self::Off,
            LedState::On => Self::On,
            LedState::Blink => Self::Blink { duty_on, period_ms },
        }
    }

    pub const fn state(self) -> LedState {
        match self {
            Self::Off => LedState::Off,
            Self::On => LedState::On,
            Self::Blink { .. } => LedState::Blink,
        }
    }

    /// Arbitration rank: Blink > On > Off.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Blink { .. } => 2,
        }
    }
}

impl fmt::Display for LedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blink { duty_on, period_ms } => write!(f, "Blink({duty_on}%/{period_ms}ms)"),
            other => f.write_str(other.state().as_str()),
        }
    }
}

/// A (LED, action) pair a group demands while asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRequirement {
    pub led: LedId,
    pub action: LedAction,
}

/// One group as loaded from the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub name: String,
    /// Unique by LED, in file order.
    pub requirements: Vec<LedRequirement>,
}

// ───────────────────────────────────────────────────────────────
// Layout
// ───────────────────────────────────────────────────────────────

/// The full static layout: every group and every LED any group names.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    leds: Vec<String>,
    led_index: HashMap<String, LedId>,
    groups: Vec<GroupLayout>,
    group_index: HashMap<String, GroupId>,
}

impl Layout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::default()
    }

    /// Parse and validate a JSON layout document.
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile =
            serde_json::from_str(text).map_err(|e| LayoutError::Parse(e.to_string()))?;
        let mut builder = Self::builder();
        for entry in file.leds {
            let members: Vec<(String, LedAction)> = entry
                .members
                .into_iter()
                .map(|m| (m.name, LedAction::from_parts(m.action, m.duty_on, m.period)))
                .collect();
            builder = builder.group(entry.group, members);
        }
        builder.build()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LayoutError::Io(format!("{}: {e}", path.display())))?;
        let layout = Self::from_json(&text)?;
        log::info!(
            "Layout: {} group(s), {} LED(s) from {}",
            layout.group_count(),
            layout.led_count(),
            path.display()
        );
        Ok(layout)
    }

    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.group_index.get(name).copied()
    }

    /// Panics if `id` did not come from this layout.
    pub fn group(&self, id: GroupId) -> &GroupLayout {
        &self.groups[id.index()]
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &GroupLayout)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (GroupId(i as u32), g))
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn led_id(&self, name: &str) -> Option<LedId> {
        self.led_index.get(name).copied()
    }

    /// Panics if `id` did not come from this layout.
    pub fn led_name(&self, id: LedId) -> &str {
        &self.leds[id.index()]
    }

    pub fn leds(&self) -> impl Iterator<Item = (LedId, &str)> {
        self.leds
            .iter()
            .enumerate()
            .map(|(i, name)| (LedId(i as u32), name.as_str()))
    }

    pub fn led_count(&self) -> usize {
        self.leds.len()
    }
}

/// Incremental layout construction; validation happens in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    groups: Vec<(String, Vec<(String, LedAction)>)>,
}

impl LayoutBuilder {
    #[must_use]
    pub fn group<L: Into<String>>(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (L, LedAction)>,
    ) -> Self {
        let members = members.into_iter().map(|(led, a)| (led.into(), a)).collect();
        self.groups.push((name.into(), members));
        self
    }

    pub fn build(self) -> Result<Layout, LayoutError> {
        let mut layout = Layout::default();
        for (name, members) in self.groups {
            if name.is_empty() {
                return Err(LayoutError::EmptyGroupName);
            }
            if layout.group_index.contains_key(&name) {
                return Err(LayoutError::DuplicateGroup(name));
            }

            let mut requirements: Vec<LedRequirement> = Vec::with_capacity(members.len());
            for (led_name, action) in members {
                if led_name.is_empty() {
                    return Err(LayoutError::EmptyLedName { group: name });
                }
                if let LedAction::Blink { duty_on, .. } = action {
                    if duty_on > 100 {
                        return Err(LayoutError::DutyOutOfRange {
                            group: name,
                            led: led_name,
                            duty_on,
                        });
                    }
                }
                let led = layout.intern_led(led_name);
                if requirements.iter().any(|r| r.led == led) {
                    return Err(LayoutError::DuplicateLed {
                        group: name,
                        led: layout.leds[led.index()].clone(),
                    });
                }
                requirements.push(LedRequirement { led, action });
            }

            let id = GroupId(layout.groups.len() as u32);
            layout.group_index.insert(name.clone(), id);
            layout.groups.push(GroupLayout { name, requirements });
        }
        Ok(layout)
    }
}

impl Layout {
    fn intern_led(&mut self, name: String) -> LedId {
        if let Some(id) = self.led_index.get(&name) {
            return *id;
        }
        let id = LedId(self.leds.len() as u32);
        self.led_index.insert(name.clone(), id);
        self.leds.push(name);
        id
    }
}

// ───────────────────────────────────────────────────────────────
// Wire format
// ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LayoutFile {
    leds: Vec<GroupEntry>,
}

#[derive(Deserialize)]
struct GroupEntry {
    group: String,
    #[serde(default)]
    members: Vec<MemberEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MemberEntry {
    name: String,
    action: LedState,
    #[serde(default = "default_duty_on")]
    duty_on: u8,
    #[serde(default)]
    period: u16,
}

fn default_duty_on() -> u8 {
    DEFAULT_DUTY_ON
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout file could not be read.
    Io(String),
    /// The layout document is not valid JSON for this format.
    Parse(String),
    EmptyGroupName,
    EmptyLedName { group: String },
    DuplicateGroup(String),
    /// A group names the same LED twice.
    DuplicateLed { group: String, led: String },
    DutyOutOfRange { group: String, led: String, duty_on: u8 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read layout: {msg}"),
            Self::Parse(msg) => write!(f, "malformed layout: {msg}"),
            Self::EmptyGroupName => write!(f, "group with empty name"),
            Self::EmptyLedName { group } => write!(f, "group '{group}' has a member with an empty LED name"),
            Self::DuplicateGroup(name) => write!(f, "group '{name}' defined twice"),
            Self::DuplicateLed { group, led } => write!(f, "group '{group}' lists LED '{led}' twice"),
            Self::DutyOutOfRange { group, led, duty_on } => {
                write!(f, "group '{group}' LED '{led}': DutyOn {duty_on} exceeds 100")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
