//! Mock adapters for integration tests.
//!
//! `RecordingLeds` and `MockStore` append to one shared journal so tests
//! can assert on the relative order of durable writes and LED writes.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use ledmanager::app::events::AppEvent;
use ledmanager::app::ports::{
    EventSink, GroupIntent, GroupStorePort, LedError, LedProperty, PhysicalLedPort, PropertyValue,
    StorageError,
};
use ledmanager::layout::LedState;

// ── Journal ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Store { group: String, asserted: bool },
    Led { led: String, value: PropertyValue },
}

pub type Journal = Rc<RefCell<Vec<Op>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

// ── RecordingLeds ─────────────────────────────────────────────

pub struct RecordingLeds {
    journal: Journal,
    state: BTreeMap<String, LedState>,
    faulty: HashSet<String>,
    write_only: bool,
}

#[allow(dead_code)]
impl RecordingLeds {
    pub fn new(journal: &Journal, names: &[&str]) -> Self {
        Self {
            journal: Rc::clone(journal),
            state: names.iter().map(|n| ((*n).to_owned(), LedState::Off)).collect(),
            faulty: HashSet::new(),
            write_only: false,
        }
    }

    /// Every `get` answers `Unsupported`, like a backend with no readback.
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn fail(&mut self, led: &str) {
        self.faulty.insert(led.to_owned());
    }

    pub fn state(&self, led: &str) -> Option<LedState> {
        self.state.get(led).copied()
    }

    pub fn led_writes(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|op| matches!(op, Op::Led { .. }))
            .count()
    }
}

impl PhysicalLedPort for RecordingLeds {
    fn get(&self, led: &str, property: LedProperty) -> Result<PropertyValue, LedError> {
        if self.write_only {
            return Err(LedError::Unsupported);
        }
        let state = self.state.get(led).ok_or(LedError::NotFound)?;
        match property {
            LedProperty::State => Ok(PropertyValue::State(*state)),
            _ => Err(LedError::Unsupported),
        }
    }

    fn set(&mut self, led: &str, value: PropertyValue) -> Result<(), LedError> {
        if self.faulty.contains(led) {
            return Err(LedError::Io("injected".into()));
        }
        let state = self.state.get_mut(led).ok_or(LedError::NotFound)?;
        if let PropertyValue::State(s) = value {
            *state = s;
        }
        self.journal.borrow_mut().push(Op::Led {
            led: led.to_owned(),
            value,
        });
        Ok(())
    }
}

// ── MockStore ─────────────────────────────────────────────────

pub struct MockStore {
    journal: Journal,
    pub groups: GroupIntent,
    pub fail_writes: bool,
    pub corrupt: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            groups: GroupIntent::new(),
            fail_writes: false,
            corrupt: false,
        }
    }

    /// A store whose record lists `groups`, oldest change first.
    pub fn with(journal: &Journal, groups: &[(&str, bool)]) -> Self {
        let mut store = Self::new(journal);
        store.groups = groups.iter().map(|(g, v)| (*g, *v)).collect();
        store
    }
}

impl GroupStorePort for MockStore {
    fn store_group(&mut self, name: &str, asserted: bool) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.groups.record(name, asserted);
        self.journal.borrow_mut().push(Op::Store {
            group: name.to_owned(),
            asserted,
        });
        Ok(())
    }

    fn load_all(&self) -> Result<GroupIntent, StorageError> {
        if self.corrupt {
            return Err(StorageError::Corrupted);
        }
        Ok(self.groups.clone())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
