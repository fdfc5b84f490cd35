//! In-memory physical LED store.
//!
//! Backs the `Simulated` LED backend and host-side tests: every known
//! LED holds `{State, DutyOn, Period}` registers, every write is logged,
//! and individual LEDs can be made to fail.

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::app::ports::{LedError, LedProperty, PhysicalLedPort, PropertyValue};
use crate::layout::{Layout, LedState};

/// Register file of one simulated LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRegisters {
    pub state: LedState,
    pub duty_on: u8,
    pub period_ms: u16,
}

impl Default for LedRegisters {
    fn default() -> Self {
        Self {
            state: LedState::Off,
            duty_on: 50,
            period_ms: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SimulatedLeds {
    leds: BTreeMap<String, LedRegisters>,
    writes: Vec<(String, PropertyValue)>,
    faulty: HashSet<String>,
}

impl SimulatedLeds {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            leds: names
                .into_iter()
                .map(|n| (n.into(), LedRegisters::default()))
                .collect(),
            ..Self::default()
        }
    }

    /// One LED per name the layout mentions.
    pub fn from_layout(layout: &Layout) -> Self {
        Self::new(layout.leds().map(|(_, name)| name))
    }

    /// Make reads and writes of `name` fail with an I/O error.
    pub fn fail(&mut self, name: impl Into<String>) {
        self.faulty.insert(name.into());
    }

    pub fn heal(&mut self, name: &str) {
        self.faulty.remove(name);
    }

    pub fn registers(&self, name: &str) -> Option<LedRegisters> {
        self.leds.get(name).copied()
    }

    pub fn state(&self, name: &str) -> Option<LedState> {
        self.leds.get(name).map(|r| r.state)
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> &[(String, PropertyValue)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn check(&self, name: &str) -> Result<(), LedError> {
        if self.faulty.contains(name) {
            return Err(LedError::Io("simulated fault".to_owned()));
        }
        if !self.leds.contains_key(name) {
            return Err(LedError::NotFound);
        }
        Ok(())
    }
}

impl PhysicalLedPort for SimulatedLeds {
    fn get(&self, led: &str, property: LedProperty) -> Result<PropertyValue, LedError> {
        self.check(led)?;
        let regs = self.leds.get(led).ok_or(LedError::NotFound)?;
        Ok(match property {
            LedProperty::State => PropertyValue::State(regs.state),
            LedProperty::DutyOn => PropertyValue::DutyOn(regs.duty_on),
            LedProperty::Period => PropertyValue::Period(regs.period_ms),
        })
    }

    fn set(&mut self, led: &str, value: PropertyValue) -> Result<(), LedError> {
        self.check(led)?;
        if let PropertyValue::DutyOn(d) = value {
            if d > 100 {
                return Err(LedError::InvalidValue);
            }
        }
        let regs = self.leds.get_mut(led).ok_or(LedError::NotFound)?;
        match value {
            PropertyValue::State(s) => regs.state = s,
            PropertyValue::DutyOn(d) => regs.duty_on = d,
            PropertyValue::Period(p) => regs.period_ms = p,
        }
        debug!("sim {} <- {:?}", led, value);
        self.writes.push((led.to_owned(), value));
        Ok(())
    }
}
