//! Application core: group façade and its ports.
//!
//! This module contains the rules for turning group requests into
//! persisted intent and physical LED writes.  All interaction with
//! hardware and storage happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real LEDs.

pub mod commands;
pub mod events;
pub mod overrides;
pub mod ports;
pub mod service;
