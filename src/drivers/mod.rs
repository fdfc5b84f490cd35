//! Physical LED drive helpers.

pub mod led_driver;
