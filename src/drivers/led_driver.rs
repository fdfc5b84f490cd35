//! Physical LED drive batches.
//!
//! Turns the assert/de-assert sets produced by arbitration into property
//! writes on a [`PhysicalLedPort`].
//!
//! ## Write order
//!
//! For a Blink target, `DutyOn` and `Period` are written **before**
//! `State`, so a LED entering Blink never flashes with a stale duty
//! cycle.  `On`/`Off` targets write `State` only.
//!
//! ## Failures
//!
//! A batch is best-effort fan-out: a failing LED is logged and recorded,
//! and the remaining LEDs are still written.  The caller gets one
//! aggregated [`HardwareWriteFailure`] at the end.

use log::{debug, error};

use crate::app::ports::{LedError, PhysicalLedPort, PropertyValue};
use crate::error::HardwareWriteFailure;
use crate::layout::{Layout, LedAction, LedState};
use crate::manager::ActionSet;

/// Drive the LEDs of one arbitration transition.
pub fn drive(
    leds: &mut impl PhysicalLedPort,
    layout: &Layout,
    assert: &ActionSet,
    deassert: &ActionSet,
) -> Result<(), HardwareWriteFailure> {
    drive_batch(
        leds,
        assert.iter().map(|(id, action)| (layout.led_name(*id), *action)),
        deassert.keys().map(|id| layout.led_name(*id)),
    )
}

/// Drive a batch of LEDs named directly.
///
/// `assert` entries get their action; `deassert` entries are switched Off.
pub fn drive_batch<'a>(
    leds: &mut impl PhysicalLedPort,
    assert: impl IntoIterator<Item = (&'a str, LedAction)>,
    deassert: impl IntoIterator<Item = &'a str>,
) -> Result<(), HardwareWriteFailure> {
    let mut failure = HardwareWriteFailure::default();

    for (led, action) in assert {
        debug!("drive {} -> {}", led, action);
        if let Err(e) = apply(leds, led, action) {
            error!("LED {}: failed to apply {}: {}", led, action, e);
            failure.failures.push((led.to_owned(), e));
        }
    }

    for led in deassert {
        debug!("drive {} -> Off", led);
        if let Err(e) = leds.set(led, PropertyValue::State(LedState::Off)) {
            error!("LED {}: failed to switch off: {}", led, e);
            failure.failures.push((led.to_owned(), e));
        }
    }

    if failure.is_empty() { Ok(()) } else { Err(failure) }
}

/// Write one LED.  A failed timing write skips the state write.
fn apply(leds: &mut impl PhysicalLedPort, led: &str, action: LedAction) -> Result<(), LedError> {
    if let LedAction::Blink { duty_on, period_ms } = action {
        leds.set(led, PropertyValue::DutyOn(duty_on))?;
        leds.set(led, PropertyValue::Period(period_ms))?;
    }
    leds.set(led, PropertyValue::State(action.state()))
}
