//! Group façade: ordering of persistence and LED writes, failure
//! handling, and override routing.

use crate::mock_hw::{MockStore, Op, RecordingLeds, RecordingSink, journal};

use ledmanager::app::events::AppEvent;
use ledmanager::app::overrides::{IdentifyFanout, IdentifyTarget, NoOverride};
use ledmanager::app::ports::{LedError, PropertyValue, StorageError};
use ledmanager::app::service::LedService;
use ledmanager::error::Error;
use ledmanager::layout::{Layout, LedAction, LedState};

const BLINK: LedAction = LedAction::Blink { duty_on: 50, period_ms: 500 };
const LEDS: &[&str] = &["sys", "front", "fault", "slot1", "slot2"];

fn layout() -> Layout {
    Layout::builder()
        .group("power", [("sys", LedAction::On), ("front", LedAction::On)])
        .group("fault", [("sys", BLINK), ("fault", LedAction::On)])
        .group("chassis_identify", Vec::<(&str, LedAction)>::new())
        .build()
        .unwrap()
}

fn service() -> LedService<NoOverride> {
    let mut svc = LedService::new(layout());
    svc.start(&MockStore::new(&journal()), &mut RecordingLeds::new(&journal(), LEDS), &mut RecordingSink::new());
    svc
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn persists_before_touching_leds() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    assert_eq!(svc.set_asserted("fault", true, &mut store, &mut leds, &mut sink), Ok(true));

    let ops = j.borrow();
    assert_eq!(
        ops[0],
        Op::Store {
            group: "fault".into(),
            asserted: true
        }
    );
    assert!(ops[1..].iter().all(|op| matches!(op, Op::Led { .. })));
    assert_eq!(leds.state("sys"), Some(LedState::Blink));
    assert_eq!(leds.state("fault"), Some(LedState::On));
}

#[test]
fn blink_timing_is_written_before_state() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    svc.set_asserted("fault", true, &mut store, &mut leds, &mut sink).unwrap();

    let sys: Vec<PropertyValue> = j
        .borrow()
        .iter()
        .filter_map(|op| match op {
            Op::Led { led, value } if led == "sys" => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(
        sys,
        [
            PropertyValue::DutyOn(50),
            PropertyValue::Period(500),
            PropertyValue::State(LedState::Blink)
        ]
    );
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn persistence_failure_changes_nothing() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());
    store.fail_writes = true;
    let before = svc.manager().snapshot();

    assert_eq!(
        svc.set_asserted("power", true, &mut store, &mut leds, &mut sink),
        Err(Error::Persistence(StorageError::Full))
    );
    assert_eq!(leds.led_writes(), 0);
    assert_eq!(svc.asserted("power"), Ok(false));
    assert_eq!(svc.manager().snapshot(), before);
    assert!(sink.events.is_empty());

    // The same request succeeds once storage recovers.
    store.fail_writes = false;
    assert_eq!(svc.set_asserted("power", true, &mut store, &mut leds, &mut sink), Ok(true));
}

#[test]
fn hardware_failure_still_commits() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());
    leds.fail("front");

    let err = svc
        .set_asserted("power", true, &mut store, &mut leds, &mut sink)
        .unwrap_err();
    let Error::HardwareWrite(failure) = err else {
        panic!("expected a hardware failure, got {err:?}");
    };
    assert_eq!(failure.leds().collect::<Vec<_>>(), ["front"]);
    assert!(matches!(failure.failures[0].1, LedError::Io(_)));

    // The rest of the batch went through and the intent is committed.
    assert_eq!(leds.state("sys"), Some(LedState::On));
    assert_eq!(svc.asserted("power"), Ok(true));
    assert_eq!(store.groups.get("power"), Some(true));
    assert!(sink.events.contains(&AppEvent::DriveFailed {
        group: "power".into(),
        failed: vec!["front".into()],
    }));
}

#[test]
fn unknown_group_is_rejected_before_any_io() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    assert_eq!(
        svc.set_asserted("nope", true, &mut store, &mut leds, &mut sink),
        Err(Error::InvalidGroup("nope".into()))
    );
    assert_eq!(svc.asserted("nope"), Err(Error::InvalidGroup("nope".into())));
    assert!(j.borrow().is_empty());
}

// ── Idempotence and arbitration through the façade ───────────

#[test]
fn repeating_a_value_writes_nothing() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    assert_eq!(svc.set_asserted("power", false, &mut store, &mut leds, &mut sink), Ok(false));
    assert!(j.borrow().is_empty());

    svc.set_asserted("power", true, &mut store, &mut leds, &mut sink).unwrap();
    let len = j.borrow().len();
    assert_eq!(svc.set_asserted("power", true, &mut store, &mut leds, &mut sink), Ok(true));
    assert_eq!(j.borrow().len(), len);
}

#[test]
fn shared_led_follows_the_remaining_claim() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    svc.set_asserted("power", true, &mut store, &mut leds, &mut sink).unwrap();
    svc.set_asserted("fault", true, &mut store, &mut leds, &mut sink).unwrap();
    assert_eq!(leds.state("sys"), Some(LedState::Blink));

    svc.set_asserted("fault", false, &mut store, &mut leds, &mut sink).unwrap();
    assert_eq!(leds.state("sys"), Some(LedState::On));
    assert_eq!(leds.state("fault"), Some(LedState::Off));
    assert_eq!(leds.state("front"), Some(LedState::On));

    svc.set_asserted("power", false, &mut store, &mut leds, &mut sink).unwrap();
    assert!(LEDS.iter().all(|l| leds.state(l) == Some(LedState::Off)));
    assert_eq!(svc.manager().driven_leds().count(), 0);
}

// ── Overrides ─────────────────────────────────────────────────

fn identify_service() -> LedService<IdentifyFanout> {
    let mut fanout = IdentifyFanout::new();
    let id = fanout.add(IdentifyTarget {
        leds: vec!["slot1".into(), "slot2".into()],
        action: BLINK,
    });
    let mut svc = LedService::with_overrides(layout(), fanout);
    svc.register_override("chassis_identify", id).unwrap();
    svc
}

#[test]
fn override_group_bypasses_arbitration_and_storage() {
    let j = journal();
    let mut svc = identify_service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());

    assert_eq!(svc.set_asserted("chassis_identify", true, &mut store, &mut leds, &mut sink), Ok(true));
    assert_eq!(leds.state("slot1"), Some(LedState::Blink));
    assert_eq!(leds.state("slot2"), Some(LedState::Blink));
    assert!(store.groups.is_empty());
    assert!(!j.borrow().iter().any(|op| matches!(op, Op::Store { .. })));
    assert_eq!(svc.manager().driven_leds().count(), 0);
    assert_eq!(sink.events, [AppEvent::Overridden {
        group: "chassis_identify".into(),
        asserted: true
    }]);

    assert_eq!(svc.set_asserted("chassis_identify", false, &mut store, &mut leds, &mut sink), Ok(false));
    assert_eq!(leds.state("slot1"), Some(LedState::Off));
    assert_eq!(svc.asserted("chassis_identify"), Ok(false));
}

#[test]
fn failed_override_leaves_state_unchanged() {
    let j = journal();
    let mut svc = identify_service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());
    leds.fail("slot2");

    assert!(matches!(
        svc.set_asserted("chassis_identify", true, &mut store, &mut leds, &mut sink),
        Err(Error::HardwareWrite(_))
    ));
    assert_eq!(svc.asserted("chassis_identify"), Ok(false));
}

#[test]
fn groups_lists_every_layout_group() {
    let j = journal();
    let mut svc = service();
    let (mut store, mut leds, mut sink) = (MockStore::new(&j), RecordingLeds::new(&j, LEDS), RecordingSink::new());
    svc.set_asserted("fault", true, &mut store, &mut leds, &mut sink).unwrap();

    let groups: Vec<_> = svc.groups().collect();
    assert_eq!(groups, [("power", false), ("fault", true), ("chassis_identify", false)]);
}
