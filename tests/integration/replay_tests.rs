//! Startup replay: persisted intent is rebuilt through arbitration.

use crate::mock_hw::{MockStore, RecordingLeds, RecordingSink, journal};

use ledmanager::adapters::group_store::PersistedGroups;
use ledmanager::adapters::sim_led::SimulatedLeds;
use ledmanager::adapters::storage::{FileStorage, MemoryStorage};
use ledmanager::app::events::AppEvent;
use ledmanager::app::ports::GroupStorePort;
use ledmanager::app::service::LedService;
use ledmanager::layout::{Layout, LedAction, LedState};

const BLINK: LedAction = LedAction::Blink { duty_on: 50, period_ms: 1000 };

fn layout() -> Layout {
    Layout::builder()
        .group("g1", [("a", LedAction::On), ("b", BLINK)])
        .group("g2", [("b", LedAction::On), ("c", LedAction::Off)])
        .group("g3", [("c", LedAction::On)])
        .build()
        .unwrap()
}

#[test]
fn restart_rebuilds_the_same_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = RecordingSink::new();

    // First boot: g1 up, g2 up then down.
    let live = {
        let mut store = PersistedGroups::new(FileStorage::new(dir.path()));
        let mut leds = SimulatedLeds::from_layout(&layout());
        let mut svc = LedService::new(layout());
        svc.start(&store, &mut leds, &mut sink);
        svc.set_asserted("g1", true, &mut store, &mut leds, &mut sink).unwrap();
        svc.set_asserted("g2", true, &mut store, &mut leds, &mut sink).unwrap();
        svc.set_asserted("g2", false, &mut store, &mut leds, &mut sink).unwrap();
        assert_eq!(store.load_all().unwrap().get("g2"), Some(false));
        svc.manager().snapshot()
    };

    // Second boot from the same directory, LEDs reset to Off.
    let store = PersistedGroups::new(FileStorage::new(dir.path()));
    let mut leds = SimulatedLeds::from_layout(&layout());
    let mut svc = LedService::new(layout());
    let report = svc.start(&store, &mut leds, &mut sink);

    assert_eq!(report.replayed, ["g1"]);
    assert!(report.skipped.is_empty());
    assert_eq!(svc.manager().snapshot(), live);
    assert_eq!(svc.asserted("g1"), Ok(true));
    assert_eq!(svc.asserted("g2"), Ok(false));
    assert_eq!(leds.state("a"), Some(LedState::On));
    assert_eq!(leds.state("b"), Some(LedState::Blink));
    assert_eq!(leds.state("c"), Some(LedState::Off));
}

#[test]
fn replay_follows_assertion_order() {
    let j = journal();
    let store = MockStore::with(&j, &[("g3", true), ("g2", true), ("g1", true)]);
    let mut leds = RecordingLeds::new(&j, &["a", "b", "c"]);
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut RecordingSink::new());

    assert_eq!(report.replayed, ["g3", "g2", "g1"]);
    let order: Vec<_> = svc
        .manager()
        .asserted_groups()
        .into_iter()
        .map(|g| svc.layout().group(g).name.clone())
        .collect();
    assert_eq!(order, ["g3", "g2", "g1"]);
    // g3's On outranks g2's Off on "c".
    assert_eq!(leds.state("c"), Some(LedState::On));
}

#[test]
fn restart_keeps_the_latest_blink_parameters() {
    let slow = LedAction::Blink { duty_on: 50, period_ms: 500 };
    let fast = LedAction::Blink { duty_on: 20, period_ms: 200 };
    let layout = || {
        Layout::builder()
            .group("a", [("l1", slow)])
            .group("b", [("l1", fast)])
            .build()
            .unwrap()
    };
    let mut sink = RecordingSink::new();

    // "b" first, then "a": the later assertion wins the tie.
    let mut store = PersistedGroups::new(MemoryStorage::new());
    let mut leds = SimulatedLeds::from_layout(&layout());
    let mut live = LedService::new(layout());
    live.start(&store, &mut leds, &mut sink);
    live.set_asserted("b", true, &mut store, &mut leds, &mut sink).unwrap();
    live.set_asserted("a", true, &mut store, &mut leds, &mut sink).unwrap();
    let l1 = live.layout().led_id("l1").unwrap();
    assert_eq!(live.manager().effective(l1), Some(slow));

    let store = PersistedGroups::new(store.storage().clone());
    let mut leds = SimulatedLeds::from_layout(&layout());
    let mut restarted = LedService::new(layout());
    restarted.start(&store, &mut leds, &mut sink);

    assert_eq!(restarted.manager().snapshot(), live.manager().snapshot());
    assert_eq!(restarted.manager().effective(l1), Some(slow));
    let regs = leds.registers("l1").unwrap();
    assert_eq!((regs.state, regs.duty_on, regs.period_ms), (LedState::Blink, 50, 500));
}

#[test]
fn write_only_backend_still_replays() {
    let j = journal();
    let store = MockStore::with(&j, &[("g1", true)]);
    let mut leds = RecordingLeds::new(&j, &["a", "b", "c"]).write_only();
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut RecordingSink::new());

    assert_eq!(report.replayed, ["g1"]);
    assert!(report.skipped.is_empty());
    assert_eq!(leds.state("a"), Some(LedState::On));
    assert_eq!(leds.state("b"), Some(LedState::Blink));
}

#[test]
fn group_with_missing_led_is_skipped() {
    let j = journal();
    let store = MockStore::with(&j, &[("g1", true), ("g3", true)]);
    // "b" is gone from the hardware.
    let mut leds = RecordingLeds::new(&j, &["a", "c"]);
    let mut sink = RecordingSink::new();
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut sink);

    assert_eq!(report.replayed, ["g3"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "g1");
    assert_eq!(svc.asserted("g1"), Ok(false));
    assert_eq!(svc.asserted("g3"), Ok(true));
    // Nothing of g1 was written.
    assert_eq!(leds.state("a"), Some(LedState::Off));
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::ReplaySkipped { group, .. }) if group == "g1"
    ));
}

#[test]
fn unknown_persisted_group_is_skipped() {
    let j = journal();
    let store = MockStore::with(&j, &[("retired", true), ("g3", true)]);
    let mut leds = RecordingLeds::new(&j, &["a", "b", "c"]);
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut RecordingSink::new());

    assert_eq!(report.replayed, ["g3"]);
    assert_eq!(report.skipped[0].0, "retired");
}

#[test]
fn unreadable_record_starts_empty() {
    let j = journal();
    let mut store = MockStore::with(&j, &[("g1", true)]);
    store.corrupt = true;
    let mut leds = RecordingLeds::new(&j, &["a", "b", "c"]);
    let mut sink = RecordingSink::new();
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut sink);

    assert!(report.replayed.is_empty());
    assert_eq!(svc.manager().driven_leds().count(), 0);
    assert!(j.borrow().is_empty());
    assert_eq!(sink.events, [AppEvent::Started {
        groups: 3,
        replayed: 0,
        skipped: 0
    }]);
}

#[test]
fn false_entries_are_not_replayed() {
    let j = journal();
    let store = MockStore::with(&j, &[("g1", false), ("g2", false)]);
    let mut leds = RecordingLeds::new(&j, &["a", "b", "c"]);
    let mut svc = LedService::new(layout());

    let report = svc.start(&store, &mut leds, &mut RecordingSink::new());

    assert!(report.replayed.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(leds.led_writes(), 0);
}
