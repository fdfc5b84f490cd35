//! Fuzz target: `Layout::from_json`
//!
//! Any accepted layout must satisfy the builder's invariants: unique
//! group names, no LED listed twice in one group, duty cycles in range.
//!
//! cargo fuzz run fuzz_layout_json

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use ledmanager::layout::{Layout, LedAction};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(layout) = Layout::from_json(text) else {
        return;
    };

    let mut names = HashSet::new();
    for (id, group) in layout.groups() {
        assert!(names.insert(group.name.clone()), "duplicate group accepted");
        assert_eq!(layout.group_id(&group.name), Some(id));

        let mut leds = HashSet::new();
        for req in &group.requirements {
            assert!(leds.insert(req.led), "LED listed twice in one group");
            if let LedAction::Blink { duty_on, .. } = req.action {
                assert!(duty_on <= 100);
            }
        }
    }
});
