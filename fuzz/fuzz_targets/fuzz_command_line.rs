//! Fuzz target: request line parser
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use ledmanager::app::commands::GroupCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(command) = line.parse::<GroupCommand>() {
        assert!(!command.group().is_empty(), "parser yielded an empty group");
        assert!(!command.group().contains(char::is_whitespace));
    }
});
