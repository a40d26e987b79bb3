#![no_main]

use guardminer::probe::VersionCheck;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must never panic; a parsed check must survive a display round trip
        if let Ok(check) = VersionCheck::parse(input) {
            let reparsed = VersionCheck::parse(&check.to_string());
            assert_eq!(reparsed.ok(), Some(check));
        }
    }
});
