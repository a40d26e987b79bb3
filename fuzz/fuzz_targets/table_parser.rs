#![no_main]

use guardminer::table::{Dialect, Table};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = Table::parse(input, Dialect::Comma, Path::new("fuzz.csv"));
        let _ = Table::parse(input, Dialect::Tab, Path::new("fuzz.csv"));
    }
});
