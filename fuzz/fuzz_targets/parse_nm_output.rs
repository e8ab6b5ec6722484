#![no_main]

use libfuzzer_sys::fuzz_target;
use libshelf_core::extract::parse_nm_output;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let table = parse_nm_output(&text);
    for symbol in &table.undefined {
        assert!(!table.defined.contains(symbol), "{symbol} both defined and undefined");
    }
});
