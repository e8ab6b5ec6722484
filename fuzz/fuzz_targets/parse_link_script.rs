#![no_main]

use libfuzzer_sys::fuzz_target;
use libshelf_core::extract::parse_link_script;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for input in parse_link_script(&text) {
        assert!(!input.is_empty());
        assert!(!input.contains(char::is_whitespace));
    }
});
