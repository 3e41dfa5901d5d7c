#![no_main]
use libfuzzer_sys::fuzz_target;
use subnettree::Entry;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(entry) = s.parse::<Entry>() {
            // Display output is itself a valid entry
            let again: Entry = entry.to_string().parse().unwrap();
            assert_eq!(again, entry);
            assert!(entry.blocks().count() >= 1);
        }
    }
});
