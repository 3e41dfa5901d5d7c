#![no_main]
use libfuzzer_sys::fuzz_target;
use subnettree::codec::{format_ipv4, parse_cidr, parse_ipv4};
use subnettree::SubnetIndex;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must format back to a canonical address
        if let Ok(key) = parse_ipv4(s) {
            let text = format_ipv4(key);
            assert_eq!(parse_ipv4(&text), Ok(key));
        }

        if let Ok((_, prefix_len)) = parse_cidr(s) {
            assert!(prefix_len <= 32);
        }

        let index = SubnetIndex::with_default(0u8);
        let _ = index.insert("10.0.0.0/8", 1);
        if let Ok(value) = index.lookup(s) {
            assert!(value.is_some());
        }
    }
});
