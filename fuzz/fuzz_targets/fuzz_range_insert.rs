#![no_main]
use libfuzzer_sys::fuzz_target;
use subnettree::{decompose, SubnetIndex};

fuzz_target!(|data: (u32, u32, u32)| {
    let (a, b, probe) = data;
    let (start, end) = (a.min(b), a.max(b));

    let index: SubnetIndex<bool> = SubnetIndex::new();
    let blocks = index.insert_key_range(start, end, true);
    assert_eq!(blocks, decompose(start, end).count());

    let inside = probe >= start && probe <= end;
    assert_eq!(index.lookup_key(probe), inside.then_some(true));
    assert_eq!(index.lookup_key(start), Some(true));
    assert_eq!(index.lookup_key(end), Some(true));
});
