// Property tests for range-to-CIDR decomposition
//
// Checks the greedy decomposition against a brute-force coverage oracle and
// against inserting the same blocks one CIDR at a time.

use proptest::prelude::*;
use subnettree::{decompose, CidrBlock, SubnetIndex};

/// Blocks covering `key`
fn covering(blocks: &[CidrBlock], key: u32) -> usize {
    blocks.iter().filter(|b| b.contains(key)).count()
}

/// Small ranges anywhere in the address space, including both ends
fn small_range() -> impl Strategy<Value = (u32, u32)> {
    prop_oneof![
        (any::<u32>(), 0u32..2048).prop_map(|(s, len)| (s, s.saturating_add(len))),
        (0u32..2048).prop_map(|len| (u32::MAX - len, u32::MAX)),
        (0u32..2048).prop_map(|len| (0, len)),
    ]
}

/// Arbitrary ordered ranges
fn any_range() -> impl Strategy<Value = (u32, u32)> {
    (any::<u32>(), any::<u32>()).prop_map(|(a, b)| (a.min(b), a.max(b)))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_blocks_tile_range_exactly((start, end) in any_range()) {
        let blocks: Vec<CidrBlock> = decompose(start, end).collect();

        prop_assert!(!blocks.is_empty());
        prop_assert!(blocks.len() <= 62);
        prop_assert_eq!(blocks[0].first(), start);
        prop_assert_eq!(blocks[blocks.len() - 1].last(), end);

        for pair in blocks.windows(2) {
            prop_assert_eq!(u64::from(pair[0].last()) + 1, u64::from(pair[1].first()));
        }

        for block in &blocks {
            // Aligned: no host bits set in the network address
            prop_assert_eq!(block.network & !block.mask(), 0);

            // Maximal: the enclosing block one bit shorter leaves the range
            if block.prefix_len > 0 {
                let parent = CidrBlock::new(block.network, block.prefix_len - 1).unwrap();
                prop_assert!(parent.first() < start || parent.last() > end);
            }
        }
    }

    #[test]
    fn prop_brute_force_coverage((start, end) in small_range()) {
        let blocks: Vec<CidrBlock> = decompose(start, end).collect();

        let lo = start.saturating_sub(16);
        let hi = end.saturating_add(16);
        for key in lo..=hi {
            let expected = usize::from(key >= start && key <= end);
            prop_assert_eq!(covering(&blocks, key), expected, "address {:#x}", key);
        }
    }

    #[test]
    fn prop_range_insert_matches_cidr_inserts(
        (start, end) in small_range(),
        probes in prop::collection::vec(any::<u32>(), 32),
    ) {
        let by_range: SubnetIndex<&str> = SubnetIndex::with_default("none");
        let by_cidr: SubnetIndex<&str> = SubnetIndex::with_default("none");

        // Surrounding network so "outside the range" is observable
        by_range.insert("0.0.0.0/1", "low").unwrap();
        by_cidr.insert("0.0.0.0/1", "low").unwrap();

        by_range.insert_key_range(start, end, "range");
        for block in decompose(start, end) {
            by_cidr.insert(&block.to_string(), "range").unwrap();
        }

        let mut keys = vec![start, end, start.wrapping_sub(1), end.wrapping_add(1)];
        keys.extend(probes);
        keys.extend(probes_inside(start, end));

        for key in keys {
            let inside = key >= start && key <= end;
            let got = by_range.lookup_key(key);
            prop_assert_eq!(got, by_cidr.lookup_key(key));
            if inside {
                prop_assert_eq!(got, Some("range"));
            } else if key < 0x8000_0000 {
                prop_assert_eq!(got, Some("low"));
            } else {
                prop_assert_eq!(got, Some("none"));
            }
        }
    }
}

/// A handful of addresses spread across `[start, end]`
fn probes_inside(start: u32, end: u32) -> Vec<u32> {
    let span = u64::from(end - start);
    (0..=8u64).map(|i| start + (span * i / 8) as u32).collect()
}

#[test]
fn test_single_address_is_one_host_block() {
    for key in [0u32, 1, 0x7F00_0006, u32::MAX] {
        let blocks: Vec<CidrBlock> = decompose(key, key).collect();
        assert_eq!(blocks, vec![CidrBlock::new(key, 32).unwrap()]);
    }
}
