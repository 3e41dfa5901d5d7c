// End-to-end lookups through the public SubnetIndex API

use proptest::prelude::*;
use subnettree::codec::{format_ipv4, parse_ipv4};
use subnettree::{CidrBlock, SubnetIndex, SubnetTreeError};

#[test]
fn test_example_networks() {
    let index: SubnetIndex<&str> = SubnetIndex::new();
    index.set_default_value("Unknown");

    index.insert("8.8.8.0/24", "Google").unwrap();
    index
        .insert_range("127.0.0.0", "127.255.255.255", "localhost")
        .unwrap();
    index.insert("77.219.59.9", "WAP Tele2").unwrap();

    assert_eq!(index.lookup("8.8.8.8").unwrap(), Some("Google"));
    assert_eq!(index.lookup("127.0.0.1").unwrap(), Some("localhost"));
    assert_eq!(index.lookup("77.219.59.9").unwrap(), Some("WAP Tele2"));
    assert_eq!(index.lookup("10.0.0.1").unwrap(), Some("Unknown"));
}

#[test]
fn test_nested_prefixes() {
    let index = SubnetIndex::with_default("X");
    index.insert("127.0.0.0/8", "A").unwrap();
    index.insert_range("127.0.0.0", "127.0.0.255", "B").unwrap();
    index.insert("127.0.0.5/32", "C").unwrap();
    index.insert_range("127.0.0.6", "127.0.0.6", "D").unwrap();
    index.insert("127.0.0.7/32", "E").unwrap();

    assert_eq!(index.default_value(), Some("X"));
    assert_eq!(index.lookup("127.1.2.3").unwrap(), Some("A"));
    assert_eq!(index.lookup("127.0.0.1").unwrap(), Some("B"));
    assert_eq!(index.lookup("127.0.0.5").unwrap(), Some("C"));
    assert_eq!(index.lookup("127.0.0.6").unwrap(), Some("D"));
    assert_eq!(index.lookup("127.0.0.7").unwrap(), Some("E"));
    assert_eq!(index.lookup("126.0.0.1").unwrap(), Some("X"));
    assert_eq!(index.lookup("128.0.0.1").unwrap(), Some("X"));
}

#[test]
fn test_nested_prefixes_reverse_order() {
    // Specific entries first, covering networks last
    let index = SubnetIndex::with_default("X");
    index.insert_range("127.0.0.6", "127.0.0.6", "D").unwrap();
    index.insert_range("127.0.0.0", "127.0.0.255", "B").unwrap();
    index.insert("127.0.0.7", "E").unwrap();
    index.insert("127.0.0.0/8", "A").unwrap();
    index.insert("127.0.0.5/32", "C").unwrap();

    assert_eq!(index.lookup("127.1.2.3").unwrap(), Some("A"));
    assert_eq!(index.lookup("127.0.0.1").unwrap(), Some("B"));
    assert_eq!(index.lookup("127.0.0.5").unwrap(), Some("C"));
    assert_eq!(index.lookup("127.0.0.6").unwrap(), Some("D"));
    assert_eq!(index.lookup("127.0.0.7").unwrap(), Some("E"));
}

#[test]
fn test_cidr_halves() {
    let index: SubnetIndex<u32> = SubnetIndex::new();
    for i in 0..255u32 {
        index.insert(&format!("{}.0.0.0/9", i), i).unwrap();
    }
    for i in 0..255 {
        assert_eq!(index.lookup(&format!("{}.127.0.255", i)).unwrap(), Some(i));
        assert_eq!(index.lookup(&format!("{}.128.0.255", i)).unwrap(), None);
    }
}

#[test]
fn test_range_halves() {
    let index: SubnetIndex<u32> = SubnetIndex::new();
    for i in 0..255u32 {
        let blocks = index
            .insert_range(&format!("{}.0.0.0", i), &format!("{}.127.255.255", i), i)
            .unwrap();
        assert_eq!(blocks, 1);
    }
    for i in 0..255 {
        assert_eq!(index.lookup(&format!("{}.127.0.255", i)).unwrap(), Some(i));
        assert_eq!(index.lookup(&format!("{}.128.0.255", i)).unwrap(), None);
    }
}

#[test]
fn test_override() {
    let index: SubnetIndex<&str> = SubnetIndex::new();
    index.insert("1.2.3.4/32", "foo").unwrap();
    assert_eq!(index.lookup("1.2.3.4").unwrap(), Some("foo"));

    index.insert("1.2.3.4/32", "bar").unwrap();
    assert_eq!(index.lookup("1.2.3.4").unwrap(), Some("bar"));
    assert_eq!(index.stats().prefixes, 1);
}

#[test]
fn test_whole_space() {
    let foo: SubnetIndex<&str> = SubnetIndex::new();
    foo.insert("0.0.0.0/0", "foo").unwrap();
    assert_eq!(foo.lookup("1.2.3.4").unwrap(), Some("foo"));
    assert_eq!(foo.lookup("0.0.0.0").unwrap(), Some("foo"));
    assert_eq!(foo.lookup("255.255.255.255").unwrap(), Some("foo"));

    let bar: SubnetIndex<&str> = SubnetIndex::new();
    assert_eq!(bar.insert_range("0.0.0.0", "255.255.255.255", "bar").unwrap(), 1);
    assert_eq!(bar.lookup("1.2.3.4").unwrap(), Some("bar"));
    assert_eq!(bar.lookup("0.0.0.0").unwrap(), Some("bar"));
    assert_eq!(bar.lookup("255.255.255.255").unwrap(), Some("bar"));
}

#[test]
fn test_illegal_arguments() {
    let index: SubnetIndex<bool> = SubnetIndex::new();
    assert!(matches!(
        index.insert("abc", true),
        Err(SubnetTreeError::InvalidAddress(_))
    ));
    assert!(matches!(
        index.insert("1.2.3.4/x", true),
        Err(SubnetTreeError::InvalidPrefixLength(_))
    ));
    assert_eq!(index.insert("1.2.3.4", None), Err(SubnetTreeError::NullValue));
    assert!(matches!(
        index.lookup("1.2.3.4.5"),
        Err(SubnetTreeError::InvalidAddress(_))
    ));
}

#[test]
fn test_no_default_means_no_value() {
    let index: SubnetIndex<u8> = SubnetIndex::new();
    index.insert("10.0.0.0/8", 1u8).unwrap();
    assert_eq!(index.lookup("11.0.0.0").unwrap(), None);
    assert_eq!(index.lookup("10.255.255.255").unwrap(), Some(1));
}

#[test]
fn test_codec_utils() {
    for text in ["255.128.127.1", "255.255.255.255", "1.127.128.255", "0.0.0.0"] {
        assert_eq!(format_ipv4(parse_ipv4(text).unwrap()), text);
    }
    assert!(matches!(
        parse_ipv4("abc"),
        Err(SubnetTreeError::InvalidAddress(_))
    ));
}

/// Value of the most specific stored block covering `key`, by brute force
fn longest_covering(stored: &[(CidrBlock, u32)], key: u32) -> Option<u32> {
    stored
        .iter()
        .filter(|(block, _)| block.contains(key))
        .max_by_key(|(block, _)| block.prefix_len)
        .map(|&(_, value)| value)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_lookup_returns_longest_covering_prefix(
        prefixes in prop::collection::vec((any::<u32>(), 0u8..=32), 1..40),
        keys in prop::collection::vec(any::<u32>(), 64),
    ) {
        let index: SubnetIndex<u32> = SubnetIndex::new();

        // Later inserts of the same block replace earlier values
        let mut stored: Vec<(CidrBlock, u32)> = Vec::new();
        for (i, &(key, prefix_len)) in prefixes.iter().enumerate() {
            let value = i as u32;
            let block = CidrBlock::new(key, prefix_len).unwrap();
            index.insert_prefix(key, prefix_len, value).unwrap();
            match stored.iter_mut().find(|(b, _)| *b == block) {
                Some(slot) => slot.1 = value,
                None => stored.push((block, value)),
            }
        }

        let mut probes = keys;
        for (block, _) in &stored {
            probes.push(block.first());
            probes.push(block.last());
            probes.push(block.first().wrapping_sub(1));
            probes.push(block.last().wrapping_add(1));
        }

        for key in probes {
            prop_assert_eq!(
                index.lookup_key(key),
                longest_covering(&stored, key),
                "address {}",
                format_ipv4(key)
            );
        }
        prop_assert_eq!(index.stats().prefixes, stored.len());
    }
}
