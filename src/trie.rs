//! Binary prefix trie over 32-bit keys
//!
//! One node per materialized prefix: depth `d` corresponds to the first `d`
//! bits of the key, bit 0 descends left and bit 1 descends right. A value on
//! a node means a prefix terminates exactly there, so the deepest value seen
//! while walking a key's bits is its longest matching prefix.
//!
//! # Publication invariant
//!
//! Lookups take no lock. Every child slot and value slot is a
//! [`crossbeam_epoch::Atomic`], and slots only ever move forward:
//!
//! - a child slot goes from null to a node exactly once, via a release
//!   compare-exchange of a node that is already fully built (both children
//!   null, no value); readers load it with acquire ordering;
//! - a value slot is swapped to a new boxed value with acq-rel ordering; the
//!   displaced value is retired through the epoch guard, never freed while a
//!   reader may still be cloning it.
//!
//! Nodes are never unlinked, so a reader holding a guard can always
//! dereference what it loaded. Concurrent writers are memory safe, but
//! callers are expected to serialize inserts (see
//! [`SubnetIndex`](crate::SubnetIndex)).

use crate::cidr::CidrBlock;
use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Most significant key bit, consumed first
const TOP_BIT: u32 = 0x8000_0000;

/// A node in the trie
struct Node<V> {
    /// Child for next bit 0
    left: Atomic<Node<V>>,
    /// Child for next bit 1
    right: Atomic<Node<V>>,
    /// Payload if a prefix terminates at this node
    value: Atomic<V>,
}

impl<V> Node<V> {
    fn new_empty() -> Self {
        Self {
            left: Atomic::null(),
            right: Atomic::null(),
            value: Atomic::null(),
        }
    }

    fn child(&self, bit: bool) -> &Atomic<Node<V>> {
        if bit {
            &self.right
        } else {
            &self.left
        }
    }
}

impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no reader can still reach this subtree,
        // and every non-null slot was created from an `Owned` we own.
        unsafe {
            let guard = epoch::unprotected();
            for slot in [&self.left, &self.right] {
                let child = slot.load(Ordering::Relaxed, guard);
                if !child.is_null() {
                    drop(child.into_owned());
                }
            }
            let value = self.value.load(Ordering::Relaxed, guard);
            if !value.is_null() {
                drop(value.into_owned());
            }
        }
    }
}

/// Longest-prefix-match trie mapping CIDR prefixes to values
pub struct PrefixTrie<V> {
    /// Depth 0, prefix length 0; lives as long as the trie
    root: Node<V>,
    node_count: AtomicUsize,
    prefix_count: AtomicUsize,
}

impl<V> PrefixTrie<V> {
    /// Create an empty trie holding only the root node
    pub fn new() -> Self {
        Self {
            root: Node::new_empty(),
            node_count: AtomicUsize::new(1),
            prefix_count: AtomicUsize::new(0),
        }
    }

    /// Number of nodes materialized, including the root
    pub fn node_count(&self) -> usize {
        self.node_count.load(Ordering::Relaxed)
    }

    /// Number of distinct prefixes carrying a value
    pub fn prefix_count(&self) -> usize {
        self.prefix_count.load(Ordering::Relaxed)
    }

    /// True if no prefix has been inserted
    pub fn is_empty(&self) -> bool {
        self.prefix_count() == 0
    }

    /// Return the child of `parent` for `bit`, materializing it if absent
    fn child_or_materialize<'g>(
        &self,
        parent: &'g Node<V>,
        bit: bool,
        guard: &'g Guard,
    ) -> &'g Node<V> {
        let slot = parent.child(bit);
        let existing = slot.load(Ordering::Acquire, guard);
        // SAFETY: nodes are never unlinked while the trie is alive.
        if let Some(child) = unsafe { existing.as_ref() } {
            return child;
        }

        // Fully initialized before it becomes reachable.
        let fresh = Owned::new(Node::new_empty());
        match slot.compare_exchange(
            Shared::null(),
            fresh,
            Ordering::AcqRel,
            Ordering::Acquire,
            guard,
        ) {
            Ok(published) => {
                self.node_count.fetch_add(1, Ordering::Relaxed);
                // SAFETY: just published, never unlinked.
                unsafe { published.deref() }
            }
            // Another writer won; our unpublished node is dropped with the error.
            Err(race) => unsafe { race.current.deref() },
        }
    }
}

impl<V: Send + Sync + 'static> PrefixTrie<V> {
    /// Bind `value` to the prefix formed by the top `prefix_len` bits of `key`
    ///
    /// Bits of `key` below the prefix are ignored. Re-inserting the same
    /// prefix replaces its value. Returns true if a value was replaced.
    ///
    /// `prefix_len` must be at most 32; longer lengths are clamped to 32.
    pub fn insert(&self, key: u32, prefix_len: u8, value: V) -> bool {
        debug_assert!(prefix_len <= 32, "prefix length {} exceeds 32", prefix_len);
        let depth = prefix_len.min(32);
        let guard = &epoch::pin();

        let mut node = &self.root;
        for i in 0..depth {
            let bit = key & (TOP_BIT >> i) != 0;
            node = self.child_or_materialize(node, bit, guard);
        }

        let old = node.value.swap(Owned::new(value), Ordering::AcqRel, guard);
        if old.is_null() {
            self.prefix_count.fetch_add(1, Ordering::Relaxed);
            false
        } else {
            // SAFETY: `old` is unreachable now; readers pinned before the
            // swap keep it alive until their guards drop.
            unsafe { guard.defer_destroy(old) };
            true
        }
    }
}

impl<V: Clone> PrefixTrie<V> {
    /// Value of the longest prefix covering `key`, if any
    pub fn lookup(&self, key: u32) -> Option<V> {
        self.lookup_match(key).map(|(_, value)| value)
    }

    /// Longest prefix covering `key` as (prefix length, value)
    pub fn lookup_match(&self, key: u32) -> Option<(u8, V)> {
        let guard = &epoch::pin();
        let mut node = &self.root;
        let mut depth: u8 = 0;
        let mut best: Option<(u8, &V)> = None;

        loop {
            // SAFETY: values are retired through the epoch, so anything loaded
            // under `guard` stays valid until it drops.
            if let Some(value) = unsafe { node.value.load(Ordering::Acquire, guard).as_ref() } {
                best = Some((depth, value));
            }
            if depth == 32 {
                break;
            }

            let bit = key & (TOP_BIT >> depth) != 0;
            // SAFETY: nodes are never unlinked while the trie is alive.
            match unsafe { node.child(bit).load(Ordering::Acquire, guard).as_ref() } {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => break,
            }
        }

        best.map(|(prefix_len, value)| (prefix_len, value.clone()))
    }

    /// Every stored prefix with its value, in address order
    pub fn entries(&self) -> Vec<(CidrBlock, V)> {
        let guard = &epoch::pin();
        let mut out = Vec::new();
        let mut stack: Vec<(&Node<V>, u32, u8)> = vec![(&self.root, 0, 0)];

        while let Some((node, network, depth)) = stack.pop() {
            // SAFETY: see `lookup_match`.
            if let Some(value) = unsafe { node.value.load(Ordering::Acquire, guard).as_ref() } {
                out.push((
                    CidrBlock {
                        network,
                        prefix_len: depth,
                    },
                    value.clone(),
                ));
            }
            if depth == 32 {
                continue;
            }

            // Push right first so the left subtree pops first
            for bit in [true, false] {
                let child = node.child(bit).load(Ordering::Acquire, guard);
                // SAFETY: nodes are never unlinked while the trie is alive.
                if let Some(child) = unsafe { child.as_ref() } {
                    let network = if bit { network | (TOP_BIT >> depth) } else { network };
                    stack.push((child, network, depth + 1));
                }
            }
        }

        out
    }
}

impl<V> Default for PrefixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for PrefixTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixTrie")
            .field("nodes", &self.node_count())
            .field("prefixes", &self.prefix_count())
            .finish()
    }
}
