//! Address-family partitioning of range prefixes
//!
//! A range block's prefix list is split into consecutive, size-bounded
//! chunks, separately for each address family. Each chunk later becomes
//! exactly one managed prefix list.
//!
//! ## Family detection
//!
//! Family is decided from the prefix text alone:
//! - contains `:` → IPv6
//! - otherwise contains `.` → IPv4
//! - neither → dropped from every partition
//!
//! A colon always wins, so an IPv4-mapped IPv6 prefix such as
//! `::ffff:10.0.0.0/104` lands in the IPv6 partition only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Address family of a prefix or prefix list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4 prefixes (dotted quad)
    IPv4,
    /// IPv6 prefixes (colon separated)
    IPv6,
}

impl AddressFamily {
    /// Families in processing order (IPv4 before IPv6)
    pub const ALL: [AddressFamily; 2] = [AddressFamily::IPv4, AddressFamily::IPv6];

    /// Detect the family of a prefix string by its syntactic form
    ///
    /// Returns `None` for strings containing neither `:` nor `.`.
    pub fn detect(prefix: &str) -> Option<Self> {
        if prefix.contains(':') {
            Some(AddressFamily::IPv6)
        } else if prefix.contains('.') {
            Some(AddressFamily::IPv4)
        } else {
            None
        }
    }

    /// Token used in derived prefix list names
    pub fn token(self) -> &'static str {
        match self {
            AddressFamily::IPv4 => "ipv4",
            AddressFamily::IPv6 => "ipv6",
        }
    }

    /// Value the cloud provider expects for this family
    pub fn as_provider_str(self) -> &'static str {
        match self {
            AddressFamily::IPv4 => "IPv4",
            AddressFamily::IPv6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_provider_str())
    }
}

/// One prefix list entry
///
/// The description always mirrors the CIDR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// CIDR block, verbatim from the upstream dataset
    pub cidr: String,
    /// Human readable description (same as `cidr`)
    pub description: String,
}

impl Entry {
    /// Build an entry from a prefix string
    pub fn from_prefix(prefix: impl Into<String>) -> Self {
        let cidr = prefix.into();
        Self {
            description: cidr.clone(),
            cidr,
        }
    }
}

/// A size-bounded, ordered slice of entries for one address family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Family of every entry in this chunk
    pub family: AddressFamily,
    /// 1-based position among the chunks of the same (range, family) group
    pub index: usize,
    /// Entries in upstream order
    pub entries: Vec<Entry>,
}

impl Chunk {
    /// Number of entries in the chunk
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chunk holds no entries (never true for partition output)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `prefixes` into chunks of at most `max_entries` entries for `family`
///
/// Prefixes of the other family, and prefixes with no detectable family,
/// are skipped. Order is preserved. An input with no matching prefixes
/// yields no chunks at all rather than one empty chunk.
///
/// # Parameters
///
/// - `prefixes`: Address prefixes in upstream order
/// - `family`: Family to keep
/// - `max_entries`: Upper bound on entries per chunk
pub fn partition<S: AsRef<str>>(
    prefixes: &[S],
    family: AddressFamily,
    max_entries: NonZeroUsize,
) -> Vec<Chunk> {
    let entries: Vec<Entry> = prefixes
        .iter()
        .map(AsRef::as_ref)
        .filter(|prefix| AddressFamily::detect(prefix) == Some(family))
        .map(Entry::from_prefix)
        .collect();

    entries
        .chunks(max_entries.get())
        .enumerate()
        .map(|(i, slice)| Chunk {
            family,
            index: i + 1,
            entries: slice.to_vec(),
        })
        .collect()
}
