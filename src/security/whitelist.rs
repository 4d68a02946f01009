//! Address whitelist.
//!
//! # Responsibilities
//! - Hold the literal addresses and CIDR ranges loaded at startup
//! - Answer membership queries for a claimed client address
//!
//! # Design Decisions
//! - Entries are parsed once at construction, declared order is kept
//! - Entries without '/' are compared as plain strings, never parsed
//! - A range entry that fails to parse is inert: it never matches and never errors
//! - Immutable after construction; shared across handlers via `Arc`

use std::net::IpAddr;

use ipnet::IpNet;

const RANGE_DELIMITER: char = '/';

/// A single whitelist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistEntry {
    /// Matched by exact string equality.
    Literal(String),
    /// Matched by prefix containment.
    Range(IpNet),
    /// A range entry that could not be parsed. Never matches.
    Malformed(String),
}

impl WhitelistEntry {
    /// Classify a raw entry.
    pub fn parse(raw: &str) -> Self {
        if !raw.contains(RANGE_DELIMITER) {
            return Self::Literal(raw.to_string());
        }
        match raw.parse::<IpNet>() {
            Ok(net) => Self::Range(net),
            Err(_) => Self::Malformed(raw.to_string()),
        }
    }

    /// Returns true if the candidate is covered by this entry.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(addr) => addr == candidate,
            // IPv4-mapped IPv6 candidates also match IPv4 ranges.
            Self::Range(net) => candidate
                .parse::<IpAddr>()
                .map(|ip| net.contains(&ip) || net.contains(&ip.to_canonical()))
                .unwrap_or(false),
            Self::Malformed(_) => false,
        }
    }
}

/// The set of permitted client addresses.
#[derive(Debug, Clone, Default)]
pub struct AddressSet {
    entries: Vec<WhitelistEntry>,
}

impl AddressSet {
    /// Build the set from raw entries, keeping their order.
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = raw
            .into_iter()
            .map(|entry| WhitelistEntry::parse(entry.as_ref()))
            .collect();
        Self { entries }
    }

    /// Returns true if any entry admits the candidate.
    pub fn is_allowed(&self, candidate: &str) -> bool {
        self.first_match(candidate).is_some()
    }

    /// Index of the first entry, in declared order, that admits the candidate.
    pub fn first_match(&self, candidate: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.matches(candidate))
    }

    /// Raw text of range entries that failed to parse.
    pub fn malformed_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            WhitelistEntry::Malformed(raw) => Some(raw.as_str()),
            _ => None,
        })
    }

    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
