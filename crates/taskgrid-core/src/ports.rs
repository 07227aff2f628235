//! Port range wants.
//!
//! Class definitions declare the ports they want as a comma-separated list
//! of closed `begin:end` ranges, e.g. `"3000:3002,4000:4000"`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest valid port number.
const MAX_PORT: u64 = u16::MAX as u64;

/// A closed range of ports, `begin..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub begin: u64,
    pub end: u64,
}

impl PortRange {
    /// Number of ports in the range.
    pub fn count(&self) -> u64 {
        self.end.saturating_sub(self.begin).saturating_add(1)
    }

    pub fn contains(&self, port: u64) -> bool {
        (self.begin..=self.end).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin, self.end)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePortsError {
    #[error("port range {0:?} is not of the form begin:end")]
    Malformed(String),
    #[error("invalid port number {0:?}")]
    InvalidPort(String),
    #[error("port range {0} ends before it begins")]
    Inverted(String),
}

/// A set of port ranges.
///
/// Equality is set equality: the order in which ranges were declared and
/// repeated entries do not matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranges(Vec<PortRange>);

impl Ranges {
    pub fn new(ranges: Vec<PortRange>) -> Self {
        Self(ranges)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortRange> {
        self.0.iter()
    }

    /// Total number of ports covered by all ranges.
    pub fn port_count(&self) -> u64 {
        self.normalized().iter().map(PortRange::count).sum()
    }

    fn normalized(&self) -> Vec<PortRange> {
        let mut sorted = self.0.clone();
        sorted.sort();
        sorted.dedup();
        sorted
    }
}

impl PartialEq for Ranges {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Ranges {}

impl fmt::Display for Ranges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

/// Parse a `begin:end[,begin:end...]` port list.
///
/// An empty or whitespace-only input yields no ranges.
pub fn parse_port_ranges(input: &str) -> Result<Ranges, ParsePortsError> {
    let mut ranges = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (begin, end) = part
            .split_once(':')
            .ok_or_else(|| ParsePortsError::Malformed(part.to_string()))?;
        let begin = parse_port(begin)?;
        let end = parse_port(end)?;
        if end < begin {
            return Err(ParsePortsError::Inverted(part.to_string()));
        }
        ranges.push(PortRange { begin, end });
    }
    Ok(Ranges(ranges))
}

fn parse_port(raw: &str) -> Result<u64, ParsePortsError> {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(port) if port <= MAX_PORT => Ok(port),
        _ => Err(ParsePortsError::InvalidPort(raw.to_string())),
    }
}
