//! Replica-set tag filters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use docdrive_core::DriverError;

use crate::cluster::NodeInfo;

/// A set of tag constraints a node must carry to be eligible.
///
/// An empty set matches every node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeMap<String, String>,
}

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, returning the set.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds a constraint, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Returns `true` if every constraint is satisfied by the node's tags.
    pub fn matches(&self, node: &NodeInfo) -> bool {
        self.tags
            .iter()
            .all(|(key, value)| node.tags.get(key) == Some(value))
    }

    /// Returns the number of constraints.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the set has no constraints.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates over the constraints in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Parses `key:value` pairs separated by commas, e.g. `dc:east,rack:2`.
///
/// The empty string parses to the empty (match-all) set.
impl FromStr for TagSet {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once(':').ok_or_else(|| {
                DriverError::Configuration(format!("invalid tag '{}', expected key:value", pair))
            })?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(DriverError::Configuration(format!(
                    "invalid tag '{}', empty key",
                    pair
                )));
            }
            set.insert(key, value);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::NodeRole;
    use std::net::SocketAddr;

    fn info() -> NodeInfo {
        let addr = SocketAddr::from(([127, 0, 0, 1], 27017));
        NodeInfo::new(addr, NodeRole::Secondary)
            .with_tag("dc", "east")
            .with_tag("rack", "2")
    }

    #[test]
    fn test_empty_set_matches_everything() {
        assert!(TagSet::new().matches(&info()));
    }

    #[test]
    fn test_subset_matches() {
        assert!(TagSet::new().with("dc", "east").matches(&info()));
        assert!(TagSet::new()
            .with("dc", "east")
            .with("rack", "2")
            .matches(&info()));
    }

    #[test]
    fn test_mismatch_or_missing_tag() {
        assert!(!TagSet::new().with("dc", "west").matches(&info()));
        assert!(!TagSet::new().with("disk", "ssd").matches(&info()));
    }

    #[test]
    fn test_parse() {
        let set: TagSet = "dc:east, rack:2".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "dc:east,rack:2");

        let empty: TagSet = "".parse().unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_pairs() {
        assert!(matches!(
            "dc".parse::<TagSet>(),
            Err(DriverError::Configuration(_))
        ));
        assert!(matches!(
            ":east".parse::<TagSet>(),
            Err(DriverError::Configuration(_))
        ));
    }

    #[test]
    fn test_collect() {
        let set: TagSet = [("dc", "east")].into_iter().collect();
        assert!(set.matches(&info()));
    }
}
