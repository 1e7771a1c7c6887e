//! Read preferences decide which node serves a read and which query flags
//! accompany it.

mod modes;
mod selection;
mod tag_set;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use docdrive_core::protocol::QueryOptions;
use docdrive_core::{DriverError, Result};

use crate::cluster::{Cluster, Node};

pub use modes::{Nearest, Primary, PrimaryPreferred, Secondary, SecondaryPreferred};
pub use tag_set::TagSet;

/// A policy for routing reads across the cluster.
///
/// Implementations must not retain anything between calls: each
/// `select_node` works from one snapshot of `cluster.nodes()`.
pub trait ReadPreference: Send + Sync + fmt::Debug {
    /// Returns the mode this policy implements.
    fn mode(&self) -> ReadMode;

    /// Selects the node that should serve the read.
    ///
    /// Fails with [`DriverError::NoEligibleNode`] when no node qualifies.
    fn select_node(&self, cluster: &dyn Cluster) -> Result<Arc<dyn Node>>;

    /// Returns `options` adjusted for this policy.
    ///
    /// The result depends only on `options`, never on the selected node.
    fn query_options(&self, options: QueryOptions) -> QueryOptions;
}

/// The built-in read preference modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadMode {
    /// Only the primary.
    #[default]
    Primary,
    /// The primary, else a secondary.
    PrimaryPreferred,
    /// Only secondaries.
    Secondary,
    /// A secondary, else the primary.
    SecondaryPreferred,
    /// The lowest-latency member.
    Nearest,
}

impl ReadMode {
    /// All modes, in declaration order.
    pub const ALL: [ReadMode; 5] = [
        ReadMode::Primary,
        ReadMode::PrimaryPreferred,
        ReadMode::Secondary,
        ReadMode::SecondaryPreferred,
        ReadMode::Nearest,
    ];

    /// Returns the snake_case name of the mode.
    pub fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::PrimaryPreferred => "primary_preferred",
            Self::Secondary => "secondary",
            Self::SecondaryPreferred => "secondary_preferred",
            Self::Nearest => "nearest",
        }
    }

    /// Returns `true` if the mode may read from a secondary.
    pub fn allows_secondary(self) -> bool {
        self != Self::Primary
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the snake_case name as well as the camelCase spelling used in
/// connection strings.
impl FromStr for ReadMode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(Self::Primary),
            "primary_preferred" | "primaryPreferred" => Ok(Self::PrimaryPreferred),
            "secondary" => Ok(Self::Secondary),
            "secondary_preferred" | "secondaryPreferred" => Ok(Self::SecondaryPreferred),
            "nearest" => Ok(Self::Nearest),
            other => Err(DriverError::Configuration(format!(
                "unknown read preference mode '{}'",
                other
            ))),
        }
    }
}

/// Builds the read preference for `mode`, constrained by `tag_sets`.
///
/// Tag sets cannot be combined with [`ReadMode::Primary`].
pub fn read_preference(mode: ReadMode, tag_sets: Vec<TagSet>) -> Result<Arc<dyn ReadPreference>> {
    let preference: Arc<dyn ReadPreference> = match mode {
        ReadMode::Primary if !tag_sets.is_empty() => {
            return Err(DriverError::Configuration(
                "tag sets are not allowed with primary read preference".to_string(),
            ));
        }
        ReadMode::Primary => Arc::new(Primary::new()),
        ReadMode::PrimaryPreferred => Arc::new(PrimaryPreferred::with_tag_sets(tag_sets)),
        ReadMode::Secondary => Arc::new(Secondary::with_tag_sets(tag_sets)),
        ReadMode::SecondaryPreferred => Arc::new(SecondaryPreferred::with_tag_sets(tag_sets)),
        ReadMode::Nearest => Arc::new(Nearest::with_tag_sets(tag_sets)),
    };
    Ok(preference)
}

/// Returns the default read preference (primary).
pub fn default_read_preference() -> Arc<dyn ReadPreference> {
    Arc::new(Primary::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in ReadMode::ALL {
            assert_eq!(mode.name().parse::<ReadMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_parses_camel_case() {
        assert_eq!(
            "secondaryPreferred".parse::<ReadMode>().unwrap(),
            ReadMode::SecondaryPreferred
        );
        assert_eq!(
            "primaryPreferred".parse::<ReadMode>().unwrap(),
            ReadMode::PrimaryPreferred
        );
    }

    #[test]
    fn test_mode_rejects_unknown() {
        assert!(matches!(
            "fastest".parse::<ReadMode>(),
            Err(DriverError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_mode_is_primary() {
        assert_eq!(ReadMode::default(), ReadMode::Primary);
        assert_eq!(default_read_preference().mode(), ReadMode::Primary);
        assert!(!ReadMode::Primary.allows_secondary());
        assert!(ReadMode::Nearest.allows_secondary());
    }

    #[test]
    fn test_factory_builds_each_mode() {
        for mode in ReadMode::ALL {
            assert_eq!(read_preference(mode, Vec::new()).unwrap().mode(), mode);
        }
    }

    #[test]
    fn test_factory_rejects_primary_with_tags() {
        let result = read_preference(ReadMode::Primary, vec![TagSet::new().with("dc", "east")]);
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_read_preference_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ReadPreference>();
        assert_send_sync::<Nearest>();
    }
}
