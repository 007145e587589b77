//! Shared value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A database/collection pair addressing one collection on the cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Counts reported by the driver for an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Documents selected by the filter, whether or not they changed
    pub matched: u64,
    /// Documents whose contents actually changed
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn new(matched: u64, modified: u64) -> Self {
        Self { matched, modified }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_namespace_display() {
        let ns = Namespace::new("shop", "orders");
        assert_eq!(ns.to_string(), "shop.orders");
    }

    #[test]
    fn test_update_outcome_new() {
        let outcome = UpdateOutcome::new(4, 0);
        assert_eq!(outcome.matched, 4);
        assert_eq!(outcome.modified, 0);
    }
}
