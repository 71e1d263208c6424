//! Order classes handled by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three disjoint classes of orders in the fulfillment workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum OrderClass {
    /// Orders sitting in a picklist that has not been packed yet.
    InProgress,
    /// Approved orders that have not been picked.
    Open,
    /// Orders picked, or completed and shipped today.
    Completed,
}

impl OrderClass {
    /// All classes, in pipeline order.
    pub const ALL: [OrderClass; 3] = [OrderClass::InProgress, OrderClass::Open, OrderClass::Completed];

    /// Returns the label used in logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderClass::InProgress => "in-progress",
            OrderClass::Open => "open",
            OrderClass::Completed => "completed",
        }
    }

    /// Returns true if this class needs the enrichment fan-out before projection.
    pub fn requires_enrichment(&self) -> bool {
        matches!(self, OrderClass::InProgress)
    }
}

impl fmt::Display for OrderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_in_progress_requires_enrichment() {
        assert!(OrderClass::InProgress.requires_enrichment());
        assert!(!OrderClass::Open.requires_enrichment());
        assert!(!OrderClass::Completed.requires_enrichment());
    }

    #[test]
    fn test_serialization_uses_kebab_case() {
        let json = serde_json::to_string(&OrderClass::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(OrderClass::Completed.to_string(), "completed");
    }
}
