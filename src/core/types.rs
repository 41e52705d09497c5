use serde::{Deserialize, Serialize};

/// Name of the bucket (and output file stem) for reads that match no sample
pub const UNASSIGNED: &str = "unassigned";

/// Why a read was routed to the unassigned bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// No sample matched within the mismatch threshold
    NoMatch,
    /// Two or more samples tied at the best distance
    Ambiguous,
}

impl std::fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no match"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// Where a read ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// Index into the resolved sample list
    Sample(usize),
    Unassigned(UnassignedReason),
}

impl AssignmentOutcome {
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Sample(_))
    }

    #[must_use]
    pub fn sample_index(&self) -> Option<usize> {
        match self {
            Self::Sample(index) => Some(*index),
            Self::Unassigned(_) => None,
        }
    }
}

/// Result of matching one read (or read pair) against the samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Header of the forward read
    pub read_id: String,

    pub outcome: AssignmentOutcome,

    /// Best combined mismatch distance seen, if any sample was within the threshold.
    /// Recorded for ambiguous reads too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,

    /// Length of the matched forward barcode (and reverse, when paired)
    #[serde(skip)]
    pub matched_lengths: Option<(usize, Option<usize>)>,
}

impl Assignment {
    pub fn assigned(
        read_id: impl Into<String>,
        sample: usize,
        distance: usize,
        matched_lengths: (usize, Option<usize>),
    ) -> Self {
        Self {
            read_id: read_id.into(),
            outcome: AssignmentOutcome::Sample(sample),
            distance: Some(distance),
            matched_lengths: Some(matched_lengths),
        }
    }

    pub fn unassigned(
        read_id: impl Into<String>,
        reason: UnassignedReason,
        distance: Option<usize>,
    ) -> Self {
        Self {
            read_id: read_id.into(),
            outcome: AssignmentOutcome::Unassigned(reason),
            distance,
            matched_lengths: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let assigned = Assignment::assigned("r1", 3, 1, (4, None));
        assert!(assigned.outcome.is_assigned());
        assert_eq!(assigned.outcome.sample_index(), Some(3));

        let unassigned = Assignment::unassigned("r2", UnassignedReason::Ambiguous, Some(1));
        assert!(!unassigned.outcome.is_assigned());
        assert_eq!(unassigned.outcome.sample_index(), None);
        assert_eq!(unassigned.distance, Some(1));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&AssignmentOutcome::Unassigned(
            UnassignedReason::NoMatch,
        ))
        .unwrap();
        assert_eq!(json, r#"{"unassigned":"no_match"}"#);
    }
}
