//! Traversal outcome definitions
//!
//! A URL offered to the traversal engine starts out pending, is fetched, and
//! ends in exactly one of these outcomes.
use std::fmt;

/// Terminal or expanding result of offering a URL to the traversal engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOutcome {
    // ===== Expanding State =====
    /// Page was fetched and its admissible links were queued as children
    Expanded,

    // ===== Terminal Skip States =====
    /// URL was already visited earlier in this run
    SkippedVisited,

    /// URL lies beyond the maximum depth
    SkippedDepth,

    /// Fetch produced no content (retries exhausted or error status)
    SkippedEmpty,

    /// Page cap for the run was reached before this URL was fetched
    SkippedLimit,

    /// Run was cancelled or hit its deadline
    Cancelled,
}

impl TraversalOutcome {
    /// Short identifier used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::SkippedVisited => "skipped_visited",
            Self::SkippedDepth => "skipped_depth",
            Self::SkippedEmpty => "skipped_empty",
            Self::SkippedLimit => "skipped_limit",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TraversalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TraversalOutcome::Expanded), "expanded");
        assert_eq!(
            format!("{}", TraversalOutcome::SkippedDepth),
            "skipped_depth"
        );
    }
}
