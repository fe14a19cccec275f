//! Crawl lifecycle phases
//!
//! This module defines the states a coordinator moves through during a run.

use std::fmt;

/// Represents the lifecycle phase of a crawl
///
/// ```text
/// Idle ──start──▶ Running ──frontier empty──────────────▶ Stopped
///                    │                                       ▲
///                    └──stop signal──▶ Stopping ──cycle done─┘
/// ```
///
/// `Idle` may also go straight to `Stopped` when a stop is requested before the
/// crawl starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Constructed; visited set and frontier not populated yet
    Idle,

    /// Draining the frontier
    Running,

    /// A stop was requested; the in-flight cycle is finishing
    Stopping,

    /// Terminal
    Stopped,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Stopped)
                | (Self::Running, Self::Stopping)
                | (Self::Running, Self::Stopped)
                | (Self::Stopping, Self::Stopped)
        )
    }

    /// Returns true once the crawl can do no more work
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns the lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::Running));
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::Stopped));
        assert!(CrawlPhase::Running.can_transition_to(CrawlPhase::Stopping));
        assert!(CrawlPhase::Running.can_transition_to(CrawlPhase::Stopped));
        assert!(CrawlPhase::Stopping.can_transition_to(CrawlPhase::Stopped));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlPhase::Stopped.can_transition_to(CrawlPhase::Running));
        assert!(!CrawlPhase::Stopped.can_transition_to(CrawlPhase::Idle));
        assert!(!CrawlPhase::Stopping.can_transition_to(CrawlPhase::Running));
        assert!(!CrawlPhase::Running.can_transition_to(CrawlPhase::Idle));
        assert!(!CrawlPhase::Idle.can_transition_to(CrawlPhase::Stopping));
    }

    #[test]
    fn test_only_stopped_is_terminal() {
        assert!(CrawlPhase::Stopped.is_terminal());
        assert!(!CrawlPhase::Idle.is_terminal());
        assert!(!CrawlPhase::Running.is_terminal());
        assert!(!CrawlPhase::Stopping.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::Stopping.to_string(), "stopping");
    }
}
