/// Crawl phase definitions for one site crawl
///
/// A site crawl moves through `Seeded → Fetching → (Extracting → Fetching)* → Done`.
/// A failed fetch goes straight back to `Fetching` for the next URL.
use crate::HarvestError;
use std::fmt;

/// Represents the current phase of a site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Frontier has been seeded, nothing fetched yet
    Seeded,

    /// A page is being fetched
    Fetching,

    /// A fetched page is being mined for emails and links
    Extracting,

    /// The frontier is exhausted or the page budget is spent
    Done,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeded, Self::Fetching)
                | (Self::Seeded, Self::Done)
                | (Self::Fetching, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Done)
                | (Self::Extracting, Self::Fetching)
                | (Self::Extracting, Self::Done)
        )
    }

    /// Moves to the next phase, rejecting transitions the crawl loop never makes
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, HarvestError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(HarvestError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns the lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
