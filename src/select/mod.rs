//! Selection collaborators
//!
//! A crawl produces candidates (emails, page URLs); picking among them is
//! delegated to the traits in this module. Implementations only ever return
//! values taken from the candidate list they were given.
//!
//! - [`KeywordContactSelector`] / [`KeywordTeamPageRanker`]: deterministic
//!   keyword heuristics, used by default
//! - [`ModelContactSelector`] / [`ModelTeamPageRanker`]: adapters over an
//!   opaque [`LanguageModel`] that parse its JSON replies with a bounded retry

mod heuristic;
mod model;

pub use heuristic::{KeywordContactSelector, KeywordTeamPageRanker};
pub use model::{LanguageModel, ModelContactSelector, ModelTeamPageRanker, DEFAULT_MAX_ATTEMPTS};

use async_trait::async_trait;
use thiserror::Error;

/// Output value written when no candidate is suitable
pub const NO_CONTACT: &str = "N/A";

/// Errors raised by selection collaborators
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("Model reply could not be parsed after {attempts} attempts")]
    ParseFailure { attempts: usize },

    #[error("Model request failed: {0}")]
    Model(String),
}

/// What is known about the business a row describes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactContext {
    /// Business name
    pub name: Option<String>,

    /// Postal address
    pub address: Option<String>,

    /// Website the candidates were harvested from
    pub url: Option<String>,
}

/// Picks the single best contact address from a candidate list
#[async_trait]
pub trait ContactSelector: Send + Sync {
    /// Returns one of `candidates`, or None when none is suitable
    async fn select_best_contact(
        &self,
        candidates: &[String],
        context: &ContactContext,
    ) -> Result<Option<String>, SelectError>;
}

/// Shortlists the URLs most likely to be team pages
#[async_trait]
pub trait TeamPageRanker: Send + Sync {
    /// Returns at most `limit` entries of `candidates`, best first
    async fn rank_team_pages(
        &self,
        candidates: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SelectError>;
}
