//! Model-backed selection adapters
//!
//! The language model itself is an opaque collaborator: anything that turns a
//! system prompt and a user prompt into a text reply. Replies are expected to
//! be JSON; a reply that does not parse is retried up to a fixed number of
//! attempts before failing with [`SelectError::ParseFailure`].

use crate::select::{ContactContext, ContactSelector, SelectError, TeamPageRanker, NO_CONTACT};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Attempts made before a reply is considered unparseable
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Generic text-completion capability
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Completes `prompt` under `system` and returns the raw reply text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, SelectError>;
}

/// Asks the model until its reply parses as `T`
///
/// Transport failures are returned immediately; only unparseable replies are
/// retried.
async fn complete_json<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    system: &str,
    prompt: &str,
    max_attempts: usize,
) -> Result<T, SelectError> {
    let attempts = max_attempts.max(1);

    for attempt in 1..=attempts {
        let reply = model.complete(system, prompt).await?;
        match serde_json::from_str::<T>(strip_code_fence(&reply)) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                tracing::warn!(
                    "Unparseable model reply (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                );
            }
        }
    }

    Err(SelectError::ParseFailure { attempts })
}

/// Removes the markdown code fence some models wrap around JSON
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Debug, Deserialize)]
struct BestEmailReply {
    best_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamPagesReply {
    #[serde(default)]
    team_pages: Vec<String>,
}

/// Contact selection delegated to a language model
pub struct ModelContactSelector {
    model: Arc<dyn LanguageModel>,
    max_attempts: usize,
}

impl ModelContactSelector {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn build_prompt(candidates: &[String], context: &ContactContext) -> String {
        format!(
            "Select the most appropriate email address for contacting this business.\n\n\
             Name: {}\n\
             Email(s): {}\n\
             Website: {}\n\
             Address: {}\n\n\
             Guidelines:\n\
             - Prefer manager, director or gm addresses, then reception, info or the business name, \
             then sales, marketing or operations.\n\
             - For chains, prefer the address specific to this location.\n\
             - Avoid privacy, accessibility and single-department addresses unless they are the only option.\n\
             - Avoid personal addresses unless no other option exists.\n\
             - If no address is suitable, answer \"{NO_CONTACT}\".\n\
             - Never make up an address. Only select from the list above.\n\n\
             Respond with JSON: {{\"best_email\": \"...\"}}",
            context.name.as_deref().unwrap_or(NO_CONTACT),
            candidates.join(", "),
            context.url.as_deref().unwrap_or(NO_CONTACT),
            context.address.as_deref().unwrap_or(NO_CONTACT),
        )
    }
}

#[async_trait]
impl ContactSelector for ModelContactSelector {
    async fn select_best_contact(
        &self,
        candidates: &[String],
        context: &ContactContext,
    ) -> Result<Option<String>, SelectError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let reply: BestEmailReply = complete_json(
            self.model.as_ref(),
            "You pick the most appropriate contact email for a business. You return only JSON.",
            &Self::build_prompt(candidates, context),
            self.max_attempts,
        )
        .await?;

        let Some(chosen) = reply.best_email.map(|e| e.trim().to_lowercase()) else {
            return Ok(None);
        };

        // A reply outside the candidate list is treated as "none suitable"
        let found = candidates
            .iter()
            .find(|c| c.trim().to_lowercase() == chosen)
            .cloned();
        if found.is_none() && chosen != NO_CONTACT.to_lowercase() {
            tracing::warn!("Model proposed an address not among the candidates: {}", chosen);
        }

        Ok(found)
    }
}

/// Team page ranking delegated to a language model
pub struct ModelTeamPageRanker {
    model: Arc<dyn LanguageModel>,
    max_attempts: usize,
}

impl ModelTeamPageRanker {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

#[async_trait]
impl TeamPageRanker for ModelTeamPageRanker {
    async fn rank_team_pages(
        &self,
        candidates: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SelectError> {
        if candidates.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let prompt = format!(
            "Select the best {limit} URLs for team pages from this list:\n{}\n\n\
             A team page is a page which likely contains information about the team \
             and contact information such as an email address.\n\n\
             Respond with JSON: {{\"team_pages\": [\"...\"]}}",
            candidates.join("\n"),
        );

        let reply: TeamPagesReply = complete_json(
            self.model.as_ref(),
            "You are an expert at analyzing URLs to find the best team pages. You return only JSON.",
            &prompt,
            self.max_attempts,
        )
        .await?;

        let mut shortlist: Vec<String> = Vec::new();
        for page in reply.team_pages {
            let page = page.trim();
            if let Some(candidate) = candidates.iter().find(|c| c.as_str() == page) {
                if !shortlist.contains(candidate) {
                    shortlist.push(candidate.clone());
                }
            }
            if shortlist.len() == limit {
                break;
            }
        }

        Ok(shortlist)
    }
}
