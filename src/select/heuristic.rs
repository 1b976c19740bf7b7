use crate::select::{ContactContext, ContactSelector, SelectError, TeamPageRanker};
use async_trait::async_trait;
use std::collections::HashSet;
use url::Url;

/// Local-part keywords of role addresses, strongest first
const LEADERSHIP_KEYWORDS: &[&str] = &["manager", "director", "direktion", "geschaeftsfuehrung", "management"];
const FRONT_DESK_KEYWORDS: &[&str] = &["reception", "rezeption", "info", "kontakt", "contact", "office", "hello"];
const DEPARTMENT_KEYWORDS: &[&str] = &["sales", "marketing", "operations", "verkauf", "reservation", "booking", "owner"];

/// Addresses only chosen when nothing else is available
const AVOID_KEYWORDS: &[&str] = &[
    "privacy",
    "datenschutz",
    "accessibility",
    "dpo",
    "gdpr",
    "dsgvo",
    "housekeeping",
    "restaurant",
    "applicant",
    "career",
    "jobs",
    "webmaster",
];

/// Addresses that are never a contact
const UNREACHABLE_PREFIXES: &[&str] = &["noreply", "no-reply", "donotreply", "do-not-reply", "mailer-daemon"];

/// Name words too generic to identify one business
const GENERIC_NAME_WORDS: &[&str] = &["hotel", "gasthof", "gasthaus", "pension", "restaurant", "gmbh", "germany"];

/// Picks a contact address by keyword tiers
///
/// Role addresses beat personal ones, addresses on the website's own domain
/// beat foreign ones, and privacy/accessibility desks are a last resort.
/// Ties go to the earlier candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordContactSelector;

impl KeywordContactSelector {
    /// Scores one address; None means it must never be chosen
    fn score(email: &str, site_host: Option<&str>, name_words: &[String]) -> Option<i32> {
        let email = email.to_lowercase();
        let (local, domain) = email.split_once('@')?;

        if UNREACHABLE_PREFIXES.iter().any(|p| local.starts_with(p)) {
            return None;
        }

        let tokens: Vec<&str> = local
            .split(|c: char| matches!(c, '.' | '-' | '_' | '+'))
            .filter(|t| !t.is_empty())
            .collect();

        let mut score = 0;

        if LEADERSHIP_KEYWORDS.iter().any(|k| local.contains(k)) || tokens.contains(&"gm") {
            score += 30;
        } else if FRONT_DESK_KEYWORDS.iter().any(|k| local.contains(k))
            || name_words.iter().any(|w| local.contains(w.as_str()))
        {
            score += 20;
        } else if DEPARTMENT_KEYWORDS.iter().any(|k| local.contains(k)) {
            score += 10;
        } else if tokens.len() >= 2 && tokens.iter().all(|t| t.chars().all(char::is_alphabetic)) {
            // looks like firstname.lastname
            score -= 5;
        }

        if AVOID_KEYWORDS.iter().any(|k| local.contains(k)) {
            score -= 40;
        }

        if let Some(host) = site_host {
            let domain = domain.strip_prefix("www.").unwrap_or(domain);
            if domain == host
                || host.ends_with(&format!(".{}", domain))
                || domain.ends_with(&format!(".{}", host))
            {
                score += 5;
            }
        }

        Some(score)
    }
}

#[async_trait]
impl ContactSelector for KeywordContactSelector {
    async fn select_best_contact(
        &self,
        candidates: &[String],
        context: &ContactContext,
    ) -> Result<Option<String>, SelectError> {
        let site_host = context
            .url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()));

        let name_words: Vec<String> = context
            .name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 4 && !GENERIC_NAME_WORDS.contains(w))
            .map(str::to_string)
            .collect();

        let mut best: Option<(i32, &String)> = None;
        for candidate in candidates {
            let Some(score) = Self::score(candidate, site_host.as_deref(), &name_words) else {
                continue;
            };
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }

        Ok(best.map(|(_, email)| email.clone()))
    }
}

/// Path keywords of team pages, with their weight
const TEAM_PAGE_KEYWORDS: &[(&str, u32)] = &[
    ("team", 3),
    ("staff", 3),
    ("mitarbeiter", 3),
    ("people", 3),
    ("ansprechpartner", 3),
    ("management", 2),
    ("about", 2),
    ("ueber-uns", 2),
    ("uber-uns", 2),
    ("%c3%bcber-uns", 2),
    ("who-we-are", 2),
    ("contact", 1),
    ("kontakt", 1),
    ("impressum", 1),
];

/// File types that are never team pages
const NON_PAGE_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".xml"];

/// Shortlists team pages by keywords in their path
///
/// Only URLs matching at least one keyword are returned; ties keep the
/// candidate order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTeamPageRanker;

impl KeywordTeamPageRanker {
    fn score(candidate: &str) -> u32 {
        let path = Url::parse(candidate)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| candidate.to_lowercase());

        if NON_PAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return 0;
        }

        TEAM_PAGE_KEYWORDS
            .iter()
            .filter(|(keyword, _)| path.contains(keyword))
            .map(|(_, weight)| weight)
            .sum()
    }

    /// Synchronous ranking, also used as the fallback of model rankers
    pub fn rank(candidates: &[String], limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut scored: Vec<(u32, &String)> = candidates
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .map(|c| (Self::score(c), c))
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

#[async_trait]
impl TeamPageRanker for KeywordTeamPageRanker {
    async fn rank_team_pages(
        &self,
        candidates: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SelectError> {
        Ok(Self::rank(candidates, limit))
    }
}
