//! Federated search across documents, posts, announcements and events.

use core::str::FromStr;

use serde::Serialize;

use intraportal_core::{ContentKind, DomainError, DomainResult};

use crate::event::Event;
use crate::filter::normalize_search;
use crate::item::ContentItem;

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// What a search request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Content(ContentKind),
    Events,
}

impl FromStr for SearchTarget {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event" | "events" => Ok(SearchTarget::Events),
            other => other.parse().map(SearchTarget::Content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// `None` searches every target.
    pub target: Option<SearchTarget>,
    pub limit: u32,
}

impl SearchRequest {
    pub fn parse(q: Option<&str>, target: Option<&str>, limit: Option<u32>) -> DomainResult<Self> {
        let query = normalize_search(q).ok_or_else(|| DomainError::validation("search query 'q' is required"))?;
        let target = match target.map(str::trim).filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all")) {
            Some(t) => Some(t.parse()?),
            None => None,
        };
        Ok(Self {
            query,
            target,
            limit: limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT),
        })
    }

    pub fn includes(&self, target: SearchTarget) -> bool {
        self.target.is_none_or(|t| t == target)
    }

    /// Content kinds to query, in response order.
    pub fn content_kinds(&self) -> Vec<ContentKind> {
        ContentKind::ALL
            .iter()
            .copied()
            .filter(|k| self.includes(SearchTarget::Content(*k)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub documents: Vec<ContentItem>,
    pub posts: Vec<ContentItem>,
    pub announcements: Vec<ContentItem>,
    pub events: Vec<Event>,
    pub total: usize,
}

impl SearchResults {
    pub fn new(query: String) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn put(&mut self, kind: ContentKind, items: Vec<ContentItem>) {
        self.total += items.len();
        match kind {
            ContentKind::Document => self.documents = items,
            ContentKind::Post => self.posts = items,
            ContentKind::Announcement => self.announcements = items,
        }
    }

    pub fn put_events(&mut self, events: Vec<Event>) {
        self.total += events.len();
        self.events = events;
    }
}
