//! Query/filter builder for content listings.
//!
//! Listing requests are compiled into a [`Predicate`] tree: free-text
//! search, explicit filters, and the role-based access overlay. The tree is
//! storage-agnostic; the in-memory store evaluates it with
//! [`Predicate::matches`] and the Postgres store renders it to SQL.

use core::cmp::Ordering;
use core::str::FromStr;

use intraportal_auth::{Principal, Role};
use intraportal_core::{
    AnnouncementScope, ContentKind, DepartmentId, DomainError, DomainResult, PageRequest, UserId, Window,
};

use crate::item::ContentItem;
use crate::moderation::ModerationStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every item.
    All,
    Kind(ContentKind),
    Status(ModerationStatus),
    Department(DepartmentId),
    /// `true`: department-scoped items; `false`: items without a department.
    HasDepartment(bool),
    Public(bool),
    Author(UserId),
    /// Case-insensitive substring of title or body, or exact tag membership.
    Text(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction that drops `All` and unwraps single clauses.
    pub fn all_of(clauses: Vec<Predicate>) -> Predicate {
        let mut clauses: Vec<Predicate> = clauses.into_iter().filter(|c| *c != Predicate::All).collect();
        match clauses.len() {
            0 => Predicate::All,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses),
        }
    }

    /// Disjunction; any `All` clause makes the whole thing `All`.
    pub fn any_of(clauses: Vec<Predicate>) -> Predicate {
        if clauses.iter().any(|c| *c == Predicate::All) {
            return Predicate::All;
        }
        let mut clauses = clauses;
        match clauses.len() {
            1 => clauses.remove(0),
            _ => Predicate::Or(clauses),
        }
    }

    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::all_of(vec![self, other])
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Kind(kind) => item.kind == *kind,
            Predicate::Status(status) => item.status == *status,
            Predicate::Department(id) => item.department_id == Some(*id),
            Predicate::HasDepartment(has) => item.department_id.is_some() == *has,
            Predicate::Public(is_public) => item.is_public == *is_public,
            Predicate::Author(id) => item.author_id == *id,
            Predicate::Text(text) => {
                let needle = text.to_lowercase();
                item.title.to_lowercase().contains(&needle)
                    || item.body.to_lowercase().contains(&needle)
                    || item.tags.iter().any(|t| t == text)
            }
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(item)),
            // An empty disjunction matches nothing.
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(item)),
        }
    }
}

/// Explicit listing parameters, already parsed and validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQuery {
    pub kind: Option<ContentKind>,
    pub search: Option<String>,
    pub status: Option<ModerationStatus>,
    pub department_id: Option<DepartmentId>,
    pub is_public: Option<bool>,
    pub announcement_scope: Option<AnnouncementScope>,
    pub author_id: Option<UserId>,
}

impl ContentQuery {
    pub fn of_kind(kind: ContentKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    fn explicit_clauses(&self) -> Vec<Predicate> {
        let mut clauses = Vec::new();
        if let Some(kind) = self.kind {
            clauses.push(Predicate::Kind(kind));
        }
        if let Some(text) = normalize_search(self.search.as_deref()) {
            clauses.push(Predicate::Text(text));
        }
        if let Some(status) = self.status {
            clauses.push(Predicate::Status(status));
        }
        if let Some(department_id) = self.department_id {
            clauses.push(Predicate::Department(department_id));
        }
        if let Some(is_public) = self.is_public {
            clauses.push(Predicate::Public(is_public));
        }
        if let Some(scope) = self.announcement_scope {
            clauses.push(Predicate::HasDepartment(scope == AnnouncementScope::Department));
        }
        if let Some(author_id) = self.author_id {
            clauses.push(Predicate::Author(author_id));
        }
        clauses
    }
}

/// Trimmed search text, `None` when blank.
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// What a principal may see in listings.
///
/// - admins: everything
/// - department heads: approved public items, plus everything in their department
/// - everyone else: approved public items, approved items of their
///   department, and their own items
pub fn access_overlay(principal: &Principal) -> Predicate {
    if principal.is_admin() {
        return Predicate::All;
    }
    let public_approved = Predicate::And(vec![
        Predicate::Public(true),
        Predicate::Status(ModerationStatus::Approved),
    ]);

    match (principal.role, principal.department_id) {
        (Role::DepartmentHead, Some(dept)) => Predicate::any_of(vec![
            public_approved,
            Predicate::Department(dept),
            Predicate::Author(principal.id),
        ]),
        (_, Some(dept)) => Predicate::any_of(vec![
            public_approved,
            Predicate::And(vec![
                Predicate::Department(dept),
                Predicate::Status(ModerationStatus::Approved),
            ]),
            Predicate::Author(principal.id),
        ]),
        (_, None) => Predicate::any_of(vec![public_approved, Predicate::Author(principal.id)]),
    }
}

/// Scoped predicate for a regular listing.
pub fn build_predicate(principal: &Principal, query: &ContentQuery) -> Predicate {
    let mut clauses = query.explicit_clauses();
    clauses.push(access_overlay(principal));
    Predicate::all_of(clauses)
}

/// Scoped predicate for the moderation queue.
///
/// Status defaults to `PENDING` unless the caller overrides it. Department
/// heads only see their own department's queue; other non-admins are refused.
pub fn moderation_queue(principal: &Principal, query: &ContentQuery) -> DomainResult<Predicate> {
    let mut query = query.clone();
    if query.status.is_none() {
        query.status = Some(ModerationStatus::Pending);
    }
    let mut clauses = query.explicit_clauses();

    match (principal.role, principal.department_id) {
        (Role::Admin, _) => {}
        (Role::DepartmentHead, Some(dept)) => clauses.push(Predicate::Department(dept)),
        _ => return Err(DomainError::forbidden("moderation is limited to admins and department heads")),
    }
    Ok(Predicate::all_of(clauses))
}

/// Content type selector for admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentTypeFilter {
    /// Documents and posts.
    #[default]
    All,
    Only(ContentKind),
}

impl ContentTypeFilter {
    pub fn kinds(&self) -> Vec<ContentKind> {
        match self {
            ContentTypeFilter::All => vec![ContentKind::Document, ContentKind::Post],
            ContentTypeFilter::Only(kind) => vec![*kind],
        }
    }
}

impl FromStr for ContentTypeFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(ContentTypeFilter::All)
        } else {
            s.parse().map(ContentTypeFilter::Only)
        }
    }
}

/// Per-type windows for the combined documents + posts view.
///
/// Documents get the ceiling of half the page size, posts the floor; each
/// source skips `(page - 1) * share` rows.
pub fn combined_windows(page: PageRequest) -> [(ContentKind, Window); 2] {
    let (documents, posts) = page.split_in_two();
    [
        (ContentKind::Document, page.with_limit(documents)),
        (ContentKind::Post, page.with_limit(posts)),
    ]
}

/// Ordering used by every listing: `updated_at` descending, id as tiebreak.
pub fn newest_first(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id))
}

/// Merge per-type result sets newest first and truncate to the page size.
pub fn merge_newest_first(sets: Vec<Vec<ContentItem>>, limit: u32) -> Vec<ContentItem> {
    let mut merged: Vec<ContentItem> = sets.into_iter().flatten().collect();
    merged.sort_by(newest_first);
    merged.truncate(limit as usize);
    merged
}
