//! Calendar events and their participants.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_auth::{can_create, can_read, can_write, ContentScope, CreateTarget, Principal};
use intraportal_core::{DepartmentId, DomainError, DomainResult, Entity, EventId, UserId};

use crate::filter::normalize_search;
use crate::item::resolve_department;

/// A calendar event.
///
/// # Invariants
/// - `end_date > start_date`.
/// - Every event belongs to a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_public: bool,
    pub department_id: DepartmentId,
    pub created_by_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_public: bool,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
}

fn check_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
    if end <= start {
        return Err(DomainError::validation("endDate must be after startDate"));
    }
    Ok(())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Event {
    pub fn create(principal: &Principal, input: NewEvent, now: DateTime<Utc>) -> DomainResult<Self> {
        if !can_create(principal, CreateTarget::Event) {
            return Err(DomainError::forbidden("your role cannot create events"));
        }
        let title = input.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title is required"));
        }
        check_dates(input.start_date, input.end_date)?;
        let department_id = resolve_department(principal, input.department_id, true)?
            .ok_or_else(|| DomainError::validation("departmentId is required"))?;

        Ok(Self {
            id: EventId::new(),
            title: title.to_string(),
            description: optional_text(input.description),
            location: optional_text(input.location),
            start_date: input.start_date,
            end_date: input.end_date,
            is_public: input.is_public,
            department_id,
            created_by_id: principal.id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, editor: &Principal, patch: EventPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if !can_write(editor, &self.scope()) {
            return Err(DomainError::forbidden("cannot edit this event"));
        }
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        check_dates(start, end)?;

        if let Some(title) = patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(DomainError::validation("title is required"));
            }
            self.title = title.to_string();
        }
        if patch.description.is_some() {
            self.description = optional_text(patch.description);
        }
        if patch.location.is_some() {
            self.location = optional_text(patch.location);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        self.start_date = start;
        self.end_date = end;
        self.updated_at = now;
        Ok(())
    }

    /// Events are not moderated; the creator plays the author role.
    pub fn scope(&self) -> ContentScope {
        ContentScope {
            author_id: self.created_by_id,
            department_id: Some(self.department_id),
            is_public: self.is_public,
            approved: true,
            system_wide: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Declined,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Declined => "declined",
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ParticipantStatus::Pending),
            "confirmed" => Ok(ParticipantStatus::Confirmed),
            "declined" => Ok(ParticipantStatus::Declined),
            other => Err(DomainError::validation(format!(
                "unknown participant status '{other}' (expected pending, confirmed or declined)"
            ))),
        }
    }
}

/// One row per (event, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipant {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: ParticipantStatus,
    pub updated_at: DateTime<Utc>,
}

/// Set someone's participation in `event`.
///
/// Anyone who can see the event may set their own status; setting another
/// user's status requires write access to the event.
pub fn participation(
    event: &Event,
    principal: &Principal,
    target: Option<UserId>,
    status: ParticipantStatus,
    now: DateTime<Utc>,
) -> DomainResult<EventParticipant> {
    let scope = event.scope();
    let user_id = target.unwrap_or(principal.id);
    let allowed = if user_id == principal.id {
        can_read(principal, &scope)
    } else {
        can_write(principal, &scope)
    };
    if !allowed {
        return Err(DomainError::forbidden("cannot change participation for this event"));
    }
    Ok(EventParticipant {
        event_id: event.id,
        user_id,
        status,
        updated_at: now,
    })
}

/// Who may see which events in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventVisibility {
    Unrestricted,
    /// Public events, events of the department, and events created by the user.
    Restricted {
        user_id: UserId,
        department_id: Option<DepartmentId>,
    },
}

impl EventVisibility {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_admin() {
            EventVisibility::Unrestricted
        } else {
            EventVisibility::Restricted {
                user_id: principal.id,
                department_id: principal.department_id,
            }
        }
    }
}

/// Event listing filter. Listings are ordered by `start_date` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub search: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub is_public: Option<bool>,
    /// Only events that end at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only events that start at or before this instant.
    pub to: Option<DateTime<Utc>>,
    pub visibility: EventVisibility,
}

impl EventFilter {
    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            search: None,
            department_id: None,
            is_public: None,
            from: None,
            to: None,
            visibility: EventVisibility::for_principal(principal),
        }
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = normalize_search(search);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(text) = &self.search {
            let needle = text.to_lowercase();
            let hit = event.title.to_lowercase().contains(&needle)
                || event
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || event
                    .location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.department_id.is_some_and(|d| d != event.department_id) {
            return false;
        }
        if self.is_public.is_some_and(|p| p != event.is_public) {
            return false;
        }
        if self.from.is_some_and(|from| event.end_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| event.start_date > to) {
            return false;
        }
        match self.visibility {
            EventVisibility::Unrestricted => true,
            EventVisibility::Restricted { user_id, department_id } => {
                event.is_public || department_id == Some(event.department_id) || event.created_by_id == user_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use intraportal_auth::Role;

    use super::*;

    fn principal(role: Role, dept: Option<DepartmentId>) -> Principal {
        Principal::new(UserId::new(), role, dept)
    }

    fn new_event(start: DateTime<Utc>, hours: i64, is_public: bool) -> NewEvent {
        NewEvent {
            title: "All hands".into(),
            description: Some("Quarterly sync".into()),
            location: Some("Main hall".into()),
            start_date: start,
            end_date: start + Duration::hours(hours),
            is_public,
            department_id: None,
        }
    }

    #[test]
    fn end_must_follow_start() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let now = Utc::now();
        let err = Event::create(&head, new_event(now, 0, false), now).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(Event::create(&head, new_event(now, 2, false), now).is_ok());
    }

    #[test]
    fn employees_cannot_create_events() {
        let emp = principal(Role::Employee, Some(DepartmentId::new()));
        let now = Utc::now();
        assert!(matches!(
            Event::create(&emp, new_event(now, 1, true), now),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn patch_rechecks_dates() {
        let head = principal(Role::DepartmentHead, Some(DepartmentId::new()));
        let now = Utc::now();
        let mut event = Event::create(&head, new_event(now, 2, false), now).unwrap();
        let patch = EventPatch {
            end_date: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        assert!(event.apply_patch(&head, patch, now).is_err());
        assert_eq!(event.end_date, now + Duration::hours(2));
    }

    #[test]
    fn employees_respond_for_themselves_only() {
        let dept = Some(DepartmentId::new());
        let head = principal(Role::DepartmentHead, dept);
        let now = Utc::now();
        let event = Event::create(&head, new_event(now, 2, false), now).unwrap();

        let emp = principal(Role::Employee, dept);
        let p = participation(&event, &emp, None, ParticipantStatus::Confirmed, now).unwrap();
        assert_eq!(p.user_id, emp.id);

        let err = participation(&event, &emp, Some(UserId::new()), ParticipantStatus::Confirmed, now).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        assert!(participation(&event, &head, Some(emp.id), ParticipantStatus::Pending, now).is_ok());

        let outsider = principal(Role::Employee, Some(DepartmentId::new()));
        assert!(participation(&event, &outsider, None, ParticipantStatus::Confirmed, now).is_err());
    }

    #[test]
    fn filter_applies_visibility_and_window() {
        let d1 = DepartmentId::new();
        let head = principal(Role::DepartmentHead, Some(d1));
        let now = Utc::now();
        let private = Event::create(&head, new_event(now, 2, false), now).unwrap();

        let outsider = principal(Role::Employee, Some(DepartmentId::new()));
        assert!(!EventFilter::for_principal(&outsider).matches(&private));
        assert!(EventFilter::for_principal(&principal(Role::Employee, Some(d1))).matches(&private));

        let mut later = EventFilter::for_principal(&head);
        later.from = Some(now + Duration::hours(3));
        assert!(!later.matches(&private));

        let search = EventFilter::for_principal(&head).with_search(Some("main HALL"));
        assert!(search.matches(&private));
    }
}
