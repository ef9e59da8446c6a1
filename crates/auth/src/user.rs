//! Portal user records and the rules for creating and editing them.
//!
//! Credentials live with the external identity provider; this module only
//! owns the profile, role and department assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_core::{DepartmentId, DomainError, Entity, UserId};

use crate::{Principal, Role};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A portal user.
///
/// # Invariants
/// - `email` is trimmed, lowercased and contains `@`.
/// - `name` is non-empty.
/// - Only admins change `role` or `department_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department_id: Option<DepartmentId>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub department_id: Option<DepartmentId>,
    pub position: Option<String>,
}

/// Partial update of a user (`PATCH /users/{id}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    /// `Some(None)` moves the user out of any department.
    #[serde(default, deserialize_with = "double_option")]
    pub department_id: Option<Option<DepartmentId>>,
    pub position: Option<String>,
}

/// Self-service profile update (`PUT /users/profile`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub position: Option<String>,
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}

fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

fn normalize_position(position: Option<String>) -> Option<String> {
    position
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

impl User {
    /// Validate input and build a new user. Uniqueness of the email and
    /// existence of the department are checked by the caller against storage.
    pub fn create(input: NewUser, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Ok(Self {
            id: UserId::new(),
            email: normalize_email(&input.email)?,
            name: normalize_name(&input.name)?,
            role: input.role.unwrap_or(Role::Employee),
            department_id: input.department_id,
            position: normalize_position(input.position),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an administrative patch on behalf of `actor`.
    ///
    /// Admins may change anything. A department head may edit the name and
    /// position of users in their own department; email, role and
    /// department stay admin-only.
    pub fn apply_patch(&mut self, actor: &Principal, patch: UserPatch, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !actor.is_admin() {
            if !actor.heads(self.department_id) {
                return Err(DomainError::forbidden("cannot edit users outside your department"));
            }
            if patch
                .email
                .as_deref()
                .is_some_and(|e| e.trim().to_lowercase() != self.email)
            {
                return Err(DomainError::forbidden("only admins can change email addresses"));
            }
            if patch.role.is_some_and(|r| r != self.role) {
                return Err(DomainError::forbidden("only admins can change roles"));
            }
            if patch.department_id.is_some_and(|d| d != self.department_id) {
                return Err(DomainError::forbidden("only admins can move users between departments"));
            }
        }

        if let Some(email) = patch.email {
            self.email = normalize_email(&email)?;
        }
        if let Some(name) = patch.name {
            self.name = normalize_name(&name)?;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(department_id) = patch.department_id {
            self.department_id = department_id;
        }
        if patch.position.is_some() {
            self.position = normalize_position(patch.position);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(name) = update.name {
            self.name = normalize_name(&name)?;
        }
        if update.position.is_some() {
            self.position = normalize_position(update.position);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Who may look at this user's record.
    pub fn visible_to(&self, actor: &Principal) -> bool {
        actor.is_admin() || actor.id == self.id || actor.in_department(self.department_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────────────────────────

/// User listing filter. Results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub department_id: Option<DepartmentId>,
    pub role: Option<Role>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
}

impl UserQuery {
    /// Non-admins only ever list their own department; a request for another
    /// department is refused rather than silently narrowed.
    pub fn scoped(actor: &Principal, mut query: UserQuery) -> Result<UserQuery, DomainError> {
        if actor.is_admin() {
            return Ok(query);
        }
        let Some(own) = actor.department_id else {
            return Err(DomainError::forbidden("you are not assigned to a department"));
        };
        if query.department_id.is_some_and(|d| d != own) {
            return Err(DomainError::forbidden("cannot list users of another department"));
        }
        query.department_id = Some(own);
        Ok(query)
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.department_id.is_some_and(|d| user.department_id != Some(d)) {
            return false;
        }
        if self.role.is_some_and(|r| r != user.role) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => {
                let needle = text.to_lowercase();
                user.name.to_lowercase().contains(&needle) || user.email.contains(&needle)
            }
            None => true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
