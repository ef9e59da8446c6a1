//! Departments: the organizational units that scope content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use intraportal_core::{DepartmentId, DomainError, DomainResult, Entity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Department {
    type Id = DepartmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A department with the number of users it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    #[serde(flatten)]
    pub department: Department,
    pub user_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("department name is required"));
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

impl Department {
    /// Validate input. Name uniqueness is checked against storage by the caller.
    pub fn create(input: NewDepartment, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: DepartmentId::new(),
            name: normalize_name(&input.name)?,
            description: normalize_description(input.description),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: DepartmentPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = normalize_name(&name)?;
        }
        if patch.description.is_some() {
            self.description = normalize_description(patch.description);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// A department can only be deleted once it owns no users.
pub fn ensure_deletable(user_count: u64) -> DomainResult<()> {
    if user_count > 0 {
        return Err(DomainError::conflict(format!(
            "department still has {user_count} user(s); reassign them first"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trims_name_and_drops_blank_description() {
        let d = Department::create(
            NewDepartment {
                name: "  Engineering ".into(),
                description: Some(" ".into()),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(d.name, "Engineering");
        assert_eq!(d.description, None);
    }

    #[test]
    fn blank_name_is_invalid() {
        let err = Department::create(
            NewDepartment {
                name: "   ".into(),
                description: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deletion_conflicts_while_users_remain() {
        assert!(matches!(ensure_deletable(3), Err(DomainError::Conflict(_))));
        assert!(ensure_deletable(0).is_ok());
    }

    #[test]
    fn summary_flattens_department_fields() {
        let d = Department::create(
            NewDepartment {
                name: "Sales".into(),
                description: None,
            },
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(DepartmentSummary {
            department: d,
            user_count: 2,
        })
        .unwrap();
        assert_eq!(json["name"], "Sales");
        assert_eq!(json["userCount"], 2);
    }
}
