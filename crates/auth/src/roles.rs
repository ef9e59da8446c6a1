use core::str::FromStr;

use serde::{Deserialize, Serialize};

use intraportal_core::DomainError;

/// Role identifier used for RBAC.
///
/// The portal has exactly three roles; every policy decision dispatches on
/// this enum rather than on role strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    DepartmentHead,
    Employee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::DepartmentHead, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::DepartmentHead => "DEPARTMENT_HEAD",
            Role::Employee => "EMPLOYEE",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Ok(Role::Admin),
            "DEPARTMENT_HEAD" => Ok(Role::DepartmentHead),
            "EMPLOYEE" => Ok(Role::Employee),
            other => Err(DomainError::validation(format!(
                "unknown role '{other}' (expected ADMIN, DEPARTMENT_HEAD or EMPLOYEE)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("department_head".parse::<Role>().unwrap(), Role::DepartmentHead);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn wire_format_matches_display() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }
}
