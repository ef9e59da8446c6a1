//! Application services: policy checks, store calls and logging per operation.
//!
//! Every operation takes the caller's [`Principal`] explicitly; the
//! services hold no per-request state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use intraportal_core::{DepartmentId, DomainError, DomainResult};
use intraportal_infra::{InMemoryStore, PostgresStore, SharedStore};

use crate::config::DatabaseConfig;

mod announcements;
mod content;
mod directory;
mod events;
mod search;

pub use content::Moderated;

#[derive(Clone)]
pub struct AppServices {
    store: SharedStore,
}

impl AppServices {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Fails with `NotFound("department")` when the department is unknown.
    async fn require_department(&self, id: DepartmentId) -> DomainResult<()> {
        match self.store.get_department(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("department")),
        }
    }
}

/// Pick the store named by the configuration.
pub async fn build_services(database: Option<&DatabaseConfig>) -> anyhow::Result<AppServices> {
    let Some(db) = database else {
        tracing::info!("using in-memory store");
        return Ok(AppServices::in_memory());
    };

    let store = PostgresStore::connect(&db.url, db.max_connections).await?;
    if db.run_migrations {
        store.migrate().await?;
        tracing::info!("database migrations applied");
    }
    tracing::info!(max_connections = db.max_connections, "using postgres store");
    Ok(AppServices::new(Arc::new(store)))
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use intraportal_auth::{NewUser, Principal, Role, User};
    use intraportal_content::{Department, NewDepartment};
    use intraportal_core::{DepartmentId, UserId};

    use super::*;

    pub fn admin() -> Principal {
        Principal::new(UserId::new(), Role::Admin, None)
    }

    pub fn head(department: DepartmentId) -> Principal {
        Principal::new(UserId::new(), Role::DepartmentHead, Some(department))
    }

    pub fn employee(department: DepartmentId) -> Principal {
        Principal::new(UserId::new(), Role::Employee, Some(department))
    }

    pub async fn department(services: &AppServices, name: &str) -> Department {
        services
            .create_department(
                &admin(),
                NewDepartment {
                    name: name.to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn user(services: &AppServices, email: &str, department: Option<DepartmentId>) -> User {
        services
            .create_user(
                &admin(),
                NewUser {
                    email: email.to_string(),
                    name: email.split('@').next().unwrap_or(email).to_string(),
                    role: None,
                    department_id: department,
                    position: None,
                },
            )
            .await
            .unwrap()
    }
}
