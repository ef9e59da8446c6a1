//! Departments and users.

use tracing::{info, instrument};

use intraportal_auth::{
    can_create, CreateTarget, NewUser, Principal, ProfileUpdate, User, UserPatch, UserQuery,
};
use intraportal_content::{
    department::normalize_name, ensure_deletable, Department, DepartmentPatch, DepartmentSummary, NewDepartment,
};
use intraportal_core::{DepartmentId, DomainError, DomainResult, Page, PageRequest, UserId};

use super::{now, AppServices};

fn require_admin(principal: &Principal, what: &str) -> DomainResult<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!("only admins can {what}")))
    }
}

impl AppServices {
    async fn load_department(&self, id: DepartmentId) -> DomainResult<Department> {
        self.store
            .get_department(id)
            .await?
            .ok_or_else(|| DomainError::not_found("department"))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<DepartmentId>) -> DomainResult<()> {
        match self.store.find_department_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(DomainError::validation(format!("department '{name}' already exists")))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> DomainResult<()> {
        match self.store.find_user_by_email(email).await? {
            Some(existing) if Some(existing.id) != except => {
                Err(DomainError::validation(format!("a user with email '{email}' already exists")))
            }
            _ => Ok(()),
        }
    }

    // -------------------------
    // Departments
    // -------------------------

    pub async fn list_departments(&self) -> DomainResult<Vec<DepartmentSummary>> {
        Ok(self.store.list_departments().await?)
    }

    pub async fn get_department(&self, id: DepartmentId) -> DomainResult<DepartmentSummary> {
        let department = self.load_department(id).await?;
        let user_count = self.store.count_department_users(id).await?;
        Ok(DepartmentSummary { department, user_count })
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn create_department(&self, principal: &Principal, input: NewDepartment) -> DomainResult<Department> {
        if !can_create(principal, CreateTarget::Department) {
            return Err(DomainError::forbidden("only admins can create departments"));
        }
        let department = Department::create(input, now())?;
        self.ensure_name_free(&department.name, None).await?;
        self.store.insert_department(&department).await?;
        info!(department_id = %department.id, name = %department.name, "department created");
        Ok(department)
    }

    #[instrument(skip_all, fields(department_id = %id, user_id = %principal.id))]
    pub async fn update_department(
        &self,
        principal: &Principal,
        id: DepartmentId,
        patch: DepartmentPatch,
    ) -> DomainResult<Department> {
        require_admin(principal, "edit departments")?;
        let mut department = self.load_department(id).await?;
        if let Some(name) = patch.name.as_deref() {
            self.ensure_name_free(&normalize_name(name)?, Some(id)).await?;
        }
        department.apply_patch(patch, now())?;
        if !self.store.update_department(&department).await? {
            return Err(DomainError::not_found("department"));
        }
        info!("department updated");
        Ok(department)
    }

    #[instrument(skip_all, fields(department_id = %id, user_id = %principal.id))]
    pub async fn delete_department(&self, principal: &Principal, id: DepartmentId) -> DomainResult<()> {
        require_admin(principal, "delete departments")?;
        self.load_department(id).await?;
        ensure_deletable(self.store.count_department_users(id).await?)?;
        if !self.store.delete_department(id).await? {
            return Err(DomainError::not_found("department"));
        }
        info!("department deleted");
        Ok(())
    }

    /// Users of one department; admins or members of that department.
    pub async fn department_users(
        &self,
        principal: &Principal,
        id: DepartmentId,
        page: PageRequest,
    ) -> DomainResult<Page<User>> {
        if !(principal.is_admin() || principal.in_department(Some(id))) {
            return Err(DomainError::forbidden("cannot list users of another department"));
        }
        self.load_department(id).await?;
        let query = UserQuery {
            department_id: Some(id),
            ..Default::default()
        };
        self.page_users(&query, page).await
    }

    // -------------------------
    // Users
    // -------------------------

    async fn load_user(&self, id: UserId) -> DomainResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    async fn page_users(&self, query: &UserQuery, page: PageRequest) -> DomainResult<Page<User>> {
        let total = self.store.count_users(query).await?;
        let items = self.store.list_users(query, page.window()).await?;
        Ok(Page::new(items, total, page))
    }

    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn create_user(&self, principal: &Principal, input: NewUser) -> DomainResult<User> {
        if !can_create(principal, CreateTarget::User) {
            return Err(DomainError::forbidden("only admins can create users"));
        }
        let user = User::create(input, now())?;
        if let Some(department_id) = user.department_id {
            self.require_department(department_id).await?;
        }
        self.ensure_email_free(&user.email, None).await?;
        self.store.insert_user(&user).await?;
        info!(new_user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn list_users(&self, principal: &Principal, query: UserQuery, page: PageRequest) -> DomainResult<Page<User>> {
        let query = UserQuery::scoped(principal, query)?;
        self.page_users(&query, page).await
    }

    pub async fn get_user(&self, principal: &Principal, id: UserId) -> DomainResult<User> {
        let user = self.load_user(id).await?;
        if !user.visible_to(principal) {
            return Err(DomainError::forbidden("cannot view users outside your department"));
        }
        Ok(user)
    }

    #[instrument(skip_all, fields(target_user_id = %id, user_id = %principal.id))]
    pub async fn update_user(&self, principal: &Principal, id: UserId, patch: UserPatch) -> DomainResult<User> {
        let mut user = self.load_user(id).await?;
        let previous = user.clone();
        user.apply_patch(principal, patch, now())?;
        if user.department_id != previous.department_id {
            if let Some(department_id) = user.department_id {
                self.require_department(department_id).await?;
            }
        }
        if user.email != previous.email {
            self.ensure_email_free(&user.email, Some(id)).await?;
        }
        if !self.store.update_user(&user).await? {
            return Err(DomainError::not_found("user"));
        }
        info!("user updated");
        Ok(user)
    }

    /// Self-service profile edit.
    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn update_profile(&self, principal: &Principal, update: ProfileUpdate) -> DomainResult<User> {
        let mut user = self.load_user(principal.id).await?;
        user.apply_profile(update, now())?;
        if !self.store.update_user(&user).await? {
            return Err(DomainError::not_found("user"));
        }
        info!("profile updated");
        Ok(user)
    }

    #[instrument(skip_all, fields(target_user_id = %id, user_id = %principal.id))]
    pub async fn delete_user(&self, principal: &Principal, id: UserId) -> DomainResult<()> {
        require_admin(principal, "delete users")?;
        if principal.id == id {
            return Err(DomainError::forbidden("you cannot delete your own account"));
        }
        if !self.store.delete_user(id).await? {
            return Err(DomainError::not_found("user"));
        }
        info!("user deleted");
        Ok(())
    }
}
