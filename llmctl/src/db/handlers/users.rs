//! Repository for user accounts.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{Role, UserCreateDBRequest, UserDBResponse, UserStatus, UserUpdateDBRequest},
    store::Table,
};
use crate::types::{UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
}

pub struct Users<'c> {
    table: &'c mut Table<UserDBResponse>,
}

impl<'c> Users<'c> {
    pub fn new(table: &'c mut Table<UserDBResponse>) -> Self {
        Self { table }
    }

    /// Emails compare case-insensitively.
    #[instrument(skip(self), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.table.iter().find(|user| user.email.eq_ignore_ascii_case(email)).cloned())
    }

    fn ensure_email_free(&self, email: &str, except: Option<UserId>) -> Result<()> {
        let taken = self
            .table
            .iter()
            .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email));
        if taken {
            return Err(DbError::UniqueViolation {
                table: "users",
                field: "email",
                conflicting_value: email.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_status(&mut self, id: UserId, status: UserStatus) -> Result<UserDBResponse> {
        let user = self.table.get_mut(&id).ok_or(DbError::NotFound)?;
        user.status = status;
        Ok(user.clone())
    }

    /// Count API calls made by a user. The usage limit is informational and not enforced.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn record_usage(&mut self, id: UserId, calls: u64) -> Result<UserDBResponse> {
        let user = self.table.get_mut(&id).ok_or(DbError::NotFound)?;
        user.usage_count = user.usage_count.saturating_add(calls);
        user.api_calls_today = user.api_calls_today.saturating_add(calls);
        Ok(user.clone())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn record_login(&mut self, id: UserId, at: DateTime<Utc>) -> Result<UserDBResponse> {
        let user = self.table.get_mut(&id).ok_or(DbError::NotFound)?;
        user.last_login = Some(at);
        Ok(user.clone())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        self.ensure_email_free(&request.email, None)?;

        let user = UserDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            role: request.role,
            status: request.status,
            usage_limit: request.usage_limit,
            usage_count: 0,
            api_calls_today: 0,
            last_login: None,
            created_at: Utc::now(),
        };

        self.table.insert(user.clone());
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.table.get(&id).cloned())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.table.get(&id).map(|user| (id, user.clone())))
            .collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        Ok(self
            .table
            .iter()
            .filter(|user| filter.status.is_none_or(|status| user.status == status))
            .filter(|user| filter.role.is_none_or(|role| user.role == role))
            .cloned()
            .collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.table.remove(&id).is_some())
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        if !self.table.contains(&id) {
            return Err(DbError::NotFound);
        }
        if let Some(email) = &request.email {
            self.ensure_email_free(email, Some(id))?;
        }

        let user = self.table.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(email) = &request.email {
            user.email = email.clone();
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(status) = request.status {
            user.status = status;
        }
        if let Some(usage_limit) = request.usage_limit {
            user.usage_limit = usage_limit;
        }

        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::Store;

    fn user_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Jane Smith".to_string(),
            email: email.to_string(),
            role: Role::User,
            status: UserStatus::Active,
            usage_limit: 5000,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_create_user_and_lookup_by_email() {
        let store = Store::new();
        let mut table = store.users().await;
        let mut repo = Users::new(&mut table);

        let created = repo.create(&user_request("jane@example.com")).await.unwrap();
        assert_eq!(created.usage_count, 0);
        assert_eq!(created.last_login, None);

        let found = repo.get_user_by_email("JANE@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_email_conflicts() {
        let store = Store::new();
        let mut table = store.users().await;
        let mut repo = Users::new(&mut table);
        repo.create(&user_request("jane@example.com")).await.unwrap();

        let result = repo.create(&user_request("Jane@Example.com")).await;
        assert!(matches!(result, Err(DbError::UniqueViolation { field: "email", .. })));
    }

    #[test_log::test(tokio::test)]
    async fn test_update_to_taken_email_conflicts_but_own_email_is_fine() {
        let store = Store::new();
        let mut table = store.users().await;
        let mut repo = Users::new(&mut table);
        let jane = repo.create(&user_request("jane@example.com")).await.unwrap();
        repo.create(&user_request("bob@example.com")).await.unwrap();

        let steal = UserUpdateDBRequest {
            email: Some("bob@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(jane.id, &steal).await,
            Err(DbError::UniqueViolation { .. })
        ));

        let same = UserUpdateDBRequest {
            email: Some("jane@example.com".to_string()),
            name: Some("Jane S.".to_string()),
            ..Default::default()
        };
        let updated = repo.update(jane.id, &same).await.unwrap();
        assert_eq!(updated.name, "Jane S.");
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.usage_limit, 5000);
    }

    #[test_log::test(tokio::test)]
    async fn test_set_status_and_filter() {
        let store = Store::new();
        let mut table = store.users().await;
        let mut repo = Users::new(&mut table);
        let jane = repo.create(&user_request("jane@example.com")).await.unwrap();
        repo.create(&user_request("bob@example.com")).await.unwrap();

        let suspended = repo.set_status(jane.id, UserStatus::Suspended).await.unwrap();
        assert_eq!(suspended.status, UserStatus::Suspended);

        let active = repo
            .list(&UserFilter {
                status: Some(UserStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email, "bob@example.com");
    }

    #[test_log::test(tokio::test)]
    async fn test_record_usage_and_login() {
        let store = Store::new();
        let mut table = store.users().await;
        let mut repo = Users::new(&mut table);
        let jane = repo.create(&user_request("jane@example.com")).await.unwrap();

        repo.record_usage(jane.id, 3).await.unwrap();
        let used = repo.record_usage(jane.id, 4).await.unwrap();
        assert_eq!(used.usage_count, 7);
        assert_eq!(used.api_calls_today, 7);

        let now = Utc::now();
        let logged_in = repo.record_login(jane.id, now).await.unwrap();
        assert_eq!(logged_in.last_login, Some(now));
    }
}
