pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Account, Client, Contact, PagedList, Site};
use crate::services::error::ServiceError;
use crate::services::scope::{ScopeFilter, SearchQuery};

/// Liveness of the backing store, surfaced through the health endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<(), ServiceError>;
}

/// Persistence for login-capable accounts. Services only ever see these
/// narrow operations; the scope filter is translated to a database query
/// inside the implementation.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, ServiceError>;
    async fn find_by_activation_code(&self, code: &str)
        -> Result<Option<Account>, ServiceError>;

    async fn insert(&self, account: &Account) -> Result<(), ServiceError>;
    async fn replace(&self, account: &Account) -> Result<(), ServiceError>;
    async fn remove(&self, id: &str) -> Result<(), ServiceError>;

    /// Store the freshly issued session token and stamp the login time.
    /// Overwrites any previous token, which is what keeps sessions single.
    async fn record_login(
        &self,
        id: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError>;
    async fn clear_token(&self, id: &str) -> Result<(), ServiceError>;
    async fn set_password(&self, id: &str, hash: &str, code: &str) -> Result<(), ServiceError>;
    async fn set_activation_code(&self, id: &str, code: &str) -> Result<(), ServiceError>;

    /// Count accounts of the given admin role within a client, for cap
    /// enforcement.
    async fn count_role_in_client(
        &self,
        client_id: &str,
        role_tag: &str,
    ) -> Result<u64, ServiceError>;

    /// Flip every account of a client to inactive and drop their tokens.
    async fn deactivate_by_client(&self, client_id: &str) -> Result<(), ServiceError>;
    async fn remove_by_client(&self, client_id: &str) -> Result<(), ServiceError>;

    async fn search(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Account>, ServiceError>;
}

/// Persistence for the tenant hierarchy: clients and their sites.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_client(&self, id: &str) -> Result<Option<Client>, ServiceError>;
    /// A client that exists and is not archived.
    async fn find_live_client(&self, id: &str) -> Result<Option<Client>, ServiceError>;
    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError>;
    async fn archive_client(&self, id: &str) -> Result<(), ServiceError>;
    async fn remove_client(&self, id: &str) -> Result<(), ServiceError>;
    async fn next_client_uid(&self) -> Result<i64, ServiceError>;

    async fn adjust_client_users(&self, id: &str, delta: i64) -> Result<(), ServiceError>;
    async fn push_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError>;
    async fn pull_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError>;
    async fn push_contact(&self, id: &str, contact: &Contact) -> Result<(), ServiceError>;
    async fn pull_contact(&self, id: &str, contact_id: &str) -> Result<(), ServiceError>;

    async fn search_clients(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Client>, ServiceError>;

    async fn find_site(&self, id: &str) -> Result<Option<Site>, ServiceError>;
    /// Ids of every site of a client belonging to the named group.
    async fn site_ids_in_group(
        &self,
        client_id: &str,
        group_name: &str,
    ) -> Result<Vec<String>, ServiceError>;
    async fn adjust_site_users(&self, site_id: &str, delta: i64) -> Result<(), ServiceError>;
    async fn remove_sites_by_client(&self, client_id: &str) -> Result<(), ServiceError>;
}
