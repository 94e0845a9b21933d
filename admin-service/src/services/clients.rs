use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dtos::{ClientDto, CreateClientRequest, PagedResponse};
use crate::models::Client;
use crate::models::permission::{Claims, ResourceKind, Status};
use crate::store::{AccountStore, TenantStore};

use super::access::PermissionEvaluator;
use super::error::ServiceError;
use super::scope::{ScopeFilter, SearchQuery};

/// Tenant management: creation, lookup, search and the two-stage teardown
/// (archive, then delete).
pub struct ClientService {
    accounts: Arc<dyn AccountStore>,
    tenants: Arc<dyn TenantStore>,
    evaluator: PermissionEvaluator,
}

impl ClientService {
    pub fn new(accounts: Arc<dyn AccountStore>, tenants: Arc<dyn TenantStore>) -> Self {
        let evaluator = PermissionEvaluator::new(accounts.clone(), tenants.clone());
        ClientService {
            accounts,
            tenants,
            evaluator,
        }
    }

    pub async fn create_client(
        &self,
        request: CreateClientRequest,
    ) -> Result<ClientDto, ServiceError> {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            uid: self.tenants.next_client_uid().await?,
            name: request.name,
            status: Status::Active,
            address: request.address,
            number_of_sites: 0,
            number_of_users: 0,
            number_of_alerts: 0,
            admin_user_ids: vec![],
            contacts: vec![],
            created_at: now,
            updated_at: now,
        };
        self.tenants.insert_client(&client).await?;
        tracing::info!(client_id = %client.id, uid = client.uid, "client created");
        Ok(ClientDto::from(client))
    }

    /// Fetch one client. Archived clients stay readable so their history
    /// can be inspected after teardown started.
    pub async fn get_client(
        &self,
        claims: &Claims,
        client_id: &str,
    ) -> Result<ClientDto, ServiceError> {
        if !self
            .evaluator
            .can_access(&claims.permissions, ResourceKind::Client, client_id)
            .await?
        {
            return Err(ServiceError::Forbidden);
        }
        let client = self
            .tenants
            .find_client(client_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(ClientDto::from(client))
    }

    pub async fn search_clients(
        &self,
        claims: &Claims,
        query: &SearchQuery,
    ) -> Result<PagedResponse<ClientDto>, ServiceError> {
        let filter = ScopeFilter::for_permissions(&claims.permissions, None);
        if filter.is_empty() {
            return Ok(PagedResponse {
                items: vec![],
                total: 0,
                page: query.page(),
                size: query.size(),
            });
        }
        let page = self.tenants.search_clients(&filter, query).await?;
        Ok(PagedResponse::from(page))
    }

    /// First stage of teardown: every account of the client is deactivated
    /// and its session revoked, then the client itself is archived. Order
    /// matters; if revocation fails the client stays live.
    pub async fn archive_client(&self, client_id: &str) -> Result<(), ServiceError> {
        let client = self
            .tenants
            .find_live_client(client_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if let Err(e) = self.accounts.deactivate_by_client(&client.id).await {
            tracing::error!(client_id = %client.id, error = %e, "failed to deactivate client accounts");
            return Err(ServiceError::UpdateError("update_user"));
        }
        if let Err(e) = self.tenants.archive_client(&client.id).await {
            tracing::error!(client_id = %client.id, error = %e, "failed to archive client");
            return Err(ServiceError::UpdateError("update_client"));
        }
        tracing::info!(client_id = %client.id, "client archived");
        Ok(())
    }

    /// Second stage of teardown: users first, then sites, then the client
    /// document itself. A failure stops the cascade where it happened.
    pub async fn delete_client(&self, client_id: &str) -> Result<(), ServiceError> {
        let client = self
            .tenants
            .find_live_client(client_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if let Err(e) = self.accounts.remove_by_client(&client.id).await {
            tracing::error!(client_id = %client.id, error = %e, "failed to remove client accounts");
            return Err(ServiceError::UpdateError("remove_user"));
        }
        if let Err(e) = self.tenants.remove_sites_by_client(&client.id).await {
            tracing::error!(client_id = %client.id, error = %e, "failed to remove client sites");
            return Err(ServiceError::UpdateError("remove_site"));
        }
        if let Err(e) = self.tenants.remove_client(&client.id).await {
            tracing::error!(client_id = %client.id, error = %e, "failed to remove client");
            return Err(ServiceError::UpdateError("remove_client"));
        }
        tracing::info!(client_id = %client.id, "client deleted");
        Ok(())
    }
}
