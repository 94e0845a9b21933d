use std::sync::Arc;

use crate::models::permission::{Permission, ResourceKind, resource_types};
use crate::store::{AccountStore, TenantStore};

use super::error::ServiceError;

/// Decides whether a set of permissions reaches a concrete resource.
///
/// Evaluation is the union over every grant the caller holds: a site is
/// reachable either through a direct site grant or through a grant on the
/// client that owns it, and a user through the site or client they belong
/// to. Hierarchy lookups that fail resolve to "no access" rather than an
/// error.
pub struct PermissionEvaluator {
    accounts: Arc<dyn AccountStore>,
    tenants: Arc<dyn TenantStore>,
}

impl PermissionEvaluator {
    pub fn new(accounts: Arc<dyn AccountStore>, tenants: Arc<dyn TenantStore>) -> Self {
        PermissionEvaluator { accounts, tenants }
    }

    pub async fn can_access(
        &self,
        permissions: &[Permission],
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<bool, ServiceError> {
        if uuid::Uuid::parse_str(resource_id).is_err() {
            return Err(ServiceError::InvalidResource(resource_id.to_string()));
        }

        if permissions.iter().any(Permission::grants_all) {
            return Ok(true);
        }

        let client_ids: Vec<&str> = permissions
            .iter()
            .flat_map(|p| p.ids_for(resource_types::CLIENT))
            .collect();
        let site_ids: Vec<&str> = permissions
            .iter()
            .flat_map(|p| p.ids_for(resource_types::SITE))
            .collect();

        match kind {
            ResourceKind::Client => Ok(client_ids.contains(&resource_id)),
            ResourceKind::Site => {
                if site_ids.contains(&resource_id) {
                    return Ok(true);
                }
                if client_ids.is_empty() {
                    return Ok(false);
                }
                // A client grant reaches every site under that client.
                match self.tenants.find_site(resource_id).await {
                    Ok(Some(site)) => Ok(client_ids.contains(&site.client_id.as_str())),
                    Ok(None) => Ok(false),
                    Err(e) => {
                        tracing::warn!(site_id = %resource_id, error = %e, "site lookup failed during access check");
                        Ok(false)
                    }
                }
            }
            ResourceKind::User => {
                if client_ids.is_empty() && site_ids.is_empty() {
                    return Ok(false);
                }
                match self.accounts.find_by_id(resource_id).await {
                    Ok(Some(target)) => {
                        if !target.site_id.is_empty()
                            && site_ids.contains(&target.site_id.as_str())
                        {
                            return Ok(true);
                        }
                        if !target.client_id.is_empty()
                            && client_ids.contains(&target.client_id.as_str())
                        {
                            return Ok(true);
                        }
                        Ok(false)
                    }
                    Ok(None) => Ok(false),
                    Err(e) => {
                        tracing::warn!(user_id = %resource_id, error = %e, "user lookup failed during access check");
                        Ok(false)
                    }
                }
            }
        }
    }
}
