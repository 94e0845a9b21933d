use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dtos::{CreateUserRequest, PagedResponse, UserDto};
use crate::models::account::AccountKind;
use crate::models::permission::{
    Claims, Permission, ResourceKind, Scope, Status, resource_types, roles,
};
use crate::models::{Account, Contact};
use crate::store::{AccountStore, TenantStore};

use super::access::PermissionEvaluator;
use super::error::ServiceError;
use super::notify::Notifier;
use super::scope::{ScopeFilter, SearchQuery};

/// Per-client cap on client admins.
const CLIENT_ADMIN_LIMIT: u64 = 3;
/// Per-client cap on contacts.
const CONTACT_LIMIT: usize = 10;

/// Account management within the tenant hierarchy.
pub struct UserService {
    accounts: Arc<dyn AccountStore>,
    tenants: Arc<dyn TenantStore>,
    notifier: Arc<dyn Notifier>,
    evaluator: PermissionEvaluator,
}

impl UserService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tenants: Arc<dyn TenantStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let evaluator = PermissionEvaluator::new(accounts.clone(), tenants.clone());
        UserService {
            accounts,
            tenants,
            notifier,
            evaluator,
        }
    }

    /// Create an account under a live client. The request's type fields
    /// pick the branch: admin user (CSA or GA), site user (SM or SU), or
    /// contact when both are blank.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserDto, ServiceError> {
        if self.accounts.find_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::DuplicateAccount(request.email));
        }
        if request.contact_preference == "phone" && request.phone_number.is_empty() {
            return Err(ServiceError::InvalidData(
                "phone preference requires a phone number".to_string(),
            ));
        }
        let client = self
            .tenants
            .find_live_client(&request.client_id)
            .await?
            .ok_or_else(|| ServiceError::InvalidData("client not found".to_string()))?;

        let now = Utc::now();
        let mut account = Account {
            id: Uuid::new_v4().to_string(),
            email: request.email.clone(),
            password_hash: String::new(),
            status: Status::Inactive,
            token: String::new(),
            activation_code: String::new(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone_number: request.phone_number.clone(),
            contact_preference: request.contact_preference.clone(),
            client_id: client.id.clone(),
            site_id: String::new(),
            admin_user_type: String::new(),
            site_user_type: String::new(),
            site_group_name: String::new(),
            permissions: vec![],
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        if !request.admin_user_type.is_empty() {
            self.prepare_admin_user(&mut account, &request, &client.id)
                .await?;
        } else if !request.site_user_type.is_empty() {
            self.prepare_site_user(&mut account, &request, &client.id)
                .await?;
        } else {
            self.prepare_contact(&mut account, &client.contacts).await?;
        }

        if account.is_confirmable() {
            account.activation_code = Uuid::new_v4().to_string();
        } else {
            // Contacts never log in; nothing to activate.
            account.status = Status::Active;
        }

        self.accounts.insert(&account).await?;
        self.record_parent(&account).await;

        if account.is_confirmable() {
            if let Err(e) = self
                .notifier
                .send_activation_code(&account.email, &account.activation_code)
                .await
            {
                tracing::warn!(user_id = %account.id, error = %e, "activation code delivery failed");
            }
        }

        tracing::info!(user_id = %account.id, client_id = %account.client_id, "user created");
        Ok(UserDto::from(account))
    }

    async fn prepare_admin_user(
        &self,
        account: &mut Account,
        request: &CreateUserRequest,
        client_id: &str,
    ) -> Result<(), ServiceError> {
        if request.admin_user_type.eq_ignore_ascii_case(roles::GROUP_ADMIN) {
            if request.site_group_name.is_empty() {
                return Err(ServiceError::InvalidData(
                    "group admin requires a site group".to_string(),
                ));
            }
            // The grant freezes the group's current sites; sites joining
            // the group later are not picked up.
            let site_ids = self
                .tenants
                .site_ids_in_group(client_id, &request.site_group_name)
                .await?;
            account.admin_user_type = roles::GROUP_ADMIN.to_string();
            account.site_group_name = request.site_group_name.clone();
            account.permissions = vec![Permission::new(
                roles::GROUP_ADMIN,
                vec![Scope::new(
                    vec![resource_types::SITE.to_string()],
                    site_ids,
                )],
            )];
        } else if request
            .admin_user_type
            .eq_ignore_ascii_case(roles::CLIENT_ADMIN)
        {
            let existing = self
                .accounts
                .count_role_in_client(client_id, roles::CLIENT_ADMIN)
                .await?;
            if existing >= CLIENT_ADMIN_LIMIT {
                return Err(ServiceError::LimitReached("admin user limit reached"));
            }
            account.admin_user_type = roles::CLIENT_ADMIN.to_string();
            account.permissions = vec![Permission::new(
                roles::CLIENT_ADMIN,
                vec![Scope::new(
                    vec![resource_types::CLIENT.to_string()],
                    vec![client_id.to_string()],
                )],
            )];
        } else {
            return Err(ServiceError::InvalidData(format!(
                "unsupported admin user type: {}",
                request.admin_user_type
            )));
        }
        Ok(())
    }

    async fn prepare_site_user(
        &self,
        account: &mut Account,
        request: &CreateUserRequest,
        client_id: &str,
    ) -> Result<(), ServiceError> {
        if !request.site_user_type.eq_ignore_ascii_case(roles::SITE_MANAGER)
            && !request.site_user_type.eq_ignore_ascii_case(roles::SITE_USER)
        {
            return Err(ServiceError::InvalidData(format!(
                "unsupported site user type: {}",
                request.site_user_type
            )));
        }
        let site = self
            .tenants
            .find_site(&request.site_id)
            .await?
            .filter(|s| s.client_id == client_id)
            .ok_or_else(|| ServiceError::InvalidData("site not found".to_string()))?;

        account.site_id = site.id.clone();
        account.site_user_type = request.site_user_type.to_uppercase();
        account.permissions = vec![Permission::new(
            account.site_user_type.as_str(),
            vec![Scope::new(
                vec![resource_types::SITE.to_string()],
                vec![site.id],
            )],
        )];
        Ok(())
    }

    async fn prepare_contact(
        &self,
        account: &mut Account,
        existing: &[Contact],
    ) -> Result<(), ServiceError> {
        if existing.len() >= CONTACT_LIMIT {
            return Err(ServiceError::LimitReached("customer user limit reached"));
        }
        // Contacts carry no grants at all.
        account.permissions = vec![];
        Ok(())
    }

    /// Counter and snapshot maintenance on the parent documents. The user
    /// itself is already persisted; a failure here is logged and absorbed.
    async fn record_parent(&self, account: &Account) {
        let result = match account.kind() {
            AccountKind::Admin => {
                let push = if account
                    .admin_user_type
                    .eq_ignore_ascii_case(roles::CLIENT_ADMIN)
                {
                    self.tenants
                        .push_admin_user(&account.client_id, &account.id)
                        .await
                } else {
                    Ok(())
                };
                match push {
                    Ok(()) => {
                        self.tenants
                            .adjust_client_users(&account.client_id, 1)
                            .await
                    }
                    err => err,
                }
            }
            AccountKind::Site => self.tenants.adjust_site_users(&account.site_id, 1).await,
            AccountKind::Contact => {
                let contact = Contact {
                    id: account.id.clone(),
                    email: account.email.clone(),
                    first_name: account.first_name.clone(),
                    last_name: account.last_name.clone(),
                    phone_number: account.phone_number.clone(),
                };
                match self.tenants.push_contact(&account.client_id, &contact).await {
                    Ok(()) => {
                        self.tenants
                            .adjust_client_users(&account.client_id, 1)
                            .await
                    }
                    err => err,
                }
            }
        };
        if let Err(e) = result {
            tracing::error!(user_id = %account.id, error = %e, "parent bookkeeping failed after user creation");
        }
    }

    pub async fn search_users(
        &self,
        claims: &Claims,
        query: &SearchQuery,
    ) -> Result<PagedResponse<UserDto>, ServiceError> {
        let own_client = if claims.client_id.is_empty() {
            None
        } else {
            Some(claims.client_id.as_str())
        };
        let filter = ScopeFilter::for_permissions(&claims.permissions, own_client);
        if filter.is_empty() {
            return Ok(PagedResponse {
                items: vec![],
                total: 0,
                page: query.page(),
                size: query.size(),
            });
        }
        let page = self.accounts.search(&filter, query).await?;
        Ok(PagedResponse::from(page))
    }

    /// Fetch one account. Everyone may read themselves; anything else goes
    /// through the evaluator.
    pub async fn get_user(&self, claims: &Claims, user_id: &str) -> Result<UserDto, ServiceError> {
        if claims.id != user_id
            && !self
                .evaluator
                .can_access(&claims.permissions, ResourceKind::User, user_id)
                .await?
        {
            return Err(ServiceError::Forbidden);
        }
        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(UserDto::from(account))
    }

    /// Remove an account and undo its parent bookkeeping. The removal is
    /// the authoritative step; bookkeeping failures are logged and
    /// absorbed.
    pub async fn delete_user(&self, claims: &Claims, user_id: &str) -> Result<(), ServiceError> {
        if !self
            .evaluator
            .can_access(&claims.permissions, ResourceKind::User, user_id)
            .await?
        {
            return Err(ServiceError::Forbidden);
        }
        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        self.accounts.remove(&account.id).await?;

        let result = match account.kind() {
            AccountKind::Admin => {
                let pull = if account
                    .admin_user_type
                    .eq_ignore_ascii_case(roles::CLIENT_ADMIN)
                {
                    self.tenants
                        .pull_admin_user(&account.client_id, &account.id)
                        .await
                } else {
                    Ok(())
                };
                match pull {
                    Ok(()) => {
                        self.tenants
                            .adjust_client_users(&account.client_id, -1)
                            .await
                    }
                    err => err,
                }
            }
            AccountKind::Site => self.tenants.adjust_site_users(&account.site_id, -1).await,
            AccountKind::Contact => {
                match self
                    .tenants
                    .pull_contact(&account.client_id, &account.id)
                    .await
                {
                    Ok(()) => {
                        self.tenants
                            .adjust_client_users(&account.client_id, -1)
                            .await
                    }
                    err => err,
                }
            }
        };
        if let Err(e) = result {
            tracing::error!(user_id = %account.id, error = %e, "parent bookkeeping failed after user removal");
        }

        tracing::info!(user_id = %account.id, "user deleted");
        Ok(())
    }
}
