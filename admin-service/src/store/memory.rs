use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::permission::Status;
use crate::models::{Account, Client, Contact, PagedList, Site};
use crate::services::error::ServiceError;
use crate::services::scope::{
    CLIENT_SORT_FIELDS, DEFAULT_CLIENT_SORT, DEFAULT_USER_SORT, ScopeFilter, SearchQuery,
    USER_SORT_FIELDS,
};

use super::{AccountStore, TenantStore};

/// In-memory store used by the test suite. Matching semantics mirror the
/// mongo translation field for field.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, Account>>,
    clients: Mutex<HashMap<String, Client>>,
    sites: Mutex<HashMap<String, Site>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_account(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }

    pub fn seed_client(&self, client: Client) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), client);
    }

    pub fn seed_site(&self, site: Site) {
        self.sites.lock().unwrap().insert(site.id.clone(), site);
    }

    pub fn account(&self, id: &str) -> Option<Account> {
        self.accounts.lock().unwrap().get(id).cloned()
    }

    pub fn client(&self, id: &str) -> Option<Client> {
        self.clients.lock().unwrap().get(id).cloned()
    }

    pub fn site(&self, id: &str) -> Option<Site> {
        self.sites.lock().unwrap().get(id).cloned()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_keyword(query: &SearchQuery, fields: &[&str]) -> bool {
    // Caller passes the already-extracted field values.
    let tokens = query.keyword_tokens();
    tokens.is_empty() || tokens.iter().any(|t| fields.iter().any(|f| contains_ci(f, t)))
}

fn paginate<T: Clone>(mut items: Vec<T>, query: &SearchQuery) -> PagedList<T> {
    let total = items.len() as u64;
    let skip = query.skip() as usize;
    let size = query.size() as usize;
    items = if skip >= items.len() {
        vec![]
    } else {
        items[skip..(skip + size).min(items.len())].to_vec()
    };
    PagedList {
        items,
        total,
        page: query.page(),
        size: query.size(),
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self.account(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, ServiceError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.token == token)
            .cloned())
    }

    async fn find_by_activation_code(
        &self,
        code: &str,
    ) -> Result<Option<Account>, ServiceError> {
        if code.is_empty() {
            return Ok(None);
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.activation_code == code)
            .cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), ServiceError> {
        self.seed_account(account.clone());
        Ok(())
    }

    async fn replace(&self, account: &Account) -> Result<(), ServiceError> {
        self.seed_account(account.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        self.accounts.lock().unwrap().remove(id);
        Ok(())
    }

    async fn record_login(
        &self,
        id: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.token = token.to_string();
            account.last_login_at = Some(at);
            account.updated_at = at;
        }
        Ok(())
    }

    async fn clear_token(&self, id: &str) -> Result<(), ServiceError> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.token = String::new();
        }
        Ok(())
    }

    async fn set_password(&self, id: &str, hash: &str, code: &str) -> Result<(), ServiceError> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.password_hash = hash.to_string();
            account.activation_code = code.to_string();
        }
        Ok(())
    }

    async fn set_activation_code(&self, id: &str, code: &str) -> Result<(), ServiceError> {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(id) {
            account.activation_code = code.to_string();
        }
        Ok(())
    }

    async fn count_role_in_client(
        &self,
        client_id: &str,
        role_tag: &str,
    ) -> Result<u64, ServiceError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.client_id == client_id && a.admin_user_type == role_tag)
            .count() as u64)
    }

    async fn deactivate_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        for account in self.accounts.lock().unwrap().values_mut() {
            if account.client_id == client_id {
                account.status = Status::Inactive;
                account.token = String::new();
            }
        }
        Ok(())
    }

    async fn remove_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        self.accounts
            .lock()
            .unwrap()
            .retain(|_, a| a.client_id != client_id);
        Ok(())
    }

    async fn search(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Account>, ServiceError> {
        let status = query.status.unwrap_or(Status::Active);
        let mut matched: Vec<Account> = self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| filter.matches_account(a))
            .filter(|a| a.status == status)
            .filter(|a| match query.role.as_deref() {
                Some(role) => a.admin_user_type == role || a.site_user_type == role,
                None => true,
            })
            .filter(|a| {
                matches_keyword(
                    query,
                    &[a.email.as_str(), a.first_name.as_str(), a.last_name.as_str()],
                )
            })
            .cloned()
            .collect();

        let field = query.sort_field(USER_SORT_FIELDS, DEFAULT_USER_SORT);
        matched.sort_by(|a, b| {
            let ordering = match field.as_str() {
                "email" => a.email.cmp(&b.email),
                _ => a.status.as_str().cmp(b.status.as_str()),
            };
            if query.ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        });

        Ok(paginate(matched, query))
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(self.client(id))
    }

    async fn find_live_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(self.client(id).filter(Client::is_live))
    }

    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError> {
        self.seed_client(client.clone());
        Ok(())
    }

    async fn archive_client(&self, id: &str) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            client.status = Status::Archive;
        }
        Ok(())
    }

    async fn remove_client(&self, id: &str) -> Result<(), ServiceError> {
        self.clients.lock().unwrap().remove(id);
        Ok(())
    }

    async fn next_client_uid(&self) -> Result<i64, ServiceError> {
        let max = self
            .clients
            .lock()
            .unwrap()
            .values()
            .map(|c| c.uid)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn adjust_client_users(&self, id: &str, delta: i64) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            client.number_of_users += delta;
        }
        Ok(())
    }

    async fn push_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            if !client.admin_user_ids.iter().any(|u| u == user_id) {
                client.admin_user_ids.push(user_id.to_string());
            }
        }
        Ok(())
    }

    async fn pull_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            client.admin_user_ids.retain(|u| u != user_id);
        }
        Ok(())
    }

    async fn push_contact(&self, id: &str, contact: &Contact) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            client.contacts.push(contact.clone());
        }
        Ok(())
    }

    async fn pull_contact(&self, id: &str, contact_id: &str) -> Result<(), ServiceError> {
        if let Some(client) = self.clients.lock().unwrap().get_mut(id) {
            client.contacts.retain(|c| c.id != contact_id);
        }
        Ok(())
    }

    async fn search_clients(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Client>, ServiceError> {
        let mut matched: Vec<Client> = self
            .clients
            .lock()
            .unwrap()
            .values()
            .filter(|c| filter.matches_client(c))
            .filter(|c| match query.status {
                Some(status) => c.status == status,
                None => c.is_live(),
            })
            .filter(|c| matches_keyword(query, &[c.name.as_str(), c.address.as_str()]))
            .cloned()
            .collect();

        let field = query.sort_field(CLIENT_SORT_FIELDS, DEFAULT_CLIENT_SORT);
        matched.sort_by(|a, b| {
            let ordering = match field.as_str() {
                "name" => a.name.cmp(&b.name),
                "numberOfSites" => a.number_of_sites.cmp(&b.number_of_sites),
                "numberOfUsers" => a.number_of_users.cmp(&b.number_of_users),
                "numberOfAlerts" => a.number_of_alerts.cmp(&b.number_of_alerts),
                _ => a.uid.cmp(&b.uid),
            };
            if query.ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        });

        Ok(paginate(matched, query))
    }

    async fn find_site(&self, id: &str) -> Result<Option<Site>, ServiceError> {
        Ok(self.site(id))
    }

    async fn site_ids_in_group(
        &self,
        client_id: &str,
        group_name: &str,
    ) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .sites
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.client_id == client_id && s.site_group_name == group_name)
            .map(|s| s.id.clone())
            .collect())
    }

    async fn adjust_site_users(&self, site_id: &str, delta: i64) -> Result<(), ServiceError> {
        if let Some(site) = self.sites.lock().unwrap().get_mut(site_id) {
            site.number_of_users += delta;
        }
        Ok(())
    }

    async fn remove_sites_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        self.sites
            .lock()
            .unwrap()
            .retain(|_, s| s.client_id != client_id);
        Ok(())
    }
}

#[async_trait]
impl super::HealthCheck for MemoryStore {
    async fn check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
