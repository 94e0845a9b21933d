use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc},
    options::{FindOptions, IndexOptions},
};

use crate::models::permission::Status;
use crate::models::{Account, Client, Contact, PagedList, Site};
use crate::services::error::ServiceError;
use crate::services::scope::{
    CLIENT_SORT_FIELDS, DEFAULT_CLIENT_SORT, DEFAULT_USER_SORT, ScopeFilter, SearchQuery,
    USER_SORT_FIELDS,
};

use super::{AccountStore, TenantStore};

const USER_KEYWORD_FIELDS: &[&str] = &["email", "firstName", "lastName"];
const CLIENT_KEYWORD_FIELDS: &[&str] = &["name", "address"];

/// MongoDB-backed store. This is the only module that knows how scope
/// filters and search queries look as bson.
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            ServiceError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        tracing::info!("Creating MongoDB indexes for admin-service");

        let accounts = self.accounts();

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        accounts.create_index(email_index, None).await?;

        let token_index = IndexModel::builder()
            .keys(doc! { "token": 1 })
            .options(
                IndexOptions::builder()
                    .name("token_lookup".to_string())
                    .build(),
            )
            .build();
        accounts.create_index(token_index, None).await?;

        let tenant_index = IndexModel::builder()
            .keys(doc! { "clientId": 1, "siteId": 1 })
            .options(
                IndexOptions::builder()
                    .name("tenant_lookup".to_string())
                    .build(),
            )
            .build();
        accounts.create_index(tenant_index, None).await?;

        let site_client_index = IndexModel::builder()
            .keys(doc! { "clientId": 1, "siteGroup": 1 })
            .options(
                IndexOptions::builder()
                    .name("site_group_lookup".to_string())
                    .build(),
            )
            .build();
        self.sites().create_index(site_client_index, None).await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub fn accounts(&self) -> Collection<Account> {
        self.db.collection("users")
    }

    pub fn clients(&self) -> Collection<Client> {
        self.db.collection("clients")
    }

    pub fn sites(&self) -> Collection<Site> {
        self.db.collection("sites")
    }
}

fn status_bson(status: Status) -> Bson {
    Bson::String(status.as_str().to_string())
}

/// Visibility clause for accounts: client membership, site membership, or
/// (for group admins) contact-hood of their own client.
fn account_scope_clause(filter: &ScopeFilter) -> Option<Document> {
    match filter {
        ScopeFilter::All => None,
        ScopeFilter::Scoped {
            client_ids,
            site_ids,
            contacts_of_client,
        } => {
            let mut branches: Vec<Document> = vec![];
            if !client_ids.is_empty() {
                branches.push(doc! { "clientId": { "$in": client_ids.clone() } });
            }
            if !site_ids.is_empty() {
                branches.push(doc! { "siteId": { "$in": site_ids.clone() } });
            }
            if let Some(client_id) = contacts_of_client {
                branches.push(doc! {
                    "clientId": client_id.clone(),
                    "adminUserType": "",
                    "siteUserType": "",
                });
            }
            if branches.is_empty() {
                // No grants at all: match nothing.
                Some(doc! { "_id": { "$in": Bson::Array(vec![]) } })
            } else {
                Some(doc! { "$or": branches })
            }
        }
    }
}

fn keyword_clause(query: &SearchQuery, fields: &[&str]) -> Option<Document> {
    let tokens = query.keyword_tokens();
    if tokens.is_empty() {
        return None;
    }
    let mut branches: Vec<Document> = vec![];
    for token in &tokens {
        let escaped = regex_escape(token);
        for field in fields {
            branches.push(doc! { *field: { "$regex": &escaped, "$options": "i" } });
        }
    }
    Some(doc! { "$or": branches })
}

fn regex_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if r".^$*+?()[]{}|\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn find_options(query: &SearchQuery, sort_field: &str) -> FindOptions {
    let direction = if query.ascending() { 1 } else { -1 };
    FindOptions::builder()
        .sort(doc! { sort_field: direction })
        .skip(query.skip())
        .limit(query.size() as i64)
        .build()
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self.accounts().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .accounts()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .accounts()
            .find_one(doc! { "token": token }, None)
            .await?)
    }

    async fn find_by_activation_code(
        &self,
        code: &str,
    ) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .accounts()
            .find_one(doc! { "activationCode": code }, None)
            .await?)
    }

    async fn insert(&self, account: &Account) -> Result<(), ServiceError> {
        self.accounts().insert_one(account, None).await?;
        Ok(())
    }

    async fn replace(&self, account: &Account) -> Result<(), ServiceError> {
        self.accounts()
            .replace_one(doc! { "_id": &account.id }, account, None)
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), ServiceError> {
        self.accounts().delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: &str,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.accounts()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "token": token,
                    "lastLoginAt": bson::DateTime::from_chrono(at),
                    "updatedAt": bson::DateTime::from_chrono(at),
                } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn clear_token(&self, id: &str) -> Result<(), ServiceError> {
        self.accounts()
            .update_one(doc! { "_id": id }, doc! { "$set": { "token": "" } }, None)
            .await?;
        Ok(())
    }

    async fn set_password(&self, id: &str, hash: &str, code: &str) -> Result<(), ServiceError> {
        self.accounts()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "password": hash, "activationCode": code } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn set_activation_code(&self, id: &str, code: &str) -> Result<(), ServiceError> {
        self.accounts()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "activationCode": code } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn count_role_in_client(
        &self,
        client_id: &str,
        role_tag: &str,
    ) -> Result<u64, ServiceError> {
        let count = self
            .accounts()
            .count_documents(
                doc! { "clientId": client_id, "adminUserType": role_tag },
                None,
            )
            .await?;
        Ok(count)
    }

    async fn deactivate_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        self.accounts()
            .update_many(
                doc! { "clientId": client_id },
                doc! { "$set": {
                    "status": status_bson(Status::Inactive),
                    "token": "",
                } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn remove_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        self.accounts()
            .delete_many(doc! { "clientId": client_id }, None)
            .await?;
        Ok(())
    }

    async fn search(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Account>, ServiceError> {
        let mut conditions: Vec<Document> = vec![];
        if let Some(scope) = account_scope_clause(filter) {
            conditions.push(scope);
        }
        // Users default to showing active accounts only.
        let status = query.status.unwrap_or(Status::Active);
        conditions.push(doc! { "status": status_bson(status) });
        if let Some(role) = query.role.as_deref() {
            conditions.push(doc! { "$or": [
                { "adminUserType": role },
                { "siteUserType": role },
            ] });
        }
        if let Some(keyword) = keyword_clause(query, USER_KEYWORD_FIELDS) {
            conditions.push(keyword);
        }
        let selector = doc! { "$and": conditions };

        let total = self
            .accounts()
            .count_documents(selector.clone(), None)
            .await?;
        let sort_field = query.sort_field(USER_SORT_FIELDS, DEFAULT_USER_SORT);
        let cursor = self
            .accounts()
            .find(selector, find_options(query, &sort_field))
            .await?;
        let items: Vec<Account> = cursor.try_collect().await?;

        Ok(PagedList {
            items,
            total,
            page: query.page(),
            size: query.size(),
        })
    }
}

#[async_trait]
impl TenantStore for MongoStore {
    async fn find_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(self.clients().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_live_client(&self, id: &str) -> Result<Option<Client>, ServiceError> {
        Ok(self
            .clients()
            .find_one(
                doc! { "_id": id, "status": { "$ne": status_bson(Status::Archive) } },
                None,
            )
            .await?)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), ServiceError> {
        self.clients().insert_one(client, None).await?;
        Ok(())
    }

    async fn archive_client(&self, id: &str) -> Result<(), ServiceError> {
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "status": status_bson(Status::Archive) } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn remove_client(&self, id: &str) -> Result<(), ServiceError> {
        self.clients().delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    async fn next_client_uid(&self) -> Result<i64, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "uid": -1 })
            .limit(1)
            .build();
        let mut cursor = self.clients().find(doc! {}, options).await?;
        let max = match cursor.try_next().await? {
            Some(client) => client.uid,
            None => 0,
        };
        Ok(max + 1)
    }

    async fn adjust_client_users(&self, id: &str, delta: i64) -> Result<(), ServiceError> {
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "numberOfUsers": delta } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn push_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError> {
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$addToSet": { "adminUserIds": user_id } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn pull_admin_user(&self, id: &str, user_id: &str) -> Result<(), ServiceError> {
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$pull": { "adminUserIds": user_id } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn push_contact(&self, id: &str, contact: &Contact) -> Result<(), ServiceError> {
        let contact_doc = bson::to_document(contact).map_err(anyhow::Error::new)?;
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$push": { "contacts": contact_doc } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn pull_contact(&self, id: &str, contact_id: &str) -> Result<(), ServiceError> {
        self.clients()
            .update_one(
                doc! { "_id": id },
                doc! { "$pull": { "contacts": { "id": contact_id } } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn search_clients(
        &self,
        filter: &ScopeFilter,
        query: &SearchQuery,
    ) -> Result<PagedList<Client>, ServiceError> {
        let mut conditions: Vec<Document> = vec![];
        match filter {
            ScopeFilter::All => {}
            ScopeFilter::Scoped { client_ids, .. } => {
                conditions.push(doc! { "_id": { "$in": client_ids.clone() } });
            }
        }
        // Clients default to hiding archived tenants.
        match query.status {
            Some(status) => conditions.push(doc! { "status": status_bson(status) }),
            None => {
                conditions.push(doc! { "status": { "$ne": status_bson(Status::Archive) } })
            }
        }
        if let Some(keyword) = keyword_clause(query, CLIENT_KEYWORD_FIELDS) {
            conditions.push(keyword);
        }
        let selector = if conditions.is_empty() {
            doc! {}
        } else {
            doc! { "$and": conditions }
        };

        let total = self
            .clients()
            .count_documents(selector.clone(), None)
            .await?;
        let sort_field = query.sort_field(CLIENT_SORT_FIELDS, DEFAULT_CLIENT_SORT);
        let cursor = self
            .clients()
            .find(selector, find_options(query, &sort_field))
            .await?;
        let items: Vec<Client> = cursor.try_collect().await?;

        Ok(PagedList {
            items,
            total,
            page: query.page(),
            size: query.size(),
        })
    }

    async fn find_site(&self, id: &str) -> Result<Option<Site>, ServiceError> {
        Ok(self.sites().find_one(doc! { "_id": id }, None).await?)
    }

    async fn site_ids_in_group(
        &self,
        client_id: &str,
        group_name: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let cursor = self
            .sites()
            .find(doc! { "clientId": client_id, "siteGroup": group_name }, None)
            .await?;
        let sites: Vec<Site> = cursor.try_collect().await?;
        Ok(sites.into_iter().map(|s| s.id).collect())
    }

    async fn adjust_site_users(&self, site_id: &str, delta: i64) -> Result<(), ServiceError> {
        self.sites()
            .update_one(
                doc! { "_id": site_id },
                doc! { "$inc": { "numberOfUsers": delta } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn remove_sites_by_client(&self, client_id: &str) -> Result<(), ServiceError> {
        self.sites()
            .delete_many(doc! { "clientId": client_id }, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl super::HealthCheck for MongoStore {
    async fn check(&self) -> Result<(), ServiceError> {
        self.health_check().await
    }
}
