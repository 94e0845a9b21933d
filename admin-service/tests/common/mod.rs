#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use admin_service::models::permission::{Permission, Scope, Status, roles};
use admin_service::models::{Account, Client, Site};
use admin_service::services::notify::MockNotifier;
use admin_service::services::token::SessionTokens;
use admin_service::startup::AppState;
use admin_service::store::memory::MemoryStore;
use admin_service::utils::password::{Password, hash_password};

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MockNotifier>,
    pub tokens: SessionTokens,
}

pub fn harness() -> TestHarness {
    harness_with_validity(60)
}

pub fn harness_with_validity(validity_minutes: i64) -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MockNotifier::new());
    let tokens = SessionTokens::new(validity_minutes);
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        notifier.clone(),
        tokens.clone(),
    );
    TestHarness {
        state,
        store,
        notifier,
        tokens,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn account(email: &str) -> Account {
    let now = Utc::now();
    Account {
        id: new_id(),
        email: email.to_string(),
        password_hash: String::new(),
        status: Status::Active,
        token: String::new(),
        activation_code: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        phone_number: String::new(),
        contact_preference: String::new(),
        client_id: String::new(),
        site_id: String::new(),
        admin_user_type: String::new(),
        site_user_type: String::new(),
        site_group_name: String::new(),
        permissions: vec![],
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

pub fn with_password(mut account: Account, password: &str) -> Account {
    account.password_hash = hash_password(&Password::new(password)).unwrap();
    account
}

pub fn super_admin(email: &str) -> Account {
    let mut account = account(email);
    account.admin_user_type = roles::SUPER_ADMIN.to_string();
    account.permissions = vec![Permission::new(roles::SUPER_ADMIN, vec![])];
    account
}

pub fn client_admin(email: &str, client_id: &str) -> Account {
    let mut account = account(email);
    account.client_id = client_id.to_string();
    account.admin_user_type = roles::CLIENT_ADMIN.to_string();
    account.permissions = vec![Permission::new(
        roles::CLIENT_ADMIN,
        vec![Scope::new(
            vec!["client".to_string()],
            vec![client_id.to_string()],
        )],
    )];
    account
}

pub fn site_manager(email: &str, client_id: &str, site_id: &str) -> Account {
    let mut account = account(email);
    account.client_id = client_id.to_string();
    account.site_id = site_id.to_string();
    account.site_user_type = roles::SITE_MANAGER.to_string();
    account.permissions = vec![Permission::new(
        roles::SITE_MANAGER,
        vec![Scope::new(
            vec!["site".to_string()],
            vec![site_id.to_string()],
        )],
    )];
    account
}

pub fn group_admin(email: &str, client_id: &str, site_ids: &[&str]) -> Account {
    let mut account = account(email);
    account.client_id = client_id.to_string();
    account.admin_user_type = roles::GROUP_ADMIN.to_string();
    account.site_group_name = "group-a".to_string();
    account.permissions = vec![Permission::new(
        roles::GROUP_ADMIN,
        vec![Scope::new(
            vec!["site".to_string()],
            site_ids.iter().map(|s| s.to_string()).collect(),
        )],
    )];
    account
}

pub fn contact(email: &str, client_id: &str) -> Account {
    let mut account = account(email);
    account.client_id = client_id.to_string();
    account
}

pub fn client(name: &str) -> Client {
    let now = Utc::now();
    Client {
        id: new_id(),
        uid: 1,
        name: name.to_string(),
        status: Status::Active,
        address: String::new(),
        number_of_sites: 0,
        number_of_users: 0,
        number_of_alerts: 0,
        admin_user_ids: vec![],
        contacts: vec![],
        created_at: now,
        updated_at: now,
    }
}

pub fn site(client_id: &str, name: &str) -> Site {
    let now = Utc::now();
    Site {
        id: new_id(),
        client_id: client_id.to_string(),
        name: name.to_string(),
        site_group_name: String::new(),
        number_of_users: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn claims_for(account: &Account) -> admin_service::models::permission::Claims {
    admin_service::models::permission::Claims {
        id: account.id.clone(),
        email: account.email.clone(),
        permissions: account.permissions.clone(),
        client_id: account.client_id.clone(),
        site_id: account.site_id.clone(),
        iat: Utc::now().timestamp(),
        jti: new_id(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
    }
}
