use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::permission::{Permission, Status};
use crate::models::{Account, Client, Contact, PagedList};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserDto,
    pub access_token: String,
    pub access_token_expired_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(email)]
    pub email: String,
    pub old_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAccountRequest {
    #[validate(length(min = 1))]
    pub activation_code: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub contact_preference: String,
    /// Only meaningful for group admins; anyone else sending it is rejected.
    #[serde(default)]
    pub site_group_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub contact_preference: String,
    #[validate(length(min = 1))]
    pub client_id: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub admin_user_type: String,
    #[serde(default)]
    pub site_user_type: String,
    #[serde(rename = "siteUserGroup", default)]
    pub site_group_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Outward shape of an account. Password hash, token and activation code
/// never leave the service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub contact_preference: String,
    pub status: Status,
    pub client_id: String,
    pub site_id: String,
    pub admin_user_type: String,
    pub site_user_type: String,
    #[serde(rename = "siteUserGroup")]
    pub site_group_name: String,
    pub permissions: Vec<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<Account> for UserDto {
    fn from(account: Account) -> Self {
        UserDto {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            phone_number: account.phone_number,
            contact_preference: account.contact_preference,
            status: account.status,
            client_id: account.client_id,
            site_id: account.site_id,
            admin_user_type: account.admin_user_type,
            site_user_type: account.site_user_type,
            site_group_name: account.site_group_name,
            permissions: account.permissions,
            last_login_at: account.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: String,
    pub uid: i64,
    pub name: String,
    pub status: Status,
    pub address: String,
    pub number_of_sites: i64,
    pub number_of_users: i64,
    pub number_of_alerts: i64,
    pub contacts: Vec<Contact>,
}

impl From<Client> for ClientDto {
    fn from(client: Client) -> Self {
        ClientDto {
            id: client.id,
            uid: client.uid,
            name: client.name,
            status: client.status,
            address: client.address,
            number_of_sites: client.number_of_sites,
            number_of_users: client.number_of_users,
            number_of_alerts: client.number_of_alerts,
            contacts: client.contacts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T, U: From<T>> From<PagedList<T>> for PagedResponse<U> {
    fn from(list: PagedList<T>) -> Self {
        PagedResponse {
            items: list.items.into_iter().map(U::from).collect(),
            total: list.total,
            page: list.page,
            size: list.size,
        }
    }
}
