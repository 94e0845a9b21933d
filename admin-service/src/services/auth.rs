use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dtos::{ConfirmAccountRequest, LoginResponse, UserDto};
use crate::models::Account;
use crate::models::permission::{Status, roles};
use crate::store::AccountStore;
use crate::utils::password::{Password, hash_password, verify_password};

use super::error::ServiceError;
use super::notify::Notifier;
use super::token::SessionTokens;

/// Credential and session lifecycle: login, logout, password changes and
/// account confirmation.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    tokens: SessionTokens,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tokens: SessionTokens,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        AuthService {
            accounts,
            tokens,
            notifier,
        }
    }

    /// Verify credentials and open a session. Issuing a fresh token
    /// overwrites the stored one, so any previous session dies here.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !verify_password(&Password::new(password), &account.password_hash) {
            return Err(ServiceError::InvalidPassword);
        }

        if account.status != Status::Active {
            return Err(ServiceError::AccountNotActive);
        }

        let (token, expires_at) = self.tokens.issue(&account)?;
        let now = Utc::now();
        self.accounts.record_login(&account.id, &token, now).await?;

        tracing::info!(user_id = %account.id, "login succeeded");

        let mut user = account;
        user.last_login_at = Some(now);
        Ok(LoginResponse {
            user: UserDto::from(user),
            access_token: token,
            access_token_expired_at: expires_at,
        })
    }

    /// Drop the stored session token. Safe to call with no session open.
    pub async fn logout(&self, user_id: &str) -> Result<(), ServiceError> {
        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        self.accounts.clear_token(&account.id).await?;
        tracing::info!(user_id = %account.id, "logout");
        Ok(())
    }

    pub async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !verify_password(&Password::new(old_password), &account.password_hash) {
            return Err(ServiceError::InvalidPassword);
        }

        let hash = hash_password(&Password::new(new_password))?;
        let code = Uuid::new_v4().to_string();
        self.accounts.set_password(&account.id, &hash, &code).await?;
        Ok(())
    }

    /// Issue a fresh activation code and mail it. The account keeps working
    /// until the code is used, and a mail failure does not fail the call.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let code = Uuid::new_v4().to_string();
        self.accounts.set_activation_code(&account.id, &code).await?;

        if let Err(e) = self.notifier.send_activation_code(&account.email, &code).await {
            tracing::warn!(user_id = %account.id, error = %e, "activation code delivery failed");
        }
        Ok(())
    }

    /// Redeem an activation code: set the password, fill in profile fields
    /// and activate the account. The code and any open session are consumed.
    pub async fn confirm_account(
        &self,
        request: ConfirmAccountRequest,
    ) -> Result<UserDto, ServiceError> {
        let mut account = self
            .accounts
            .find_by_activation_code(&request.activation_code)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !account.is_confirmable() {
            return Err(ServiceError::BadRequest(
                "account kind cannot be activated".to_string(),
            ));
        }

        apply_profile(&mut account, &request)?;

        account.password_hash = hash_password(&Password::new(request.password.as_str()))?;
        account.activation_code = String::new();
        account.token = String::new();
        account.status = Status::Active;
        account.updated_at = Utc::now();

        self.accounts.replace(&account).await?;
        tracing::info!(user_id = %account.id, "account confirmed");
        Ok(UserDto::from(account))
    }
}

fn apply_profile(
    account: &mut Account,
    request: &ConfirmAccountRequest,
) -> Result<(), ServiceError> {
    if !request.site_group_name.is_empty() {
        if !account.has_role(roles::GROUP_ADMIN) {
            return Err(ServiceError::BadRequest(
                "only group admins carry a site group".to_string(),
            ));
        }
        account.site_group_name = request.site_group_name.clone();
    }
    if !request.first_name.is_empty() {
        account.first_name = request.first_name.clone();
    }
    if !request.last_name.is_empty() {
        account.last_name = request.last_name.clone();
    }
    if !request.phone_number.is_empty() {
        account.phone_number = request.phone_number.clone();
    }
    if !request.contact_preference.is_empty() {
        account.contact_preference = request.contact_preference.clone();
    }
    if account.contact_preference == "phone" && account.phone_number.is_empty() {
        return Err(ServiceError::InvalidData(
            "phone preference requires a phone number".to_string(),
        ));
    }
    Ok(())
}
