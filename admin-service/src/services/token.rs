use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::permission::Claims;
use crate::models::Account;

use super::error::ServiceError;

/// Issues and verifies HS256 session tokens.
///
/// The signing key for each token is derived from the id of the account the
/// token belongs to, so verification requires resolving the account first.
/// This is deliberately compatible with the data this service inherits; the
/// account id is not a high-entropy secret, and deployments that do not need
/// wire compatibility should front this with a real key.
#[derive(Clone)]
pub struct SessionTokens {
    validity_minutes: i64,
}

fn derive_key(account_id: &str) -> &[u8] {
    account_id.as_bytes()
}

impl SessionTokens {
    pub fn new(validity_minutes: i64) -> Self {
        SessionTokens { validity_minutes }
    }

    /// Mint a token for the account. Returns the encoded token and its
    /// expiry instant.
    pub fn issue(&self, account: &Account) -> Result<(String, DateTime<Utc>), ServiceError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.validity_minutes);
        let claims = Claims {
            id: account.id.clone(),
            email: account.email.clone(),
            permissions: account.permissions.clone(),
            client_id: account.client_id.clone(),
            site_id: account.site_id.clone(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(derive_key(&account.id)),
        )
        .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;

        Ok((token, expires_at))
    }

    /// Decode and verify a token against the account it claims to belong
    /// to. Expiry is checked by the caller so an expired token gets its own
    /// error code; any signature or shape problem is a plain authorization
    /// failure.
    pub fn decode(&self, token: &str, account_id: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(derive_key(account_id)),
            &validation,
        )
        .map_err(|_| ServiceError::Unauthorized)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::{Permission, Scope, Status, roles};

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            email: "user@example.com".to_string(),
            password_hash: String::new(),
            status: Status::Active,
            token: String::new(),
            activation_code: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            contact_preference: String::new(),
            client_id: "c1".to_string(),
            site_id: "s1".to_string(),
            admin_user_type: String::new(),
            site_user_type: roles::SITE_MANAGER.to_string(),
            site_group_name: String::new(),
            permissions: vec![Permission::new(
                roles::SITE_MANAGER,
                vec![Scope::new(vec!["site".to_string()], vec!["s1".to_string()])],
            )],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn issue_then_decode_round_trips_claims() {
        let tokens = SessionTokens::new(60);
        let account = account("11111111-1111-1111-1111-111111111111");
        let (token, expires_at) = tokens.issue(&account).unwrap();

        let claims = tokens.decode(&token, &account.id).unwrap();
        assert_eq!(claims.id, account.id);
        assert_eq!(claims.email, account.email);
        assert_eq!(claims.client_id, "c1");
        assert_eq!(claims.site_id, "s1");
        assert_eq!(claims.permissions, account.permissions);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn back_to_back_issues_mint_distinct_tokens() {
        // Both issues land within the same second, so the claims would be
        // byte-identical without a per-token id, and the stored token from
        // the first login would still match after the second.
        let tokens = SessionTokens::new(60);
        let account = account("account-a");
        let (first, _) = tokens.issue(&account).unwrap();
        let (second, _) = tokens.issue(&account).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_account_key_fails_verification() {
        let tokens = SessionTokens::new(60);
        let (token, _) = tokens.issue(&account("account-a")).unwrap();
        let err = tokens.decode(&token, "account-b").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = SessionTokens::new(60);
        let account = account("account-a");
        let (token, _) = tokens.issue(&account).unwrap();
        let tampered = format!("{}x", token);
        assert!(tokens.decode(&tampered, &account.id).is_err());
    }

    #[test]
    fn expired_token_still_decodes() {
        // Expiry is enforced a layer up; the decoder only checks the
        // signature.
        let tokens = SessionTokens::new(-5);
        let account = account("account-a");
        let (token, expires_at) = tokens.issue(&account).unwrap();
        assert!(expires_at < Utc::now());
        let claims = tokens.decode(&token, &account.id).unwrap();
        assert!(claims.exp < Utc::now().timestamp());
    }
}
