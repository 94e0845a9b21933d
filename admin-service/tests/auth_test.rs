mod common;

use admin_service::dtos::ConfirmAccountRequest;
use admin_service::models::permission::Status;
use admin_service::services::error::ServiceError;

use common::*;

#[tokio::test]
async fn login_issues_token_and_stores_it() {
    let harness = harness();
    let user = with_password(super_admin("root@test"), "hunter2-hunter2");
    harness.store.seed_account(user.clone());

    let response = harness
        .state
        .auth
        .login("root@test", "hunter2-hunter2")
        .await
        .unwrap();

    assert!(!response.access_token.is_empty());
    let stored = harness.store.account(&user.id).unwrap();
    assert_eq!(stored.token, response.access_token);
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn second_login_invalidates_the_first_session() {
    let harness = harness();
    let user = with_password(super_admin("root@test"), "hunter2-hunter2");
    harness.store.seed_account(user.clone());

    let first = harness
        .state
        .auth
        .login("root@test", "hunter2-hunter2")
        .await
        .unwrap();
    let second = harness
        .state
        .auth
        .login("root@test", "hunter2-hunter2")
        .await
        .unwrap();

    let stored = harness.store.account(&user.id).unwrap();
    assert_eq!(stored.token, second.access_token);
    assert_ne!(stored.token, first.access_token);
}

#[tokio::test]
async fn login_error_codes_are_distinct() {
    let harness = harness();
    let mut locked = with_password(client_admin("locked@test", &new_id()), "correct-password");
    locked.status = Status::Inactive;
    harness.store.seed_account(locked);
    let root = with_password(super_admin("root@test"), "correct-password");
    harness.store.seed_account(root.clone());

    let err = harness.state.auth.login("", "x").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let err = harness
        .state
        .auth
        .login("ghost@test", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    let err = harness
        .state
        .auth
        .login("root@test", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidPassword));

    // A failed password attempt must not touch the session state.
    let stored = harness.store.account(&root.id).unwrap();
    assert!(stored.token.is_empty());
    assert!(stored.last_login_at.is_none());

    let err = harness
        .state
        .auth
        .login("locked@test", "correct-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccountNotActive));
}

#[tokio::test]
async fn logout_clears_token_and_is_idempotent() {
    let harness = harness();
    let user = with_password(super_admin("root@test"), "hunter2-hunter2");
    harness.store.seed_account(user.clone());

    harness
        .state
        .auth
        .login("root@test", "hunter2-hunter2")
        .await
        .unwrap();
    harness.state.auth.logout(&user.id).await.unwrap();
    assert!(harness.store.account(&user.id).unwrap().token.is_empty());

    // No session open; still fine.
    harness.state.auth.logout(&user.id).await.unwrap();

    let err = harness.state.auth.logout(&new_id()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn change_password_requires_the_old_one() {
    let harness = harness();
    let user = with_password(super_admin("root@test"), "old-password-1");
    harness.store.seed_account(user.clone());

    let err = harness
        .state
        .auth
        .change_password("root@test", "bad-guess", "new-password-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidPassword));

    harness
        .state
        .auth
        .change_password("root@test", "old-password-1", "new-password-1")
        .await
        .unwrap();

    harness
        .state
        .auth
        .login("root@test", "new-password-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn forgot_password_mails_a_code_without_locking_the_account() {
    let harness = harness();
    let user = with_password(super_admin("root@test"), "hunter2-hunter2");
    harness.store.seed_account(user.clone());

    harness.state.auth.forgot_password("root@test").await.unwrap();

    let stored = harness.store.account(&user.id).unwrap();
    assert!(!stored.activation_code.is_empty());
    assert!(harness.notifier.sent_to("root@test"));

    // The old password still works until the code is redeemed.
    harness
        .state
        .auth
        .login("root@test", "hunter2-hunter2")
        .await
        .unwrap();
}

#[tokio::test]
async fn confirm_account_activates_and_consumes_the_code() {
    let harness = harness();
    let mut pending = client_admin("new@test", &new_id());
    pending.status = Status::Inactive;
    pending.activation_code = "code-123".to_string();
    harness.store.seed_account(pending.clone());

    let user = harness
        .state
        .auth
        .confirm_account(ConfirmAccountRequest {
            activation_code: "code-123".to_string(),
            password: "brand-new-pass".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone_number: String::new(),
            contact_preference: String::new(),
            site_group_name: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(user.first_name, "Jane");
    let stored = harness.store.account(&pending.id).unwrap();
    assert_eq!(stored.status, Status::Active);
    assert!(stored.activation_code.is_empty());
    assert!(stored.token.is_empty());

    harness
        .state
        .auth
        .login("new@test", "brand-new-pass")
        .await
        .unwrap();
}

#[tokio::test]
async fn contacts_cannot_be_confirmed() {
    let harness = harness();
    let mut pending = contact("contact@test", &new_id());
    pending.activation_code = "code-456".to_string();
    harness.store.seed_account(pending);

    let err = harness
        .state
        .auth
        .confirm_account(ConfirmAccountRequest {
            activation_code: "code-456".to_string(),
            password: "whatever-pass".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            contact_preference: String::new(),
            site_group_name: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[tokio::test]
async fn confirmation_merges_site_group_for_group_admins() {
    let harness = harness();
    let mut pending = group_admin("ga@test", &new_id(), &[&new_id()]);
    pending.status = Status::Inactive;
    pending.site_group_name = String::new();
    pending.activation_code = "code-ga".to_string();
    harness.store.seed_account(pending.clone());

    harness
        .state
        .auth
        .confirm_account(ConfirmAccountRequest {
            activation_code: "code-ga".to_string(),
            password: "brand-new-pass".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            contact_preference: String::new(),
            site_group_name: "night-shift".to_string(),
        })
        .await
        .unwrap();

    let stored = harness.store.account(&pending.id).unwrap();
    assert_eq!(stored.site_group_name, "night-shift");
}

#[tokio::test]
async fn confirmation_rejects_site_group_for_other_roles() {
    let harness = harness();
    let mut pending = client_admin("csa@test", &new_id());
    pending.status = Status::Inactive;
    pending.activation_code = "code-csa".to_string();
    harness.store.seed_account(pending.clone());

    let err = harness
        .state
        .auth
        .confirm_account(ConfirmAccountRequest {
            activation_code: "code-csa".to_string(),
            password: "brand-new-pass".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            contact_preference: String::new(),
            site_group_name: "night-shift".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    // The rejected request must not have activated the account.
    let stored = harness.store.account(&pending.id).unwrap();
    assert_eq!(stored.status, Status::Inactive);
    assert_eq!(stored.activation_code, "code-csa");
}

#[tokio::test]
async fn phone_preference_requires_a_phone_number() {
    let harness = harness();
    let mut pending = client_admin("new@test", &new_id());
    pending.activation_code = "code-789".to_string();
    harness.store.seed_account(pending);

    let err = harness
        .state
        .auth
        .confirm_account(ConfirmAccountRequest {
            activation_code: "code-789".to_string(),
            password: "brand-new-pass".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            contact_preference: "phone".to_string(),
            site_group_name: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidData(_)));
}
