mod common;

use admin_service::models::permission::Status;
use admin_service::services::error::ServiceError;

use common::*;

#[tokio::test]
async fn archiving_a_client_revokes_every_session_first() {
    let harness = harness();
    let tenant = client("acme");
    let s = site(&tenant.id, "plant-1");
    harness.store.seed_client(tenant.clone());
    harness.store.seed_site(s.clone());

    let admin = with_password(client_admin("admin@acme", &tenant.id), "password-one");
    let worker = with_password(
        site_manager("worker@acme", &tenant.id, &s.id),
        "password-two",
    );
    harness.store.seed_account(admin.clone());
    harness.store.seed_account(worker.clone());

    // Open sessions for both.
    harness
        .state
        .auth
        .login("admin@acme", "password-one")
        .await
        .unwrap();
    harness
        .state
        .auth
        .login("worker@acme", "password-two")
        .await
        .unwrap();

    harness.state.clients.archive_client(&tenant.id).await.unwrap();

    for id in [&admin.id, &worker.id] {
        let stored = harness.store.account(id).unwrap();
        assert_eq!(stored.status, Status::Inactive);
        assert!(stored.token.is_empty());
    }
    assert_eq!(
        harness.store.client(&tenant.id).unwrap().status,
        Status::Archive
    );

    // Logins are dead from here on.
    let err = harness
        .state
        .auth
        .login("admin@acme", "password-one")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccountNotActive));
}

#[tokio::test]
async fn archiving_twice_is_not_found_the_second_time() {
    let harness = harness();
    let tenant = client("acme");
    harness.store.seed_client(tenant.clone());

    harness.state.clients.archive_client(&tenant.id).await.unwrap();
    let err = harness
        .state
        .clients
        .archive_client(&tenant.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
async fn archived_client_stays_readable() {
    let harness = harness();
    let tenant = client("acme");
    harness.store.seed_client(tenant.clone());
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());

    harness.state.clients.archive_client(&tenant.id).await.unwrap();

    let fetched = harness
        .state
        .clients
        .get_client(&claims_for(&admin), &tenant.id)
        .await
        .unwrap();
    assert_eq!(fetched.status, Status::Archive);
}

#[tokio::test]
async fn deleting_a_client_removes_users_sites_then_the_client() {
    let harness = harness();
    let tenant = client("acme");
    let other = client("globex");
    let s = site(&tenant.id, "plant-1");
    let other_site = site(&other.id, "hq");
    harness.store.seed_client(tenant.clone());
    harness.store.seed_client(other.clone());
    harness.store.seed_site(s.clone());
    harness.store.seed_site(other_site.clone());

    let doomed = client_admin("admin@acme", &tenant.id);
    let survivor = client_admin("admin@globex", &other.id);
    harness.store.seed_account(doomed.clone());
    harness.store.seed_account(survivor.clone());

    harness.state.clients.delete_client(&tenant.id).await.unwrap();

    assert!(harness.store.account(&doomed.id).is_none());
    assert!(harness.store.site(&s.id).is_none());
    assert!(harness.store.client(&tenant.id).is_none());

    // Unrelated tenants are untouched.
    assert!(harness.store.account(&survivor.id).is_some());
    assert!(harness.store.site(&other_site.id).is_some());
    assert!(harness.store.client(&other.id).is_some());
}

#[tokio::test]
async fn deleting_a_user_undoes_parent_bookkeeping() {
    let harness = harness();
    let mut tenant = client("acme");
    tenant.number_of_users = 1;
    let s = site(&tenant.id, "plant-1");
    harness.store.seed_client(tenant.clone());
    harness.store.seed_site(s.clone());

    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());
    let target = client_admin("csa@acme", &tenant.id);
    harness.store.seed_account(target.clone());

    harness
        .state
        .users
        .delete_user(&claims_for(&admin), &target.id)
        .await
        .unwrap();

    assert!(harness.store.account(&target.id).is_none());
    let stored = harness.store.client(&tenant.id).unwrap();
    assert_eq!(stored.number_of_users, 0);
    assert!(!stored.admin_user_ids.contains(&target.id));
}

#[tokio::test]
async fn delete_user_without_reach_is_forbidden() {
    let harness = harness();
    let c1 = client("acme");
    let c2 = client("globex");
    harness.store.seed_client(c1.clone());
    harness.store.seed_client(c2.clone());
    let caller = client_admin("admin@acme", &c1.id);
    let target = client_admin("admin@globex", &c2.id);
    harness.store.seed_account(caller.clone());
    harness.store.seed_account(target.clone());

    let err = harness
        .state
        .users
        .delete_user(&claims_for(&caller), &target.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));
    assert!(harness.store.account(&target.id).is_some());
}
