mod common;

use admin_service::models::permission::Status;
use admin_service::services::scope::SearchQuery;

use common::*;

#[tokio::test]
async fn super_admin_search_sees_all_active_users() {
    let harness = harness();
    let c1 = client("acme");
    let c2 = client("globex");
    harness.store.seed_account(client_admin("a@acme", &c1.id));
    harness.store.seed_account(client_admin("b@globex", &c2.id));
    let mut inactive = client_admin("c@acme", &c1.id);
    inactive.status = Status::Inactive;
    harness.store.seed_account(inactive);
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());

    let page = harness
        .state
        .users
        .search_users(&claims_for(&admin), &SearchQuery::default())
        .await
        .unwrap();

    // Active is the default status filter; the inactive account is hidden.
    assert_eq!(page.total, 3);
    assert!(page.items.iter().all(|u| u.status == Status::Active));
}

#[tokio::test]
async fn explicit_status_overrides_the_default() {
    let harness = harness();
    let c1 = client("acme");
    harness.store.seed_account(client_admin("a@acme", &c1.id));
    let mut inactive = client_admin("c@acme", &c1.id);
    inactive.status = Status::Inactive;
    harness.store.seed_account(inactive);
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());

    let query = SearchQuery {
        status: Some(Status::Inactive),
        ..Default::default()
    };
    let page = harness
        .state
        .users
        .search_users(&claims_for(&admin), &query)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].email, "c@acme");
}

#[tokio::test]
async fn client_admin_search_is_fenced_to_their_client() {
    let harness = harness();
    let c1 = client("acme");
    let c2 = client("globex");
    let caller = client_admin("admin@acme", &c1.id);
    harness.store.seed_account(caller.clone());
    harness.store.seed_account(client_admin("peer@acme", &c1.id));
    harness.store.seed_account(client_admin("other@globex", &c2.id));

    let page = harness
        .state
        .users
        .search_users(&claims_for(&caller), &SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|u| u.client_id == c1.id));
}

#[tokio::test]
async fn group_admin_sees_snapshot_sites_and_own_client_contacts() {
    let harness = harness();
    let c1 = client("acme");
    let s1 = site(&c1.id, "plant-1");
    let s2 = site(&c1.id, "plant-2");
    let caller = group_admin("ga@acme", &c1.id, &[&s1.id]);
    harness.store.seed_account(caller.clone());
    harness
        .store
        .seed_account(site_manager("sm1@acme", &c1.id, &s1.id));
    harness
        .store
        .seed_account(site_manager("sm2@acme", &c1.id, &s2.id));
    harness.store.seed_account(contact("cc@acme", &c1.id));
    harness.store.seed_account(client_admin("csa@acme", &c1.id));

    let page = harness
        .state
        .users
        .search_users(&claims_for(&caller), &SearchQuery::default())
        .await
        .unwrap();

    let emails: Vec<&str> = page.items.iter().map(|u| u.email.as_str()).collect();
    // Snapshot covers s1 only; contacts of the own client ride along, but
    // admins and users of unsnapshotted sites stay invisible.
    assert!(emails.contains(&"sm1@acme"));
    assert!(emails.contains(&"cc@acme"));
    assert!(!emails.contains(&"sm2@acme"));
    assert!(!emails.contains(&"csa@acme"));
}

#[tokio::test]
async fn no_grants_yield_an_empty_page_not_everything() {
    let harness = harness();
    harness.store.seed_account(client_admin("x@acme", &new_id()));
    let caller = contact("cc@nowhere", "");
    harness.store.seed_account(caller.clone());

    let page = harness
        .state
        .users
        .search_users(&claims_for(&caller), &SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn role_filter_narrows_user_search() {
    let harness = harness();
    let c1 = client("acme");
    let s1 = site(&c1.id, "plant-1");
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());
    harness.store.seed_account(client_admin("csa@acme", &c1.id));
    harness
        .store
        .seed_account(site_manager("sm@acme", &c1.id, &s1.id));

    let query = SearchQuery {
        role: Some("SM".to_string()),
        ..Default::default()
    };
    let page = harness
        .state
        .users
        .search_users(&claims_for(&admin), &query)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].email, "sm@acme");
}

#[tokio::test]
async fn keyword_matches_tokens_case_insensitively() {
    let harness = harness();
    let c1 = client("acme");
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());
    let mut jane = client_admin("jane@acme", &c1.id);
    jane.first_name = "Jane".to_string();
    jane.last_name = "Doe".to_string();
    harness.store.seed_account(jane);
    harness.store.seed_account(client_admin("bob@acme", &c1.id));

    let query = SearchQuery {
        keyword: Some("DOE jane".to_string()),
        ..Default::default()
    };
    let page = harness
        .state
        .users
        .search_users(&claims_for(&admin), &query)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].email, "jane@acme");
}

#[tokio::test]
async fn pagination_clamps_and_pages() {
    let harness = harness();
    let c1 = client("acme");
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());
    for i in 0..5 {
        harness
            .store
            .seed_account(client_admin(&format!("u{i}@acme"), &c1.id));
    }

    let query = SearchQuery {
        page: Some(2),
        page_size: Some(3),
        sort_by: Some("email".to_string()),
        sort_order: Some("asc".to_string()),
        ..Default::default()
    };
    let page = harness
        .state
        .users
        .search_users(&claims_for(&admin), &query)
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.page, 2);
}

#[tokio::test]
async fn client_search_defaults_hide_archived() {
    let harness = harness();
    let live = client("acme");
    let mut gone = client("globex");
    gone.status = Status::Archive;
    harness.store.seed_client(live.clone());
    harness.store.seed_client(gone.clone());
    let admin = super_admin("root@test");
    harness.store.seed_account(admin.clone());

    let page = harness
        .state
        .clients
        .search_clients(&claims_for(&admin), &SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "acme");

    let query = SearchQuery {
        status: Some(Status::Archive),
        ..Default::default()
    };
    let page = harness
        .state
        .clients
        .search_clients(&claims_for(&admin), &query)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "globex");
}

#[tokio::test]
async fn client_search_is_fenced_by_client_grants() {
    let harness = harness();
    let c1 = client("acme");
    let c2 = client("globex");
    harness.store.seed_client(c1.clone());
    harness.store.seed_client(c2.clone());
    let caller = client_admin("admin@acme", &c1.id);
    harness.store.seed_account(caller.clone());

    let page = harness
        .state
        .clients
        .search_clients(&claims_for(&caller), &SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, c1.id);
}
