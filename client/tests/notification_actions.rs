//! Behavioural tests for bulk notification actions against the stub server.

use std::sync::Arc;

use rstest::rstest;
use skillswap_client::api::endpoints;
use skillswap_client::domain::ports::Method;
use skillswap_client::stores::NotificationStore;

mod support;

use support::{StubApi, signed_in};

async fn loaded_store(stub: &Arc<StubApi>, count: usize) -> NotificationStore {
    stub.seed_notifications(count);
    let (api, _auth, toasts) = signed_in(stub).await;
    let store = NotificationStore::new(api, toasts);
    assert_eq!(store.fetch().await.expect("fetch"), count);
    store
}

#[rstest]
#[case(1)]
#[case(7)]
#[tokio::test]
async fn mark_all_read_clears_the_unread_count(#[case] count: usize) {
    let stub = StubApi::new();
    let store = loaded_store(&stub, count).await;
    assert_eq!(store.snapshot().feed.unread_count(), count);

    store.mark_all_read().await.expect("mark read");

    let feed = store.snapshot().feed;
    assert_eq!(feed.len(), count);
    assert_eq!(feed.unread_count(), 0);
    assert!(
        stub.stored_notifications()
            .iter()
            .all(|item| item["isRead"] == true)
    );
}

#[tokio::test]
async fn delete_all_empties_both_sides() {
    let stub = StubApi::new();
    let store = loaded_store(&stub, 5).await;

    store.delete_all().await.expect("delete all");

    assert!(store.snapshot().feed.is_empty());
    assert!(stub.stored_notifications().is_empty());
    assert_eq!(store.fetch().await.expect("refetch"), 0);
}

#[tokio::test]
async fn bulk_actions_survive_an_expired_token() {
    let stub = StubApi::new();
    let store = loaded_store(&stub, 3).await;
    stub.expire_access_token();

    store.mark_all_read().await.expect("refreshed then marked");

    assert_eq!(store.snapshot().feed.unread_count(), 0);
    assert_eq!(stub.count(Method::Post, endpoints::REFRESH), 1);
}
