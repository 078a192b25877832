//! Save and follow toggles: a toggle flips state, a double toggle restores it,
//! and concurrent toggles leave exactly parity-many transitions behind.

mod common;

use blog_service::{ErrorKind, ServiceError};
use common::{build_state, build_state_with, new_post, FakeDirectory};

#[tokio::test]
async fn test_toggle_save_flips_and_restores() {
    let directory = FakeDirectory::with_users(&["A"]);
    let state = build_state(&directory);
    let post = state.content.create_post(new_post("A", "P1")).await.unwrap();

    assert!(!state.engagement.is_saved("U", post.id).await.unwrap());

    let first = state.engagement.toggle_save("U", post.id).await.unwrap();
    assert!(first.saved);
    assert!(state.engagement.is_saved("U", post.id).await.unwrap());

    let second = state.engagement.toggle_save("U", post.id).await.unwrap();
    assert!(!second.saved);
    assert!(!state.engagement.is_saved("U", post.id).await.unwrap());
}

#[tokio::test]
async fn test_save_and_unsave_are_idempotent() {
    let directory = FakeDirectory::with_users(&["A"]);
    let state = build_state(&directory);
    let post = state.content.create_post(new_post("A", "P1")).await.unwrap();

    assert!(state.engagement.save("U", post.id).await.unwrap().saved);
    assert!(state.engagement.save("U", post.id).await.unwrap().saved);
    assert!(state.engagement.is_saved("U", post.id).await.unwrap());

    assert!(!state.engagement.unsave("U", post.id).await.unwrap().saved);
    assert!(!state.engagement.unsave("U", post.id).await.unwrap().saved);
    assert!(!state.engagement.is_saved("U", post.id).await.unwrap());
}

#[tokio::test]
async fn test_toggle_save_on_missing_post_is_not_found() {
    let state = build_state(&FakeDirectory::default());

    let err = state
        .engagement
        .toggle_save("U", uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_save_toggles_settle_by_parity() {
    let directory = FakeDirectory::with_users(&["A"]);
    let state = build_state(&directory);
    let post = state.content.create_post(new_post("A", "P1")).await.unwrap();
    let post_id = post.id;

    let mut handles = Vec::new();
    for _ in 0..17 {
        let engagement = state.engagement.clone();
        handles.push(tokio::spawn(async move {
            engagement.toggle_save("U", post_id).await.unwrap()
        }));
    }

    let mut saved_results = 0;
    for handle in handles {
        if handle.await.unwrap().saved {
            saved_results += 1;
        }
    }

    // 17 flips from unsaved: 9 land on saved, 8 on unsaved, and the last one wins
    assert_eq!(saved_results, 9);
    assert!(state.engagement.is_saved("U", post_id).await.unwrap());
}

#[tokio::test]
async fn test_follow_toggle_updates_both_counters() {
    let directory = FakeDirectory::with_users(&["A", "B"]);
    let state = build_state(&directory);

    let toggled = state.social.toggle_follow("A", "B").await.unwrap();
    assert!(toggled.followed);
    assert!(state.social.is_following("A", "B").await.unwrap());
    assert!(!state.social.is_following("B", "A").await.unwrap());

    let a = state.social.get_follow_stats("A").await.unwrap();
    let b = state.social.get_follow_stats("B").await.unwrap();
    assert_eq!((a.followers, a.following), (0, 1));
    assert_eq!((b.followers, b.following), (1, 0));

    let toggled = state.social.toggle_follow("A", "B").await.unwrap();
    assert!(!toggled.followed);

    let a = state.social.get_follow_stats("A").await.unwrap();
    let b = state.social.get_follow_stats("B").await.unwrap();
    assert_eq!((a.followers, a.following), (0, 0));
    assert_eq!((b.followers, b.following), (0, 0));
}

#[tokio::test]
async fn test_self_follow_is_rejected_without_writing() {
    let directory = FakeDirectory::with_users(&["A"]);
    let state = build_state(&directory);

    for result in [
        state.social.toggle_follow("A", "A").await,
        state.social.follow("A", "A").await,
    ] {
        match result {
            Err(ServiceError::InvalidInput(msg)) => assert_eq!(msg, "You can't follow yourself"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    let stats = state.social.get_follow_stats("A").await.unwrap();
    assert_eq!((stats.followers, stats.following), (0, 0));
}

#[tokio::test]
async fn test_follow_unknown_user_rejected_when_verification_enabled() {
    let directory = FakeDirectory::with_users(&["A"]);
    let state = build_state_with(&directory, true);

    let err = state.social.toggle_follow("A", "ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!state.social.is_following("A", "ghost").await.unwrap());

    directory.add_user("B");
    assert!(state.social.follow("A", "B").await.unwrap().followed);
}

#[tokio::test]
async fn test_get_following_resolves_in_one_batch_and_skips_unknown() {
    let directory = FakeDirectory::with_users(&["A", "B", "C", "D"]);
    let state = build_state(&directory);

    state.social.follow("A", "B").await.unwrap();
    state.social.follow("A", "C").await.unwrap();
    state.social.follow("A", "D").await.unwrap();
    directory.remove_user("C");

    let calls_before = directory.batch_call_count();
    let following = state.social.get_following("A").await.unwrap();
    assert_eq!(directory.batch_call_count() - calls_before, 1);

    let ids: Vec<&str> = following.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["D", "B"]);
}
