use super::*;
use crate::test_support::settle;

#[tokio::test(start_paused = true)]
async fn publish_returns_fresh_ids_in_insertion_order() {
    let center = NotificationCenter::new();
    let first = center.publish_error("first");
    let second = center.publish("second", NotificationKind::Info, Duration::from_secs(1));
    let third = center.publish_error("third");

    assert!(first < second && second < third);
    let messages: Vec<_> = center
        .snapshot()
        .into_iter()
        .map(|n| (n.id, n.message, n.kind))
        .collect();
    assert_eq!(
        messages,
        vec![
            (first, "first".to_string(), NotificationKind::Error),
            (second, "second".to_string(), NotificationKind::Info),
            (third, "third".to_string(), NotificationKind::Error),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn notification_expires_after_its_duration() {
    let center = NotificationCenter::new();
    center.publish_error("boom");

    tokio::time::advance(Duration::from_millis(4999)).await;
    settle().await;
    assert_eq!(center.len(), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert!(center.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dismiss_is_idempotent() {
    let center = NotificationCenter::new();
    let id = center.publish_error("boom");
    let other = center.publish_error("other");

    assert!(center.dismiss(id));
    assert!(!center.dismiss(id));
    assert_eq!(center.snapshot().len(), 1);
    assert_eq!(center.snapshot()[0].id, other);
}

#[tokio::test(start_paused = true)]
async fn dismiss_after_expiry_changes_nothing() {
    let center = NotificationCenter::new();
    let id = center.publish("short", NotificationKind::Warning, Duration::from_millis(100));
    let survivor = center.publish("long", NotificationKind::Info, Duration::from_secs(60));

    tokio::time::advance(Duration::from_millis(100)).await;
    settle().await;
    assert!(!center.dismiss(id));
    assert_eq!(center.snapshot().len(), 1);
    assert_eq!(center.snapshot()[0].id, survivor);
}

#[tokio::test(start_paused = true)]
async fn identical_messages_live_independently() {
    let center = NotificationCenter::new();
    let first = center.publish_error("same text");
    tokio::time::advance(Duration::from_millis(1000)).await;
    let second = center.publish_error("same text");

    assert_ne!(first, second);
    assert_eq!(center.len(), 2);

    assert!(center.dismiss(second));
    assert_eq!(center.snapshot()[0].id, first);

    tokio::time::advance(Duration::from_millis(4000)).await;
    settle().await;
    assert!(center.is_empty());
}

#[tokio::test(start_paused = true)]
async fn explicit_dismissal_cancels_timer_without_touching_newer_entries() {
    let center = NotificationCenter::new();
    let first = center.publish_error("first");
    assert!(center.dismiss(first));
    let second = center.publish_error("second");

    tokio::time::advance(Duration::from_millis(4999)).await;
    settle().await;
    assert_eq!(center.snapshot()[0].id, second);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_publish_and_dismiss_events() {
    let center = NotificationCenter::new();
    let mut events = center.subscribe();

    let id = center.publish_error("boom");
    center.dismiss(id);

    match events.recv().await.expect("published") {
        NotificationEvent::Published(notification) => {
            assert_eq!(notification.id, id);
            assert_eq!(notification.message, "boom");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("dismissed") {
        NotificationEvent::Dismissed(dismissed) => assert_eq!(dismissed, id),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn publish_without_runtime_keeps_entry_until_dismissed() {
    let center = NotificationCenter::new();
    let id = center.publish_error("no runtime");
    assert_eq!(center.len(), 1);
    assert!(center.dismiss(id));
    assert!(center.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_never_share_an_id() {
    let center = NotificationCenter::new();
    let mut handles = Vec::new();
    for task in 0..8 {
        let center = center.clone();
        handles.push(tokio::spawn(async move {
            (0..50)
                .map(|i| center.publish_error(format!("{task}-{i}")))
                .collect::<Vec<_>>()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.extend(handle.await.expect("join"));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400);
}

#[tokio::test(start_paused = true)]
async fn configured_default_duration_applies_to_errors() {
    let center = NotificationCenter::with_default_duration(Duration::from_millis(1500));
    center.publish_error("short lived");

    tokio::time::advance(Duration::from_millis(1500)).await;
    settle().await;
    assert!(center.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unbounded_duration_stays_until_dismissed() {
    let center = NotificationCenter::new();
    let id = center.publish("sticky", NotificationKind::Info, Duration::MAX);

    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;
    assert_eq!(center.len(), 1);

    assert!(center.dismiss(id));
    assert!(center.is_empty());
}
