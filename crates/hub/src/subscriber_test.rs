//! Tests for subscriber management

use super::*;

fn line(text: &str) -> LogLine {
    LogLine::from(text)
}

// ============================================================================
// SubscriberRegistry tests
// ============================================================================

#[tokio::test]
async fn test_register_creates_subscriber() {
    let registry = SubscriberRegistry::new();

    let (id, status, _rx) = registry.register(10).unwrap();
    assert!(id.as_u64() > 0);
    assert_eq!(status.state(), SubscriberState::Active);
    assert_eq!(registry.count(), 1);
    assert!(registry.contains(id));
}

#[tokio::test]
async fn test_register_unique_ids() {
    let registry = SubscriberRegistry::new();

    let (id1, _, _rx1) = registry.register(10).unwrap();
    let (id2, _, _rx2) = registry.register(10).unwrap();

    assert_ne!(id1, id2);
    assert_eq!(registry.count(), 2);
}

#[tokio::test]
async fn test_register_respects_max_subscribers() {
    let registry = SubscriberRegistry::with_limits(2, 0);

    let (_id1, _, _rx1) = registry.register(10).unwrap();
    let (_id2, _, _rx2) = registry.register(10).unwrap();

    let result = registry.register(10);
    assert!(matches!(result, Err(HubError::MaxSubscribers { max: 2 })));
    assert_eq!(registry.count(), 2);
}

#[tokio::test]
async fn test_unregister_removes_subscriber() {
    let registry = SubscriberRegistry::new();

    let (id, status, _rx) = registry.register(10).unwrap();
    assert_eq!(registry.count(), 1);

    assert!(registry.unregister(id));
    assert_eq!(registry.count(), 0);
    assert_eq!(status.state(), SubscriberState::Closed);
}

#[tokio::test]
async fn test_unregister_twice_is_noop() {
    let registry = SubscriberRegistry::new();

    let (id, _, _rx) = registry.register(10).unwrap();
    let (other, _, _other_rx) = registry.register(10).unwrap();

    assert!(registry.unregister(id));
    assert!(!registry.unregister(id));

    assert_eq!(registry.count(), 1);
    assert!(registry.contains(other));
}

#[tokio::test]
async fn test_unregister_unknown_is_noop() {
    let registry = SubscriberRegistry::new();
    let (other, _, _rx) = registry.register(10).unwrap();

    let (stranger, _, _) = SubscriberRegistry::new().register(1).unwrap();
    assert!(!registry.unregister(stranger));
    assert!(registry.contains(other));
}

#[tokio::test]
async fn test_unregister_closes_endpoint() {
    let registry = SubscriberRegistry::new();
    let (id, _, mut rx) = registry.register(10).unwrap();

    registry.unregister(id);

    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_each_is_a_snapshot() {
    let registry = SubscriberRegistry::new();
    let (id, _, _rx) = registry.register(10).unwrap();

    let snapshot = registry.each();
    registry.unregister(id);

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id(), id);
    assert!(registry.each().is_empty());
}

// ============================================================================
// Broadcast tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_to_single_subscriber() {
    let registry = SubscriberRegistry::new();
    let (_id, status, mut rx) = registry.register(10).unwrap();

    let outcome = registry.broadcast(&line("hello"));
    assert_eq!(outcome.delivered, 1);
    assert_eq!(status.delivered(), 1);

    assert_eq!(rx.try_recv().unwrap().as_str(), "hello");
}

#[tokio::test]
async fn test_broadcast_to_multiple_subscribers() {
    let registry = SubscriberRegistry::new();

    let (_id1, _, mut rx1) = registry.register(10).unwrap();
    let (_id2, _, mut rx2) = registry.register(10).unwrap();

    let outcome = registry.broadcast(&line("x"));
    assert_eq!(outcome.delivered, 2);

    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn test_broadcast_with_no_subscribers() {
    let registry = SubscriberRegistry::new();
    let outcome = registry.broadcast(&line("nobody"));
    assert_eq!(outcome, BroadcastOutcome::default());
}

// ============================================================================
// Slow subscriber tests
// ============================================================================

#[tokio::test]
async fn test_full_queue_drops_for_that_subscriber_only() {
    let registry = SubscriberRegistry::with_limits(0, 0);

    let (_slow, slow_status, _slow_rx) = registry.register(2).unwrap();
    let (_fast, fast_status, mut fast_rx) = registry.register(100).unwrap();

    for i in 0..5 {
        registry.broadcast(&line(&format!("{}", i)));
    }

    assert_eq!(slow_status.delivered(), 2);
    assert_eq!(slow_status.dropped(), 3);
    assert_eq!(fast_status.delivered(), 5);
    assert_eq!(fast_status.dropped(), 0);

    for i in 0..5 {
        assert_eq!(fast_rx.try_recv().unwrap().as_str(), format!("{}", i));
    }
}

#[tokio::test]
async fn test_dropped_count_is_monotonic() {
    let registry = SubscriberRegistry::with_limits(0, 0);
    let (_id, status, mut rx) = registry.register(1).unwrap();

    let mut last = 0;
    for i in 0..10 {
        registry.broadcast(&line("spam"));
        if i % 3 == 0 {
            let _ = rx.try_recv();
        }
        assert!(status.dropped() >= last);
        last = status.dropped();
    }
    assert!(last > 0);
}

#[tokio::test]
async fn test_successful_delivery_resets_consecutive_drops() {
    let registry = SubscriberRegistry::with_limits(0, 0);
    let (_id, status, mut rx) = registry.register(1).unwrap();

    registry.broadcast(&line("a"));
    registry.broadcast(&line("b"));
    registry.broadcast(&line("c"));
    assert_eq!(status.consecutive_drops(), 2);

    rx.try_recv().unwrap();
    registry.broadcast(&line("d"));

    assert_eq!(status.consecutive_drops(), 0);
    assert_eq!(status.dropped(), 2);
}

#[tokio::test]
async fn test_slow_subscriber_evicted_after_threshold() {
    let registry = SubscriberRegistry::with_limits(0, 3);

    let (slow, slow_status, mut slow_rx) = registry.register(1).unwrap();
    let (fast, _, mut fast_rx) = registry.register(100).unwrap();

    // One queued, then three drops in a row
    let mut evicted = 0;
    for i in 0..4 {
        evicted += registry.broadcast(&line(&format!("{}", i))).evicted;
    }

    assert_eq!(evicted, 1);
    assert!(!registry.contains(slow));
    assert!(registry.contains(fast));
    assert_eq!(slow_status.state(), SubscriberState::Closed);

    // The queued line is still readable, then the endpoint reports closed
    assert_eq!(slow_rx.recv().await.unwrap().as_str(), "0");
    assert!(slow_rx.recv().await.is_none());

    for i in 0..4 {
        assert_eq!(fast_rx.try_recv().unwrap().as_str(), format!("{}", i));
    }
}

#[tokio::test]
async fn test_zero_threshold_never_evicts() {
    let registry = SubscriberRegistry::with_limits(0, 0);
    let (id, _, _rx) = registry.register(1).unwrap();

    for _ in 0..1000 {
        registry.broadcast(&line("flood"));
    }

    assert!(registry.contains(id));
}

// ============================================================================
// Disconnect tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_removes_disconnected_subscriber() {
    let registry = SubscriberRegistry::new();
    let (id, _, rx) = registry.register(10).unwrap();

    drop(rx);

    let outcome = registry.broadcast(&line("anyone?"));
    assert_eq!(outcome.delivered, 0);
    assert_eq!(outcome.evicted, 1);
    assert!(!registry.contains(id));
}

#[tokio::test]
async fn test_cleanup_disconnected() {
    let registry = SubscriberRegistry::new();

    let (_id, status, rx) = registry.register(10).unwrap();
    let (_keep, _, _keep_rx) = registry.register(10).unwrap();
    assert_eq!(registry.count(), 2);

    // Drop the receiver (simulates client disconnect)
    drop(rx);

    // Subscriber still exists until cleanup
    assert_eq!(registry.count(), 2);

    let removed = registry.cleanup_disconnected();
    assert_eq!(removed, 1);
    assert_eq!(registry.count(), 1);
    assert_eq!(status.state(), SubscriberState::Closed);
}

#[tokio::test]
async fn test_drain_releases_all_endpoints() {
    let registry = SubscriberRegistry::new();

    let (_id1, status1, mut rx1) = registry.register(10).unwrap();
    let (_id2, status2, mut rx2) = registry.register(10).unwrap();

    assert_eq!(registry.drain(), 2);
    assert!(registry.is_empty());

    assert!(rx1.recv().await.is_none());
    assert!(rx2.recv().await.is_none());
    assert_eq!(status1.state(), SubscriberState::Closed);
    assert_eq!(status2.state(), SubscriberState::Closed);
}

// ============================================================================
// Subscriber tests
// ============================================================================

#[test]
fn test_subscriber_is_connected() {
    let (tx, rx) = mpsc::channel(10);
    let subscriber = Subscriber::new(tx);

    assert!(subscriber.is_connected());

    drop(rx);

    assert!(!subscriber.is_connected());
    assert_eq!(subscriber.try_deliver(&line("late")), Delivery::Disconnected);
}

#[test]
fn test_closed_subscriber_skips_delivery() {
    let (tx, mut rx) = mpsc::channel(10);
    let subscriber = Subscriber::new(tx);

    subscriber.close();

    assert_eq!(subscriber.try_deliver(&line("x")), Delivery::Inactive);
    assert!(rx.try_recv().is_err());
}
