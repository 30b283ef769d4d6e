//! Tests for history buffer

use std::sync::Arc;

use super::*;

/// Helper to create a numbered test line
fn line(id: usize) -> LogLine {
    LogLine::from(format!("line {}", id))
}

fn texts(lines: &[LogLine]) -> Vec<&str> {
    lines.iter().map(LogLine::as_str).collect()
}

// ============================================================================
// Basic operations
// ============================================================================

#[test]
fn test_new_buffer_is_empty() {
    let buffer = HistoryBuffer::new();
    assert!(buffer.is_empty());
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.total_appended(), 0);
    assert!(buffer.snapshot().is_empty());
}

#[test]
fn test_append_increments_count() {
    let buffer = HistoryBuffer::new();

    buffer.append(line(1));
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.total_appended(), 1);

    buffer.append(line(2));
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.total_appended(), 2);
}

#[test]
fn test_snapshot_preserves_insertion_order() {
    let buffer = HistoryBuffer::with_capacity(10);

    for i in 0..4 {
        buffer.append(line(i));
    }

    let snapshot = buffer.snapshot();
    assert_eq!(texts(&snapshot), ["line 0", "line 1", "line 2", "line 3"]);
}

// ============================================================================
// Ring buffer behavior
// ============================================================================

#[test]
fn test_ring_buffer_wraps() {
    let buffer = HistoryBuffer::with_capacity(5);

    // Append 8 lines into a buffer of size 5
    for i in 0..8 {
        buffer.append(line(i));
    }

    assert_eq!(buffer.len(), 5);
    assert_eq!(buffer.total_appended(), 8);

    // Oldest three were evicted
    let snapshot = buffer.snapshot();
    assert_eq!(
        texts(&snapshot),
        ["line 3", "line 4", "line 5", "line 6", "line 7"]
    );
}

#[test]
fn test_ring_buffer_exactly_full() {
    let buffer = HistoryBuffer::with_capacity(5);

    for i in 0..5 {
        buffer.append(line(i));
    }

    assert_eq!(buffer.len(), 5);

    let snapshot = buffer.snapshot();
    for (i, line) in snapshot.iter().enumerate() {
        assert_eq!(line.as_str(), format!("line {}", i));
    }
}

#[test]
fn test_snapshot_keeps_last_capacity_lines_for_any_count() {
    for capacity in 1..6 {
        for count in 0..20 {
            let buffer = HistoryBuffer::with_capacity(capacity);
            for i in 0..count {
                buffer.append(line(i));
            }

            let expected: Vec<String> = (count.saturating_sub(capacity)..count)
                .map(|i| format!("line {}", i))
                .collect();
            let snapshot: Vec<String> =
                buffer.snapshot().iter().map(|l| l.to_string()).collect();

            assert_eq!(snapshot, expected, "capacity {} count {}", capacity, count);
        }
    }
}

#[test]
fn test_abcd_with_capacity_three() {
    let buffer = HistoryBuffer::with_capacity(3);
    for text in ["a", "b", "c", "d"] {
        buffer.append(LogLine::from(text));
    }

    assert_eq!(texts(&buffer.snapshot()), ["b", "c", "d"]);
}

// ============================================================================
// Snapshot isolation
// ============================================================================

#[test]
fn test_snapshot_unaffected_by_later_appends() {
    let buffer = HistoryBuffer::with_capacity(3);
    buffer.append(line(1));
    buffer.append(line(2));

    let snapshot = buffer.snapshot();

    buffer.append(line(3));
    buffer.append(line(4));
    buffer.append(line(5));

    assert_eq!(texts(&snapshot), ["line 1", "line 2"]);
}

// ============================================================================
// Capacity tests
// ============================================================================

#[test]
fn test_capacity() {
    let buffer = HistoryBuffer::with_capacity(100);
    assert_eq!(buffer.capacity(), 100);
}

#[test]
fn test_default_capacity() {
    let buffer = HistoryBuffer::new();
    assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
    assert_eq!(buffer.capacity(), 250);
}

#[test]
fn test_max_capacity_enforced() {
    let buffer = HistoryBuffer::with_capacity(1_000_000);
    assert_eq!(buffer.capacity(), MAX_CAPACITY);
}

#[test]
fn test_zero_capacity_keeps_nothing() {
    let buffer = HistoryBuffer::with_capacity(0);

    buffer.append(line(1));
    buffer.append(line(2));

    assert!(buffer.is_empty());
    assert!(buffer.snapshot().is_empty());
    assert_eq!(buffer.total_appended(), 2);
}

// ============================================================================
// Concurrency tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_append_and_snapshot() {
    let buffer = Arc::new(HistoryBuffer::with_capacity(10));

    let buffer_clone = Arc::clone(&buffer);
    let writer = tokio::spawn(async move {
        for i in 0..50 {
            buffer_clone.append(line(i));
            tokio::task::yield_now().await;
        }
    });

    // Every snapshot must be a contiguous, ordered run of lines
    let buffer_clone = Arc::clone(&buffer);
    let reader = tokio::spawn(async move {
        for _ in 0..20 {
            let snapshot = buffer_clone.snapshot();
            let ids: Vec<usize> = snapshot
                .iter()
                .map(|l| l.trim_start_matches("line ").parse().unwrap())
                .collect();
            assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));
            tokio::task::yield_now().await;
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();

    assert_eq!(buffer.total_appended(), 50);
    assert_eq!(buffer.len(), 10);
}
