//! Integration tests for the eviction policy.

use std::time::Duration;

use feed_pager::cache::evictor::Evictor;
use feed_pager::cache::page::{CacheEntry, Page, PageKey};
use feed_pager::cache::store::CacheStore;
use tokio::time::Instant;

fn make_entry(page: u32, inserted: Instant, accessed: Instant, tick: u64) -> CacheEntry<u32> {
    let mut entry = CacheEntry::new(PageKey::new("/posts", page), Page::new(vec![page], None), inserted, tick);
    entry.touch(accessed, tick);
    entry
}

#[test]
fn test_eviction_order_by_access_not_insertion() {
    let evictor = Evictor::new(Duration::from_secs(60));
    let t0 = Instant::now();
    let secs = Duration::from_secs;

    let entries = vec![
        make_entry(1, t0, t0 + secs(9), 9),          // oldest insert, freshest read
        make_entry(2, t0 + secs(3), t0 + secs(3), 3), // untouched since insert
        make_entry(3, t0 + secs(5), t0 + secs(7), 7),
        make_entry(4, t0 + secs(6), t0 + secs(6), 6),
    ];

    let victims = evictor.select_victims(entries.iter(), 3, t0 + secs(10));
    let order: Vec<u32> = victims.iter().map(|v| v.key.page).collect();
    assert_eq!(order, vec![2, 4, 3]);
}

#[test]
fn test_eviction_empty_returns_nothing() {
    let evictor = Evictor::new(Duration::from_secs(60));
    let entries: Vec<CacheEntry<u32>> = vec![];
    assert!(evictor.select_victims(entries.iter(), 5, Instant::now()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_full_store_drops_expired_before_live() {
    let mut store = CacheStore::new(3, Duration::from_secs(30));
    store.set(PageKey::new("/posts", 1), Page::new(vec![1u32], None));
    tokio::time::advance(Duration::from_secs(20)).await;
    store.set(PageKey::new("/posts", 2), Page::new(vec![2], None));
    store.set(PageKey::new("/posts", 3), Page::new(vec![3], None));

    // Page 1 was read last but is past its TTL by the time page 4 arrives.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(store.get(&PageKey::new("/posts", 1)).is_some());
    tokio::time::advance(Duration::from_secs(6)).await;
    store.set(PageKey::new("/posts", 4), Page::new(vec![4], None));

    assert_eq!(store.len(), 3);
    assert!(!store.contains(&PageKey::new("/posts", 1)));
    assert!(store.contains(&PageKey::new("/posts", 2)));
    assert_eq!(store.stats().expirations, 1);
    assert_eq!(store.stats().evictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_is_never_exceeded() {
    let mut store = CacheStore::new(5, Duration::from_secs(60));
    for n in 1..=50u32 {
        store.set(PageKey::new("/posts", n), Page::new(vec![n], None));
        if n % 3 == 0 {
            store.get(&PageKey::new("/posts", 1));
        }
        assert!(store.len() <= 5);
    }
    // Page 1 is read every third insert, so it is never the coldest.
    assert!(store.contains(&PageKey::new("/posts", 1)));
    assert!(store.contains(&PageKey::new("/posts", 50)));
}
