//! Integration tests for the page cache.

use std::time::Duration;

use feed_pager::cache::page::{Page, PageKey};
use feed_pager::cache::store::CacheStore;

fn page(label: &str) -> Page<String> {
    Page::new(vec![label.to_string()], None)
}

fn key(page: u32) -> PageKey {
    PageKey::new("/posts", page)
}

#[tokio::test(start_paused = true)]
async fn test_get_returns_value_until_ttl() {
    let mut store = CacheStore::new(10, Duration::from_secs(60));

    for n in 1..=5 {
        store.set(key(n), page(&format!("p{n}")));
    }
    for n in 1..=5 {
        assert_eq!(store.get(&key(n)), Some(page(&format!("p{n}"))));
    }

    tokio::time::advance(Duration::from_secs(60)).await;
    for n in 1..=5 {
        assert!(store.get(&key(n)).is_none());
    }
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_recently_read_entry_survives_eviction() {
    // capacity 2: insert A, insert B, read A, insert C => B is evicted.
    let mut store = CacheStore::new(2, Duration::from_secs(60));
    let (a, b, c) = (key(1), key(2), key(3));

    store.set(a.clone(), page("A"));
    store.set(b.clone(), page("B"));
    assert!(store.get(&a).is_some());
    store.set(c.clone(), page("C"));

    assert_eq!(store.len(), 2);
    assert!(store.get(&b).is_none());
    assert_eq!(store.get(&a), Some(page("A")));
    assert_eq!(store.get(&c), Some(page("C")));
    assert_eq!(store.stats().evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_most_recently_used_still_expires() {
    let mut store = CacheStore::new(4, Duration::from_secs(60));
    store.set(key(1), page("A"));

    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(store.get(&key(1)).is_some());
    }
    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(store.get(&key(1)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_refreshes_ttl() {
    let mut store = CacheStore::new(4, Duration::from_secs(60));
    store.set(key(1), page("old"));
    tokio::time::advance(Duration::from_secs(50)).await;
    store.set(key(1), page("new"));
    tokio::time::advance(Duration::from_secs(50)).await;

    assert_eq!(store.get(&key(1)), Some(page("new")));
}

#[tokio::test(start_paused = true)]
async fn test_delete_and_clear() {
    let mut store = CacheStore::new(4, Duration::from_secs(60));
    store.set(key(1), page("A"));
    store.set(key(2), page("B"));
    store.set(PageKey::new("/posts?sort=new", 1), page("C"));

    assert!(store.delete(&key(1)));
    assert!(!store.delete(&key(1)));
    assert!(store.get(&key(1)).is_none());
    assert_eq!(store.len(), 2);

    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.stats().entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_endpoints_do_not_collide() {
    let mut store = CacheStore::new(4, Duration::from_secs(60));
    store.set(PageKey::new("/posts", 1), page("all"));
    store.set(PageKey::new("/posts?tag=rust", 1), page("rust"));

    assert_eq!(store.get(&PageKey::new("/posts", 1)), Some(page("all")));
    assert_eq!(store.get(&PageKey::new("/posts?tag=rust", 1)), Some(page("rust")));
}

#[tokio::test(start_paused = true)]
async fn test_hit_ratio() {
    let mut store = CacheStore::new(4, Duration::from_secs(60));
    store.set(key(1), page("A"));
    store.get(&key(1));
    store.get(&key(1));
    store.get(&key(2));
    store.get(&key(3));

    let stats = store.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
}
