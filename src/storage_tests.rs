//! Tests for persisted lists

use crate::models::{CatalogItem, ListEntry, MediaKind, TmdbItem};
use crate::storage::*;

fn movie(id: u64) -> CatalogItem {
    CatalogItem::from_raw(
        TmdbItem { id, title: Some(format!("Movie {}", id)), ..Default::default() },
        MediaKind::Movie,
    )
    .unwrap()
}

fn show(id: u64) -> CatalogItem {
    CatalogItem::from_raw(
        TmdbItem { id, name: Some(format!("Show {}", id)), ..Default::default() },
        MediaKind::Tv,
    )
    .unwrap()
}

fn lists() -> PersistedLists<MemoryStore> {
    PersistedLists::new(MemoryStore::default())
}

#[test]
fn test_missing_list_is_empty() {
    let lists = lists();
    assert!(lists.get(ListKind::Watchlist).is_empty());
    assert!(lists.resume_candidate().is_none());
}

#[test]
fn test_malformed_json_is_empty() {
    let mut store = MemoryStore::default();
    store.set("watch-history", "{not json".to_string()).unwrap();
    store.set("watchlist", "   ".to_string()).unwrap();
    let lists = PersistedLists::new(store);
    assert!(lists.get(ListKind::History).is_empty());
    assert!(lists.get(ListKind::Watchlist).is_empty());
}

#[test]
fn test_continue_watching_cap_evicts_oldest() {
    let mut lists = lists();
    for id in 1..=10 {
        let evicted = lists
            .append(ListKind::ContinueWatching, ListEntry::new(movie(id), id as i64))
            .unwrap();
        assert!(evicted.is_empty());
    }

    let evicted = lists
        .append(ListKind::ContinueWatching, ListEntry::new(movie(11), 11))
        .unwrap();
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].item.id, 1);

    let entries = lists.get(ListKind::ContinueWatching);
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0].item.id, 11);
    assert!(!entries.iter().any(|e| e.item.id == 1));
}

#[test]
fn test_history_cap_is_fifty() {
    let mut lists = lists();
    for id in 1..=60 {
        lists.append(ListKind::History, ListEntry::new(movie(id), 0)).unwrap();
    }
    let entries = lists.get(ListKind::History);
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0].item.id, 60);
    assert_eq!(entries[49].item.id, 11);
}

#[test]
fn test_watchlist_is_uncapped() {
    let mut lists = lists();
    for id in 1..=120 {
        lists.append(ListKind::Watchlist, ListEntry::new(movie(id), 0)).unwrap();
    }
    assert_eq!(lists.get(ListKind::Watchlist).len(), 120);
}

#[test]
fn test_append_moves_existing_to_front() {
    let mut lists = lists();
    lists.append(ListKind::ContinueWatching, ListEntry::new(movie(1), 1)).unwrap();
    lists.append(ListKind::ContinueWatching, ListEntry::new(movie(2), 2)).unwrap();
    lists.append(ListKind::ContinueWatching, ListEntry::new(movie(1), 3)).unwrap();

    let ids: Vec<u64> = lists
        .get(ListKind::ContinueWatching)
        .iter()
        .map(|e| e.item.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_history_keeps_one_entry_per_title() {
    let mut lists = lists();
    let s = show(1399);
    for ep in 1..=3 {
        lists.record_play(&s, Some(1), Some(ep)).unwrap();
    }
    lists.record_play(&movie(550), None, None).unwrap();
    lists.record_play(&s, Some(2), Some(4)).unwrap();

    let history = lists.get(ListKind::History);
    let ids: Vec<u64> = history.iter().map(|e| e.item.id).collect();
    assert_eq!(ids, vec![1399, 550]);
    assert_eq!(history[0].season, Some(2));
    assert_eq!(history[0].episode, Some(4));

    // Continue watching tracks only the latest episode of a show
    let cw = lists.get(ListKind::ContinueWatching);
    assert_eq!(cw.len(), 2);
    assert_eq!(cw[0].item.id, 1399);
    assert_eq!(cw[0].episode, Some(4));
    assert_eq!(cw[0].progress, 0.0);
}

#[test]
fn test_toggle_watchlist() {
    let mut lists = lists();
    let m = movie(550);
    assert!(lists.toggle_watchlist(&m).unwrap());
    assert!(lists.contains(ListKind::Watchlist, 550));
    assert!(!lists.toggle_watchlist(&m).unwrap());
    assert!(!lists.contains(ListKind::Watchlist, 550));
}

#[test]
fn test_evict_and_clear() {
    let mut lists = lists();
    lists.append(ListKind::Watchlist, ListEntry::new(movie(1), 0)).unwrap();
    lists.append(ListKind::Watchlist, ListEntry::new(movie(2), 0)).unwrap();

    lists.evict(ListKind::Watchlist, 1).unwrap();
    assert_eq!(lists.get(ListKind::Watchlist).len(), 1);

    lists.clear(ListKind::Watchlist).unwrap();
    assert!(lists.get(ListKind::Watchlist).is_empty());
    assert!(lists.store().get("watchlist").is_none());
}

#[test]
fn test_resume_candidate_window() {
    let mut lists = lists();
    lists.append(ListKind::ContinueWatching, ListEntry::new(movie(1), 0)).unwrap();
    assert!(lists.resume_candidate().is_none());

    assert!(lists.set_progress(1, 42.0).unwrap());
    assert_eq!(lists.resume_candidate().map(|e| e.item.id), Some(1));

    lists.set_progress(1, 99.0).unwrap();
    assert!(lists.resume_candidate().is_none());

    lists.set_progress(1, 250.0).unwrap();
    assert_eq!(lists.get(ListKind::ContinueWatching)[0].progress, 100.0);

    assert!(!lists.set_progress(404, 50.0).unwrap());
}

#[test]
fn test_json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut lists = PersistedLists::new(JsonFileStore::new(dir.path().join("lists")));
    lists.toggle_watchlist(&movie(550)).unwrap();
    assert!(dir.path().join("lists").join("watchlist.json").exists());

    let reopened = PersistedLists::new(JsonFileStore::new(dir.path().join("lists")));
    assert!(reopened.contains(ListKind::Watchlist, 550));

    let mut reopened = reopened;
    reopened.clear(ListKind::Watchlist).unwrap();
    // Clearing twice is fine
    reopened.clear(ListKind::Watchlist).unwrap();
}

#[test]
fn test_json_file_store_reads_garbage_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("continue-watching.json"), "[{\"id\":").unwrap();
    let lists = PersistedLists::new(JsonFileStore::new(dir.path()));
    assert!(lists.get(ListKind::ContinueWatching).is_empty());
}
