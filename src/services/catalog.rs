//! Catalog service
//!
//! Orchestrates the record store, the listing cache and the notification hub.
//! Every operation loads the full collection; mutations write the full
//! collection back, drop the cached listing and (except bulk import) announce
//! the change to connected observers.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::LookupCache;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Entry, EntryCreateRequest, EntryPage, EntryUpdateRequest, ImportSummary, NewEntry, Pagination,
};
use crate::notifications::{CatalogEvent, NotificationHub};
use crate::repositories::EntryStore;

/// Cache key of the full-listing snapshot
pub const ENTRIES_CACHE_KEY: &str = "entries";

const RESOURCE: &str = "Entry";

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn EntryStore>,
    cache: LookupCache<Vec<Entry>>,
    notifications: NotificationHub,
    // Serializes read-modify-write sequences on the store
    write_lock: Arc<Mutex<()>>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn EntryStore>,
        cache: LookupCache<Vec<Entry>>,
        notifications: NotificationHub,
    ) -> Self {
        Self {
            store,
            cache,
            notifications,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    /// One page of the catalog, served from the listing cache when warm
    pub async fn list(&self, page: usize, limit: usize) -> AppResult<EntryPage> {
        let entries = match self.cache.get(ENTRIES_CACHE_KEY).await {
            Some(entries) => entries,
            None => self.repopulate_listing().await,
        };

        let pagination = Pagination::new(entries.len(), page, limit);
        let entries = entries
            .into_iter()
            .skip(pagination.offset())
            .take(limit)
            .collect();

        Ok(EntryPage {
            entries,
            pagination,
        })
    }

    /// Reload the listing snapshot on a cache miss.
    ///
    /// Runs under the writer lock: a snapshot read before a mutation must never
    /// be cached after that mutation invalidated the listing.
    async fn repopulate_listing(&self) -> Vec<Entry> {
        let _guard = self.write_lock.lock().await;
        if let Some(entries) = self.cache.get(ENTRIES_CACHE_KEY).await {
            return entries;
        }

        let entries = self.store.load_all().await;
        debug!(entries = entries.len(), "Listing cache repopulated from store");
        self.cache.set(ENTRIES_CACHE_KEY, entries.clone()).await;
        entries
    }

    /// Always reads the store; the listing cache is not consulted here
    pub async fn get_by_id(&self, id: u64) -> AppResult<Entry> {
        self.store
            .load_all()
            .await
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }

    pub async fn create(&self, request: EntryCreateRequest) -> AppResult<Entry> {
        let fields = request.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut entries = self.store.load_all().await;
        let entry = fields.into_entry(next_id(&entries)?);
        entries.push(entry.clone());
        self.persist(&entries).await?;

        info!(id = entry.id, title = %entry.title, "Entry created");
        self.notifications
            .broadcast(CatalogEvent::EntryAdded(entry.clone()));
        Ok(entry)
    }

    pub async fn update(&self, id: u64, request: EntryUpdateRequest) -> AppResult<Entry> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.store.load_all().await;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| AppError::not_found(RESOURCE, id))?;

        request.apply_to(entry)?;
        let updated = entry.clone();
        self.persist(&entries).await?;

        info!(id, "Entry updated");
        self.notifications
            .broadcast(CatalogEvent::EntryUpdated(updated.clone()));
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let entries = self.store.load_all().await;
        let before = entries.len();
        let remaining: Vec<Entry> = entries.into_iter().filter(|entry| entry.id != id).collect();

        if remaining.len() == before {
            return Err(AppError::not_found(RESOURCE, id));
        }
        self.persist(&remaining).await?;

        info!(id, "Entry deleted");
        self.notifications.broadcast(CatalogEvent::EntryDeleted(id));
        Ok(())
    }

    /// Entries whose genre equals `category`, ignoring case
    pub async fn recommend_by_category(&self, category: &str) -> AppResult<Vec<Entry>> {
        let wanted = category.to_lowercase();
        Ok(self
            .store
            .load_all()
            .await
            .into_iter()
            .filter(|entry| entry.genre.to_lowercase() == wanted)
            .collect())
    }

    /// Append every entry of an uploaded JSON array, in document order.
    ///
    /// Imported entries are not announced to observers.
    pub async fn bulk_import(&self, document: Option<&[u8]>) -> AppResult<ImportSummary> {
        let document = document.ok_or_else(|| AppError::validation("No file was provided"))?;
        let fields = parse_import(document)?;

        let _guard = self.write_lock.lock().await;
        let mut entries = self.store.load_all().await;
        let first_id = next_id(&entries)?;
        let last_offset = fields.len().saturating_sub(1) as u64;
        if first_id.checked_add(last_offset).is_none() {
            return Err(AppError::internal("Entry identifiers exhausted"));
        }
        let imported: Vec<Entry> = fields
            .into_iter()
            .enumerate()
            .map(|(offset, fields)| fields.into_entry(first_id + offset as u64))
            .collect();

        entries.extend(imported.iter().cloned());
        self.persist(&entries).await?;

        info!(count = imported.len(), first_id, "Entries imported");
        Ok(ImportSummary {
            count: imported.len(),
            entries: imported,
        })
    }

    async fn persist(&self, entries: &[Entry]) -> AppResult<()> {
        self.store.save_all(entries).await?;
        self.cache.invalidate(ENTRIES_CACHE_KEY).await;
        Ok(())
    }
}

/// One greater than the largest identifier, or 1 for an empty collection
pub fn next_id(entries: &[Entry]) -> AppResult<u64> {
    entries
        .iter()
        .map(|entry| entry.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| AppError::internal("Entry identifiers exhausted"))
}

fn parse_import(document: &[u8]) -> AppResult<Vec<NewEntry>> {
    let items: Vec<EntryCreateRequest> = serde_json::from_slice(document)
        .map_err(|e| AppError::unreadable_input(format!("Import document is not a JSON array of entries: {e}")))?;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.validate().map_err(|e| match e {
                AppError::Validation { message } => {
                    AppError::validation(format!("Imported entry {index}: {message}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// In-memory store that counts how often the collection is read
    #[derive(Default)]
    struct CountingStore {
        entries: StdMutex<Vec<Entry>>,
        loads: AtomicUsize,
        saves: AtomicUsize,
    }

    impl CountingStore {
        fn with(entries: Vec<Entry>) -> Self {
            Self {
                entries: StdMutex::new(entries),
                ..Default::default()
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        fn snapshot(&self) -> Vec<Entry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntryStore for CountingStore {
        async fn load_all(&self) -> Vec<Entry> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().unwrap().clone()
        }

        async fn save_all(&self, entries: &[Entry]) -> AppResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.entries.lock().unwrap() = entries.to_vec();
            Ok(())
        }
    }

    fn entry(id: u64, title: &str, genre: &str) -> Entry {
        Entry {
            id,
            title: title.to_string(),
            author: "A".to_string(),
            year: 2000,
            genre: genre.to_string(),
        }
    }

    fn doc(bytes: &[u8]) -> Option<&[u8]> {
        Some(bytes)
    }

    fn create_request(title: &str) -> EntryCreateRequest {
        EntryCreateRequest {
            title: Some(title.to_string()),
            author: Some("Author".to_string()),
            year: Some(1990),
            genre: Some("Fiction".to_string()),
        }
    }

    fn service(entries: Vec<Entry>) -> (CatalogService, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::with(entries));
        let service = CatalogService::new(
            store.clone(),
            LookupCache::default(),
            NotificationHub::default(),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_create_assigns_max_plus_one() {
        let (service, store) = service(vec![]);

        assert_eq!(service.create(create_request("a")).await.unwrap().id, 1);
        assert_eq!(service.create(create_request("b")).await.unwrap().id, 2);

        service.delete(1).await.unwrap();
        assert_eq!(service.create(create_request("c")).await.unwrap().id, 3);

        let (service, _) = self::service(vec![entry(7, "x", "g"), entry(3, "y", "g")]);
        assert_eq!(service.create(create_request("d")).await.unwrap().id, 8);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let (service, store) = service(vec![]);
        let request = EntryCreateRequest {
            title: Some("t".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.create(request).await,
            Err(AppError::Validation { .. })
        ));
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_list_two_entries_single_page() {
        let (service, _) = service(vec![entry(1, "a", "g"), entry(2, "b", "g")]);
        let page = service.list(1, 10).await.unwrap();

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.total_pages, 1);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_previous);
    }

    #[tokio::test]
    async fn test_list_out_of_range_page_is_empty() {
        let (service, _) = service(vec![entry(1, "a", "g"), entry(2, "b", "g"), entry(3, "c", "g")]);

        let second = service.list(2, 2).await.unwrap();
        assert_eq!(second.entries, vec![entry(3, "c", "g")]);
        assert!(second.pagination.has_previous);
        assert!(!second.pagination.has_next);

        let beyond = service.list(9, 2).await.unwrap();
        assert!(beyond.entries.is_empty());
        assert_eq!(beyond.pagination.total, 3);
    }

    #[tokio::test]
    async fn test_list_uses_cache_until_mutation() {
        let (service, store) = service(vec![entry(1, "a", "g")]);

        service.list(1, 10).await.unwrap();
        service.list(1, 10).await.unwrap();
        assert_eq!(store.loads(), 1);

        service.create(create_request("b")).await.unwrap();
        let loads_after_create = store.loads();
        let page = service.list(1, 10).await.unwrap();
        assert_eq!(store.loads(), loads_after_create + 1);
        assert_eq!(page.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_get_by_id_bypasses_cache() {
        let (service, store) = service(vec![entry(1, "a", "g")]);
        service.list(1, 10).await.unwrap();

        assert_eq!(service.get_by_id(1).await.unwrap().title, "a");
        assert_eq!(store.loads(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_on_empty_collection_is_not_found() {
        let (service, _) = service(vec![]);
        for id in [0, 1, 42, u64::MAX] {
            assert!(matches!(
                service.get_by_id(id).await,
                Err(AppError::NotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_update_merges_provided_fields() {
        let (service, store) = service(vec![entry(1, "Old", "G")]);
        let request = EntryUpdateRequest {
            title: Some("X".to_string()),
            ..Default::default()
        };

        let updated = service.update(1, request).await.unwrap();
        assert_eq!(updated, entry(1, "X", "G"));
        assert_eq!(store.snapshot(), vec![entry(1, "X", "G")]);
    }

    #[tokio::test]
    async fn test_update_missing_entry() {
        let (service, store) = service(vec![entry(1, "Old", "G")]);
        let result = service.update(2, EntryUpdateRequest::default()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_entry_leaves_collection() {
        let (service, store) = service(vec![entry(1, "a", "g")]);
        assert!(matches!(
            service.delete(5).await,
            Err(AppError::NotFound { .. })
        ));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_broadcast_once_each() {
        let (service, _) = service(vec![]);
        let mut events = service.notifications().subscribe();

        let created = service.create(create_request("a")).await.unwrap();
        let updated = service
            .update(
                created.id,
                EntryUpdateRequest {
                    year: Some(2024),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service.delete(created.id).await.unwrap();
        service
            .bulk_import(doc(br#"[{"title":"t","author":"a","year":1,"genre":"g"}]"#))
            .await
            .unwrap();

        assert_eq!(events.recv().await.unwrap(), CatalogEvent::EntryAdded(created.clone()));
        assert_eq!(events.recv().await.unwrap(), CatalogEvent::EntryUpdated(updated));
        assert_eq!(events.recv().await.unwrap(), CatalogEvent::EntryDeleted(created.id));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_mutations_do_not_broadcast() {
        let (service, _) = service(vec![]);
        let mut events = service.notifications().subscribe();

        let _ = service.delete(1).await;
        let _ = service.update(1, EntryUpdateRequest::default()).await;
        let _ = service.create(EntryCreateRequest::default()).await;

        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_recommend_by_category_ignores_case() {
        let (service, _) = service(vec![
            entry(1, "a", "fiction"),
            entry(2, "b", "History"),
            entry(3, "c", "FICTION"),
        ]);

        let matches = service.recommend_by_category("Fiction").await.unwrap();
        assert_eq!(
            matches.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(service.recommend_by_category("Poetry").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_import_assigns_sequential_ids() {
        let (service, store) = service(vec![entry(5, "existing", "g"), entry(2, "older", "g")]);
        let document = br#"[
            {"title": "First", "author": "A", "year": 2001, "genre": "g"},
            {"title": "Second", "author": "B", "year": 2002, "genre": "g"}
        ]"#;

        let summary = service.bulk_import(Some(document)).await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.entries[0].id, 6);
        assert_eq!(summary.entries[0].title, "First");
        assert_eq!(summary.entries[1].id, 7);
        assert_eq!(summary.entries[1].title, "Second");
        assert_eq!(store.snapshot().len(), 4);
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bulk_import_invalidates_listing_cache() {
        let (service, _) = service(vec![]);
        assert_eq!(service.list(1, 10).await.unwrap().pagination.total, 0);

        service
            .bulk_import(doc(br#"[{"title":"t","author":"a","year":1,"genre":"g"}]"#))
            .await
            .unwrap();
        assert_eq!(service.list(1, 10).await.unwrap().pagination.total, 1);
    }

    #[tokio::test]
    async fn test_bulk_import_error_kinds() {
        let (service, store) = service(vec![]);

        assert!(matches!(
            service.bulk_import(None).await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            service.bulk_import(doc(b"not json")).await,
            Err(AppError::UnreadableInput { .. })
        ));
        assert!(matches!(
            service.bulk_import(doc(br#"{"title": "object"}"#)).await,
            Err(AppError::UnreadableInput { .. })
        ));
        assert!(matches!(
            service.bulk_import(doc(br#"[{"title": "no author", "year": 1, "genre": "g"}]"#)).await,
            Err(AppError::Validation { ref message }) if message.contains("entry 0")
        ));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_creates_do_not_lose_updates() {
        let (service, store) = service(vec![]);
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.create(create_request(&format!("t{i}"))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut ids: Vec<u64> = store.snapshot().iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]).unwrap(), 1);
        assert_eq!(next_id(&[entry(3, "a", "g"), entry(1, "b", "g")]).unwrap(), 4);
        assert!(matches!(
            next_id(&[entry(u64::MAX, "last", "g")]),
            Err(AppError::Internal { .. })
        ));
    }

    #[tokio::test]
    async fn test_identifier_exhaustion_is_rejected() {
        let (service, store) = service(vec![entry(u64::MAX, "last", "g")]);
        assert!(matches!(
            service.create(create_request("a")).await,
            Err(AppError::Internal { .. })
        ));

        let (near_end, _) = self::service(vec![entry(u64::MAX - 1, "almost", "g")]);
        let two = br#"[
            {"title": "t1", "author": "a", "year": 1, "genre": "g"},
            {"title": "t2", "author": "a", "year": 1, "genre": "g"}
        ]"#;
        assert!(matches!(
            near_end.bulk_import(doc(two)).await,
            Err(AppError::Internal { .. })
        ));

        let one = br#"[{"title": "t1", "author": "a", "year": 1, "genre": "g"}]"#;
        let summary = near_end.bulk_import(doc(one)).await.unwrap();
        assert_eq!(summary.entries[0].id, u64::MAX);
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    /// Store whose first read parks after taking its snapshot until released
    struct GatedStore {
        inner: CountingStore,
        gate_first_read: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: CountingStore::default(),
                gate_first_read: AtomicBool::new(true),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl EntryStore for GatedStore {
        async fn load_all(&self) -> Vec<Entry> {
            let snapshot = self.inner.load_all().await;
            if self.gate_first_read.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            snapshot
        }

        async fn save_all(&self, entries: &[Entry]) -> AppResult<()> {
            self.inner.save_all(entries).await
        }
    }

    #[tokio::test]
    async fn test_slow_listing_read_cannot_cache_over_a_mutation() {
        let store = Arc::new(GatedStore::new());
        let service = CatalogService::new(
            store.clone(),
            LookupCache::default(),
            NotificationHub::default(),
        );

        let lister = {
            let service = service.clone();
            tokio::spawn(async move { service.list(1, 10).await })
        };
        store.entered.notified().await;

        let creator = {
            let service = service.clone();
            tokio::spawn(async move { service.create(create_request("late")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.release.notify_one();

        assert_eq!(lister.await.unwrap().unwrap().pagination.total, 0);
        creator.await.unwrap().unwrap();

        assert_eq!(store.inner.snapshot().len(), 1);
        assert_eq!(service.list(1, 10).await.unwrap().pagination.total, 1);
    }
}
