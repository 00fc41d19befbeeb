use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{Document, Filter, Page, Repository, StoreError};

/// In-memory repository for tests. Keeps documents in insertion order and
/// hands out sequence identifiers from in-process counters, mirroring the
/// Postgres store's observable behavior without a database.
pub(crate) struct MemoryRepository<T> {
    rows: Mutex<Vec<(String, Value)>>,
    sequences: Mutex<HashMap<&'static str, i64>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MemoryRepository<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            sequences: Mutex::new(HashMap::new()),
            _marker: PhantomData,
        }
    }
}

fn relock<'a, V>(guard: Result<MutexGuard<'a, V>, PoisonError<MutexGuard<'a, V>>>) -> MutexGuard<'a, V> {
    guard.unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl<T: Document> Repository<T> for MemoryRepository<T> {
    async fn filter(&self, filter: &Filter, page: Page) -> Result<Vec<T>, StoreError> {
        let rows = relock(self.rows.lock());
        rows.iter()
            .filter(|(key, doc)| filter.matches(key, doc))
            .skip(page.skip.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .map(|(_, doc)| serde_json::from_value(doc.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn persist(&self, mut item: T) -> Result<T, StoreError> {
        let scopes = item.unassigned_sequences();
        if !scopes.is_empty() {
            let mut counters = relock(self.sequences.lock());
            let values: Vec<i64> = scopes
                .iter()
                .map(|scope| {
                    let counter = counters.entry(scope).or_insert(0);
                    *counter += 1;
                    *counter
                })
                .collect();
            item.assign_sequences(&mut values.into_iter());
        }

        let key = item.key().ok_or(StoreError::MissingKey)?;
        let doc = serde_json::to_value(&item)?;

        let mut rows = relock(self.rows.lock());
        match rows.iter_mut().find(|(existing, _)| *existing == key) {
            Some(row) => row.1 = doc,
            None => rows.push((key, doc)),
        }
        Ok(item)
    }

    async fn delete(&self, item: &T) -> Result<(), StoreError> {
        let key = item.key().ok_or(StoreError::MissingKey)?;
        relock(self.rows.lock()).retain(|(existing, _)| *existing != key);
        Ok(())
    }
}
