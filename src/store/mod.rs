pub(crate) mod filter;
pub(crate) mod memory;
pub(crate) mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::domain::{Category, Quiz, User};
pub(crate) use filter::{Filter, Page};
use memory::MemoryRepository;
use postgres::PgRepository;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("entity has no primary key after sequence assignment")]
    MissingKey,
}

/// A persistable entity. Keys are strings at the storage boundary: natural
/// keys (user email) stay as-is, sequence keys are stringified integers.
pub(crate) trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    /// Primary key, `None` until the store has assigned one.
    fn key(&self) -> Option<String>;

    /// Sequence scopes for every identifier the store still has to assign,
    /// in assignment order. Empty for naturally keyed entities.
    fn unassigned_sequences(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Binds freshly allocated sequence values, same order as
    /// [`Document::unassigned_sequences`].
    fn assign_sequences(&mut self, _values: &mut dyn Iterator<Item = i64>) {}
}

/// Storage capability set: get, filter, persist (create-or-update by
/// identity), delete. Implemented independently by the Postgres document
/// store and the in-memory store used in tests.
#[async_trait]
pub(crate) trait Repository<T: Document>: Send + Sync {
    async fn filter(&self, filter: &Filter, page: Page) -> Result<Vec<T>, StoreError>;

    async fn persist(&self, item: T) -> Result<T, StoreError>;

    async fn delete(&self, item: &T) -> Result<(), StoreError>;

    /// Get-by-key degrades to first-match-or-not-found over the key filter.
    async fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let rows = self.filter(&Filter::by_key(key), Page::first()).await?;
        Ok(first_or_default(rows))
    }
}

/// First element of a sequence, or `None` when it is empty.
pub(crate) fn first_or_default<T>(items: Vec<T>) -> Option<T> {
    items.into_iter().next()
}

/// Holds one repository per entity collection.
#[derive(Clone)]
pub(crate) struct Repositories {
    inner: Arc<Inner>,
}

struct Inner {
    users: Box<dyn Repository<User>>,
    categories: Box<dyn Repository<Category>>,
    quizzes: Box<dyn Repository<Quiz>>,
}

impl Repositories {
    pub(crate) fn postgres(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(Inner {
                users: Box::new(PgRepository::new(pool.clone())),
                categories: Box::new(PgRepository::new(pool.clone())),
                quizzes: Box::new(PgRepository::new(pool)),
            }),
        }
    }

    pub(crate) fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: Box::new(MemoryRepository::new()),
                categories: Box::new(MemoryRepository::new()),
                quizzes: Box::new(MemoryRepository::new()),
            }),
        }
    }

    pub(crate) fn users(&self) -> &dyn Repository<User> {
        self.inner.users.as_ref()
    }

    pub(crate) fn categories(&self) -> &dyn Repository<Category> {
        self.inner.categories.as_ref()
    }

    pub(crate) fn quizzes(&self) -> &dyn Repository<Quiz> {
        self.inner.quizzes.as_ref()
    }

    /// Cheap read used by the health endpoint.
    pub(crate) async fn ping(&self) -> Result<(), StoreError> {
        self.users().filter(&Filter::new(), Page::first()).await.map(|_| ())
    }
}
