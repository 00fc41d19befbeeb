use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, Postgres, QueryBuilder};

use super::{filter::Clause, Document, Filter, Page, Repository, StoreError};
use crate::core::config::Settings;

pub(crate) async fn init_pool(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    let mut connect_options: PgConnectOptions = settings.database().database_url.parse()?;

    connect_options = connect_options
        .application_name("quizdeck")
        .log_statements(tracing::log::LevelFilter::Off);

    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await
}

pub(crate) async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Document repository over a Postgres JSONB table. Each entity collection
/// maps to rows in `documents`; store-assigned identifiers come from the
/// `sequences` counter table.
pub(crate) struct PgRepository<T> {
    pool: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PgRepository<T> {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool, _marker: PhantomData }
    }
}

/// Reserves `count` consecutive values for a sequence scope and returns the
/// highest one.
async fn allocate_block(pool: &PgPool, scope: &str, count: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO sequences (scope, value) VALUES ($1, $2)
         ON CONFLICT (scope) DO UPDATE SET value = sequences.value + EXCLUDED.value
         RETURNING value",
    )
    .bind(scope)
    .bind(count)
    .fetch_one(pool)
    .await
}

fn escape_like(needle: &str) -> String {
    needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl<T: Document> Repository<T> for PgRepository<T> {
    async fn filter(&self, filter: &Filter, page: Page) -> Result<Vec<T>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT doc FROM documents WHERE collection = ");
        builder.push_bind(T::COLLECTION);

        // Field names in clauses come from code, never from clients, so
        // interpolating them into the JSONB path is safe; values are bound.
        for clause in filter.clauses() {
            match clause {
                Clause::Key(key) => {
                    builder.push(" AND key = ");
                    builder.push_bind(key.clone());
                }
                Clause::Equals(field, value) => match value {
                    Value::String(text) => {
                        builder.push(format!(" AND doc->>'{field}' = "));
                        builder.push_bind(text.clone());
                    }
                    other => {
                        builder.push(format!(" AND doc->'{field}' = "));
                        builder.push_bind(other.clone());
                    }
                },
                Clause::Contains(field, needle) => {
                    builder.push(format!(" AND doc->>'{field}' ILIKE "));
                    builder.push_bind(format!("%{}%", escape_like(needle)));
                }
                Clause::In(field, values) => {
                    builder.push(" AND (");
                    if values.is_empty() {
                        builder.push("FALSE");
                    } else {
                        for (index, value) in values.iter().enumerate() {
                            if index > 0 {
                                builder.push(" OR ");
                            }
                            // jsonb containment: an array contains a scalar
                            // when the scalar equals one of its elements.
                            builder.push(format!("doc->'{field}' @> "));
                            builder.push_bind(value.clone());
                        }
                    }
                    builder.push(")");
                }
            }
        }

        builder.push(" ORDER BY seq OFFSET ");
        builder.push_bind(page.skip);
        builder.push(" LIMIT ");
        builder.push_bind(page.limit);

        let docs: Vec<Value> = builder.build_query_scalar().fetch_all(&self.pool).await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    async fn persist(&self, mut item: T) -> Result<T, StoreError> {
        let scopes = item.unassigned_sequences();
        if !scopes.is_empty() {
            let mut counts: Vec<(&'static str, i64)> = Vec::new();
            for scope in scopes.iter().copied() {
                match counts.iter_mut().find(|(existing, _)| *existing == scope) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((scope, 1)),
                }
            }

            let mut next: HashMap<&'static str, i64> = HashMap::new();
            for (scope, count) in &counts {
                let high = allocate_block(&self.pool, scope, *count).await?;
                next.insert(scope, high - count + 1);
            }

            let mut values = Vec::with_capacity(scopes.len());
            for scope in scopes.iter().copied() {
                let cursor = next.entry(scope).or_insert(0);
                values.push(*cursor);
                *cursor += 1;
            }
            item.assign_sequences(&mut values.into_iter());
        }

        let key = item.key().ok_or(StoreError::MissingKey)?;
        let doc = serde_json::to_value(&item)?;

        sqlx::query(
            "INSERT INTO documents (collection, key, doc) VALUES ($1, $2, $3)
             ON CONFLICT (collection, key) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(T::COLLECTION)
        .bind(&key)
        .bind(&doc)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete(&self, item: &T) -> Result<(), StoreError> {
        let key = item.key().ok_or(StoreError::MissingKey)?;
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(T::COLLECTION)
            .bind(&key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
