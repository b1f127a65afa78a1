//! Model store: the persistence seam content blocks write through.
//!
//! [`ModelStore`] is the minimal async CRUD interface the form pipeline
//! needs. [`InMemoryStore`] implements it over per-model tables and honours
//! each foreign key's [`OnDelete`] behaviour when rows are deleted.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use public_forms_core::{PublicFormsError, PublicFormsResult};

use crate::fields::{FieldType, OnDelete};
use crate::model::{ModelMeta, Record};
use crate::value::Value;

/// Async CRUD over model rows.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Fetches one row by primary key.
    ///
    /// Returns [`PublicFormsError::DoesNotExist`] if there is no such row.
    async fn get(&self, meta: &'static ModelMeta, pk: i64) -> PublicFormsResult<Record>;

    /// Inserts `record`, assigns its primary key and returns it.
    async fn insert(&self, record: &mut Record) -> PublicFormsResult<i64>;

    /// Overwrites the stored row with `record`'s values.
    async fn update(&self, record: &Record) -> PublicFormsResult<()>;

    /// Deletes one row and everything its foreign keys cascade to.
    /// Returns the number of rows removed.
    async fn delete(&self, meta: &'static ModelMeta, pk: i64) -> PublicFormsResult<usize>;

    /// Returns the rows whose `field` equals `value`, ordered by primary key.
    async fn filter_eq(
        &self,
        meta: &'static ModelMeta,
        field: &str,
        value: &Value,
    ) -> PublicFormsResult<Vec<Record>>;

    /// Returns the number of rows of `meta`.
    async fn count(&self, meta: &'static ModelMeta) -> PublicFormsResult<usize>;
}

struct Table {
    meta: &'static ModelMeta,
    next_pk: i64,
    rows: BTreeMap<i64, Record>,
}

impl Table {
    const fn new(meta: &'static ModelMeta) -> Self {
        Self {
            meta,
            next_pk: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// A process-local [`ModelStore`].
///
/// Tables are created on first use. Every successful insert, update and
/// delete bumps [`InMemoryStore::write_count`].
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use public_forms_db::{FieldDef, FieldType, InMemoryStore, ModelMeta, ModelStore, Record};
///
/// static NOTE: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new("app", "note")
///         .field(FieldDef::auto_pk())
///         .field(FieldDef::new("text", FieldType::TextField))
/// });
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryStore::new();
/// let mut note = Record::new(&NOTE).with("text", "hello");
/// let pk = store.insert(&mut note).await.unwrap();
/// assert_eq!(store.get(&NOTE, pk).await.unwrap().get("text").to_string(), "hello");
/// # });
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn key(meta: &ModelMeta) -> String {
        meta.label().to_ascii_lowercase()
    }

    fn does_not_exist(meta: &ModelMeta, pk: i64) -> PublicFormsError {
        PublicFormsError::DoesNotExist(format!("{} matching pk={pk} does not exist", meta.label()))
    }

    /// Walks the foreign keys pointing at `(label, pk)` and returns the rows
    /// to delete and the columns to null out, without touching anything.
    fn plan_delete(
        tables: &HashMap<String, Table>,
        label: String,
        pk: i64,
    ) -> PublicFormsResult<(Vec<(String, i64)>, Vec<(String, i64, &'static str)>)> {
        let mut queue = VecDeque::from([(label, pk)]);
        let mut seen = HashSet::new();
        let mut deletions = Vec::new();
        let mut nullify = Vec::new();

        while let Some((label, pk)) = queue.pop_front() {
            if !seen.insert((label.clone(), pk)) {
                continue;
            }
            for (table_key, table) in tables {
                for fk in table.meta.foreign_keys() {
                    let FieldType::ForeignKey { to, on_delete, .. } = &fk.field_type else {
                        continue;
                    };
                    if !to.eq_ignore_ascii_case(&label) {
                        continue;
                    }
                    let mut referencing = table
                        .rows
                        .iter()
                        .filter(|(_, row)| row.get(fk.name).as_i64() == Some(pk))
                        .map(|(row_pk, _)| *row_pk);
                    match on_delete {
                        OnDelete::Cascade => {
                            queue.extend(referencing.map(|row_pk| (table_key.clone(), row_pk)));
                        }
                        OnDelete::Protect => {
                            if referencing.next().is_some() {
                                return Err(PublicFormsError::IntegrityError(format!(
                                    "Cannot delete {label} pk={pk}: protected by {}.{}",
                                    table.meta.label(),
                                    fk.name
                                )));
                            }
                        }
                        OnDelete::SetNull => {
                            nullify.extend(
                                referencing.map(|row_pk| (table_key.clone(), row_pk, fk.name)),
                            );
                        }
                        OnDelete::DoNothing => {}
                    }
                }
            }
            deletions.push((label, pk));
        }
        Ok((deletions, nullify))
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("writes", &self.write_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelStore for InMemoryStore {
    async fn get(&self, meta: &'static ModelMeta, pk: i64) -> PublicFormsResult<Record> {
        let tables = self.tables.read().await;
        tables
            .get(&Self::key(meta))
            .and_then(|t| t.rows.get(&pk))
            .cloned()
            .ok_or_else(|| Self::does_not_exist(meta, pk))
    }

    async fn insert(&self, record: &mut Record) -> PublicFormsResult<i64> {
        let mut tables = self.tables.write().await;
        let table = tables
            .entry(Self::key(record.meta))
            .or_insert_with(|| Table::new(record.meta));
        let pk = match record.pk {
            Some(pk) if table.rows.contains_key(&pk) => {
                return Err(PublicFormsError::IntegrityError(format!(
                    "{} with pk={pk} already exists",
                    record.label()
                )));
            }
            Some(pk) => pk,
            None => table.next_pk,
        };
        table.next_pk = table.next_pk.max(pk + 1);
        record.pk = Some(pk);
        table.rows.insert(pk, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(model = %record.label(), pk, "inserted row");
        Ok(pk)
    }

    async fn update(&self, record: &Record) -> PublicFormsResult<()> {
        let Some(pk) = record.pk else {
            return Err(PublicFormsError::DatabaseError(format!(
                "Cannot update unsaved {}",
                record.label()
            )));
        };
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&Self::key(record.meta))
            .and_then(|t| t.rows.get_mut(&pk))
            .ok_or_else(|| Self::does_not_exist(record.meta, pk))?;
        *row = record.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(model = %record.label(), pk, "updated row");
        Ok(())
    }

    async fn delete(&self, meta: &'static ModelMeta, pk: i64) -> PublicFormsResult<usize> {
        let mut tables = self.tables.write().await;
        let key = Self::key(meta);
        if !tables.get(&key).is_some_and(|t| t.rows.contains_key(&pk)) {
            return Err(Self::does_not_exist(meta, pk));
        }

        let (deletions, nullify) = Self::plan_delete(&tables, key, pk)?;
        let mut removed = 0;
        for (table_key, row_pk) in &deletions {
            if let Some(table) = tables.get_mut(table_key) {
                removed += usize::from(table.rows.remove(row_pk).is_some());
            }
        }
        for (table_key, row_pk, column) in nullify {
            if let Some(row) = tables
                .get_mut(&table_key)
                .and_then(|t| t.rows.get_mut(&row_pk))
            {
                row.set(column, Value::Null);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(model = %meta.label(), pk, removed, "deleted rows");
        Ok(removed)
    }

    async fn filter_eq(
        &self,
        meta: &'static ModelMeta,
        field: &str,
        value: &Value,
    ) -> PublicFormsResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&Self::key(meta)) else {
            return Ok(Vec::new());
        };
        let by_pk = field == meta.pk_name();
        Ok(table
            .rows
            .values()
            .filter(|row| {
                if by_pk {
                    row.pk == value.as_i64()
                } else {
                    row.get(field) == value
                }
            })
            .cloned()
            .collect())
    }

    async fn count(&self, meta: &'static ModelMeta) -> PublicFormsResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables.get(&Self::key(meta)).map_or(0, |t| t.rows.len()))
    }
}
