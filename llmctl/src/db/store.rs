//! In-memory tables backing the repositories.
//!
//! Each entity kind lives in its own [`Table`], guarded by its own `tokio::sync::Mutex`. A
//! handler locks exactly one table for the duration of one repository call, which is what
//! serialises mutations per collection (most importantly `set_default` on the models table).

use crate::db::models::llm_models::ModelRecord;
use crate::db::models::{api_keys::ApiKeyDBResponse, database_connections::DatabaseConnectionDBResponse, users::UserDBResponse};
use crate::types::ModelId;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A row that can be stored in a [`Table`].
pub trait Record: Clone + Send {
    type Id: PartialEq + Clone + Send + Sync;

    fn id(&self) -> &Self::Id;
}

/// Rows kept in insertion order.
#[derive(Debug)]
pub struct Table<T: Record> {
    rows: Vec<T>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record> Table<T> {
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.rows.iter_mut().find(|row| row.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, row: T) {
        self.rows.push(row);
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.rows.iter().position(|row| row.id() == id)?;
        Some(self.rows.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The models table, which additionally owns the default-model pointer.
///
/// Whenever the table is non-empty exactly one model is the default. The pointer is only
/// moved through [`ModelTable::set_default`], [`ModelTable::insert`] and
/// [`ModelTable::remove`], so there is never a moment with zero or several defaults.
#[derive(Debug, Default)]
pub struct ModelTable {
    rows: Table<ModelRecord>,
    default_id: Option<ModelId>,
}

impl ModelTable {
    pub fn get(&self, id: &ModelId) -> Option<&ModelRecord> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &ModelId) -> Option<&mut ModelRecord> {
        self.rows.get_mut(id)
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.rows.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn default_id(&self) -> Option<&ModelId> {
        self.default_id.as_ref()
    }

    pub fn is_default(&self, id: &ModelId) -> bool {
        self.default_id.as_ref() == Some(id)
    }

    /// Insert a model. The first model inserted becomes the default, as does any model
    /// inserted with `make_default`.
    pub fn insert(&mut self, row: ModelRecord, make_default: bool) {
        let id = row.id.clone();
        self.rows.insert(row);
        if make_default || self.default_id.is_none() {
            self.default_id = Some(id);
        }
    }

    /// Point the default at `id`. Returns false, leaving the pointer untouched, when no such
    /// model exists.
    pub fn set_default(&mut self, id: &ModelId) -> bool {
        if !self.rows.contains(id) {
            return false;
        }
        self.default_id = Some(id.clone());
        true
    }

    /// Remove a model. Removing the default promotes the first remaining model.
    pub fn remove(&mut self, id: &ModelId) -> Option<ModelRecord> {
        let removed = self.rows.remove(id)?;
        if self.is_default(id) {
            self.default_id = self.rows.iter().next().map(|row| row.id.clone());
        }
        Some(removed)
    }
}

/// All tables of the service. Cheap to clone; clones share the same tables.
#[derive(Clone, Default)]
pub struct Store {
    connections: Arc<Mutex<Table<DatabaseConnectionDBResponse>>>,
    api_keys: Arc<Mutex<Table<ApiKeyDBResponse>>>,
    models: Arc<Mutex<ModelTable>>,
    users: Arc<Mutex<Table<UserDBResponse>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connections(&self) -> MutexGuard<'_, Table<DatabaseConnectionDBResponse>> {
        self.connections.lock().await
    }

    pub async fn api_keys(&self) -> MutexGuard<'_, Table<ApiKeyDBResponse>> {
        self.api_keys.lock().await
    }

    pub async fn models(&self) -> MutexGuard<'_, ModelTable> {
        self.models.lock().await
    }

    pub async fn users(&self) -> MutexGuard<'_, Table<UserDBResponse>> {
        self.users.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::llm_models::{ModelConfig, ModelHealth};
    use chrono::Utc;

    fn model(id: &str) -> ModelRecord {
        ModelRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            provider: "OpenAI".to_string(),
            version: format!("{id}-0125"),
            context_length: 8192,
            cost_per_1k: 0.01,
            enabled: true,
            health: ModelHealth::Healthy,
            config: ModelConfig::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_model_becomes_default() {
        let mut table = ModelTable::default();
        assert_eq!(table.default_id(), None);

        table.insert(model("a"), false);
        table.insert(model("b"), false);
        assert_eq!(table.default_id(), Some(&"a".to_string()));
    }

    #[test]
    fn test_set_default_unknown_id_keeps_pointer() {
        let mut table = ModelTable::default();
        table.insert(model("a"), false);

        assert!(!table.set_default(&"missing".to_string()));
        assert!(table.is_default(&"a".to_string()));
    }

    #[test]
    fn test_removing_default_promotes_first_remaining() {
        let mut table = ModelTable::default();
        table.insert(model("a"), false);
        table.insert(model("b"), false);
        table.insert(model("c"), true);

        table.remove(&"c".to_string());
        assert_eq!(table.default_id(), Some(&"a".to_string()));

        table.remove(&"a".to_string());
        assert_eq!(table.default_id(), Some(&"b".to_string()));

        table.remove(&"b".to_string());
        assert_eq!(table.default_id(), None);
    }

    #[test]
    fn test_table_keeps_insertion_order() {
        let mut table = ModelTable::default();
        for id in ["z", "a", "m"] {
            table.insert(model(id), false);
        }
        let ids: Vec<_> = table.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }
}
