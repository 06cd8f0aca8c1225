//! In-memory repository.
//!
//! Stores items as JSON documents keyed by id, so filters and partial
//! updates behave the way they do against a document database.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Only poisoned locks panic

use commander_core::repository::{
    ConditionOperator, Delta, Filter, Index, matches_all, prune_empty,
};
use commander_core::{Identifiable, ReadOnlyRepository, Repository, RepositoryError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

/// In-memory repository for fast, deterministic tests.
///
/// Clones share storage. [`fail_with`](Self::fail_with) turns every
/// subsequent call into a transport failure, which is how tests simulate a
/// broken store.
///
/// # Example
///
/// ```
/// use commander_core::{Identifiable, ReadOnlyRepository, Repository};
/// use commander_testing::InMemoryRepository;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct User { id: String }
///
/// impl Identifiable for User {
///     fn id(&self) -> &str { &self.id }
/// }
///
/// # tokio_test::block_on(async {
/// let users = InMemoryRepository::new();
/// users.create(User { id: "u-1".into() }).await.unwrap();
/// assert!(users.exists("u-1", None).await.unwrap());
/// # });
/// ```
pub struct InMemoryRepository<T> {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
    failure: Arc<RwLock<Option<String>>>,
    _item: PhantomData<fn() -> T>,
}

impl<T> InMemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Identifiable,
{
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            failure: Arc::new(RwLock::new(None)),
            _item: PhantomData,
        }
    }

    /// Create a repository seeded with `items`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Transport`] if an item cannot be serialized.
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Result<Self, RepositoryError> {
        let repository = Self::new();
        for item in items {
            repository.store(&item)?;
        }
        Ok(repository)
    }

    /// Make every later call fail with a transport error carrying `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write().unwrap() = Some(reason.into());
    }

    /// Undo [`fail_with`](Self::fail_with).
    pub fn recover(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// Raw stored document for `id`.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<Value> {
        self.documents.read().unwrap().get(id).cloned()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().unwrap().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().unwrap().is_empty()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        match self.failure.read().unwrap().as_deref() {
            Some(reason) => Err(RepositoryError::Transport(anyhow::anyhow!(reason.to_string()))),
            None => Ok(()),
        }
    }

    fn store(&self, item: &T) -> Result<(), RepositoryError> {
        let mut document = serde_json::to_value(item).map_err(transport)?;
        prune_empty(&mut document);
        self.documents
            .write()
            .unwrap()
            .insert(item.id().to_string(), document);
        Ok(())
    }

    fn select(&self, predicate: impl Fn(&Value) -> bool) -> Result<Vec<T>, RepositoryError> {
        self.documents
            .read()
            .unwrap()
            .values()
            .filter(|document| predicate(document))
            .map(decode)
            .collect()
    }
}

fn transport(err: serde_json::Error) -> RepositoryError {
    RepositoryError::Transport(err.into())
}

fn decode<T: DeserializeOwned>(document: &Value) -> Result<T, RepositoryError> {
    serde_json::from_value(document.clone()).map_err(transport)
}

fn property_equals(document: &Value, property: &str, query: &str) -> bool {
    match document.get(property) {
        Some(Value::String(text)) => text == query,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == query,
    }
}

impl<T> ReadOnlyRepository<T> for InMemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Identifiable + Send,
{
    async fn get(&self, id: &str) -> Result<T, RepositoryError> {
        self.check()?;
        let document = self.document(id).ok_or_else(|| {
            RepositoryError::not_found(format!("No item found with id {id}"))
        })?;
        decode(&document)
    }

    async fn get_by_index(&self, query: &str, index: &Index) -> Result<T, RepositoryError> {
        self.check()?;
        let mut found = self.select(|document| property_equals(document, &index.property, query))?;
        match found.len() {
            0 => Err(RepositoryError::not_found(format!(
                "No item found with {}:{query}",
                index.property
            ))),
            1 => Ok(found.remove(0)),
            _ => Err(RepositoryError::Duplicate {
                property: index.property.clone(),
                value: query.to_string(),
            }),
        }
    }

    async fn exists(&self, query: &str, index: Option<&Index>) -> Result<bool, RepositoryError> {
        self.check()?;
        let documents = self.documents.read().unwrap();
        Ok(match index {
            None => documents.contains_key(query),
            Some(index) => documents
                .values()
                .any(|document| property_equals(document, &index.property, query)),
        })
    }

    async fn count(&self, query: Option<(&str, &Index)>) -> Result<usize, RepositoryError> {
        self.check()?;
        let documents = self.documents.read().unwrap();
        Ok(match query {
            None => documents.len(),
            Some((query, index)) => documents
                .values()
                .filter(|document| property_equals(document, &index.property, query))
                .count(),
        })
    }

    async fn query(&self, query: &str, index: &Index) -> Result<Vec<T>, RepositoryError> {
        self.check()?;
        self.select(|document| property_equals(document, &index.property, query))
    }

    async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        self.check()?;
        self.select(|_| true)
    }

    async fn scan(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        self.check()?;
        let found = self.select(|document| filter.matches(document))?;
        if found.is_empty() {
            return Err(RepositoryError::not_found(format!(
                "No items found matching {}",
                filter.name
            )));
        }
        Ok(found)
    }
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Identifiable + Send,
{
    async fn create(&self, item: T) -> Result<T, RepositoryError> {
        self.check()?;
        self.store(&item)?;
        Ok(item)
    }

    async fn update(&self, item: T) -> Result<(), RepositoryError> {
        self.check()?;
        self.store(&item)
    }

    async fn update_delta(&self, id: &str, delta: Delta) -> Result<(), RepositoryError> {
        self.check()?;
        let mut documents = self.documents.write().unwrap();
        let Some(Value::Object(document)) = documents.get_mut(id) else {
            return Err(RepositoryError::not_found(format!("No item found with id {id}")));
        };

        let removal = match delta.iter().next() {
            Some((property, Value::String(value))) if delta.len() == 1 && value.is_empty() => {
                Some(property.clone())
            }
            _ => None,
        };

        match removal {
            Some(property) => {
                document.remove(&property);
            }
            None => {
                document.extend(delta);
                let mut pruned = Value::Object(std::mem::take(document));
                prune_empty(&mut pruned);
                if let Value::Object(pruned) = pruned {
                    *document = pruned;
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.check()?;
        self.documents.write().unwrap().remove(id);
        Ok(())
    }

    async fn exists_one(
        &self,
        filters: &[Filter],
        operator: ConditionOperator,
    ) -> Result<Vec<T>, RepositoryError> {
        self.check()?;
        self.select(|document| matches_all(filters, operator, document))
    }

    async fn get_all_by_property(
        &self,
        query: &str,
        index: &Index,
        filters: &[Filter],
        operator: ConditionOperator,
    ) -> Result<Vec<T>, RepositoryError> {
        self.check()?;
        let found = self.select(|document| {
            property_equals(document, &index.property, query)
                && (filters.is_empty() || matches_all(filters, operator, document))
        })?;
        if found.is_empty() {
            return Err(RepositoryError::not_found(format!(
                "No items found with {}:{query}",
                index.property
            )));
        }
        Ok(found)
    }
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            failure: Arc::clone(&self.failure),
            _item: PhantomData,
        }
    }
}

impl<T> Default for InMemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Identifiable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InMemoryRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("documents", &self.documents.read().map(|d| d.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}
