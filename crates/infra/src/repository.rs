//! Generic CRUD storage contract and its in-memory implementation.
//!
//! Writes through one repository are serialized by its lock. Services that
//! compose several calls (read, modify, update) are not transactional: two
//! concurrent read-modify-write sequences on the same record race, and the
//! last `update` wins.
//!
//! A writer that panicked mid-call leaves the lock poisoned; every operation
//! keeps serving the data as it stands rather than failing.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use tollgate_core::Entity;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("item already exists")]
    ItemAlreadyExists,

    #[error("item not found")]
    ItemNotFound,
}

/// CRUD storage for one entity type.
pub trait Repository<T: Entity>: Send + Sync {
    fn get_by_id(&self, id: &T::Id) -> Option<T>;

    /// Items matching `predicate`, in insertion order, after skipping `skip`
    /// matches and returning at most `limit`.
    fn query(&self, predicate: &dyn Fn(&T) -> bool, skip: usize, limit: usize) -> Vec<T>;

    fn create(&self, item: T) -> Result<T, RepositoryError>;
    fn update(&self, item: T) -> Result<T, RepositoryError>;
    fn delete(&self, id: &T::Id) -> Result<(), RepositoryError>;
}

impl<T, R> Repository<T> for Arc<R>
where
    T: Entity,
    R: Repository<T> + ?Sized,
{
    fn get_by_id(&self, id: &T::Id) -> Option<T> {
        (**self).get_by_id(id)
    }

    fn query(&self, predicate: &dyn Fn(&T) -> bool, skip: usize, limit: usize) -> Vec<T> {
        (**self).query(predicate, skip, limit)
    }

    fn create(&self, item: T) -> Result<T, RepositoryError> {
        (**self).create(item)
    }

    fn update(&self, item: T) -> Result<T, RepositoryError> {
        (**self).update(item)
    }

    fn delete(&self, id: &T::Id) -> Result<(), RepositoryError> {
        (**self).delete(id)
    }
}

/// Insertion-ordered in-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Repository<T> for InMemoryRepository<T>
where
    T: Entity + Clone + Send + Sync,
{
    fn get_by_id(&self, id: &T::Id) -> Option<T> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        items.iter().find(|item| item.id() == id).cloned()
    }

    fn query(&self, predicate: &dyn Fn(&T) -> bool, skip: usize, limit: usize) -> Vec<T> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());

        items
            .iter()
            .filter(|item| predicate(item))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    fn create(&self, item: T) -> Result<T, RepositoryError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(RepositoryError::ItemAlreadyExists);
        }
        items.push(item.clone());
        Ok(item)
    }

    fn update(&self, item: T) -> Result<T, RepositoryError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        let slot = items
            .iter_mut()
            .find(|existing| existing.id() == item.id())
            .ok_or(RepositoryError::ItemNotFound)?;
        *slot = item.clone();
        Ok(item)
    }

    fn delete(&self, id: &T::Id) -> Result<(), RepositoryError> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        let index = items
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(RepositoryError::ItemNotFound)?;
        items.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: u32,
        label: &'static str,
    }

    impl Entity for Widget {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    fn widget(id: u32, label: &'static str) -> Widget {
        Widget { id, label }
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let repo = InMemoryRepository::new();
        repo.create(widget(1, "a")).unwrap();

        assert_eq!(repo.create(widget(1, "b")), Err(RepositoryError::ItemAlreadyExists));
        assert_eq!(repo.get_by_id(&1).unwrap().label, "a");
    }

    #[test]
    fn update_and_delete_require_existing_item() {
        let repo: InMemoryRepository<Widget> = InMemoryRepository::new();

        assert_eq!(repo.update(widget(7, "x")), Err(RepositoryError::ItemNotFound));
        assert_eq!(repo.delete(&7), Err(RepositoryError::ItemNotFound));

        repo.create(widget(7, "x")).unwrap();
        repo.update(widget(7, "y")).unwrap();
        assert_eq!(repo.get_by_id(&7).unwrap().label, "y");

        repo.delete(&7).unwrap();
        assert!(repo.get_by_id(&7).is_none());
    }

    #[test]
    fn poisoned_lock_still_serves_reads_and_writes() {
        let repo = Arc::new(InMemoryRepository::<Widget>::new());
        repo.create(widget(1, "a")).unwrap();

        let poisoner = repo.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.items.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(repo.items.is_poisoned());

        assert_eq!(repo.get_by_id(&1).unwrap().label, "a");
        assert_eq!(repo.query(&|_| true, 0, 10).len(), 1);
        repo.create(widget(2, "b")).unwrap();
        assert_eq!(repo.query(&|_| true, 0, 10).len(), 2);
    }

    #[test]
    fn query_filters_then_pages_in_insertion_order() {
        let repo = InMemoryRepository::new();
        for id in 1..=10 {
            repo.create(widget(id, if id % 2 == 0 { "even" } else { "odd" }))
                .unwrap();
        }

        let page = repo.query(&|w: &Widget| w.label == "even", 1, 2);
        assert_eq!(page.iter().map(|w| w.id).collect::<Vec<_>>(), vec![4, 6]);

        let tail = repo.query(&|_| true, 8, 10);
        assert_eq!(tail.len(), 2);
    }
}
