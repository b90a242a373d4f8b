// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed handles returned by declaration.
//!
//! A handle is just an [`EntryId`] that remembers its element type, so modules can
//! keep it from `initialize` and use it on every event without naming strings.

use crate::datastore::{DataStore, EntryId, StoreObject};
use crate::errors::StoreError;
use std::fmt;
use std::marker::PhantomData;

/// Handle to a single-object entry.
pub struct StoreObjPtr<T> {
    id: EntryId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StoreObjPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreObjPtr<T> {}

impl<T> fmt::Debug for StoreObjPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreObjPtr({})", self.id.index())
    }
}

impl<T: StoreObject> StoreObjPtr<T> {
    pub(crate) fn new(id: EntryId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn create(&self, store: &mut DataStore, value: T) -> Result<(), StoreError> {
        store.create(self.id)?;
        store.put(self.id, value)
    }

    /// Creates the entry when absent, otherwise overwrites it.
    pub fn assign(&self, store: &mut DataStore, value: T) -> Result<(), StoreError> {
        if !store.is_created(self.id) {
            store.create(self.id)?;
        }
        store.put(self.id, value)
    }

    pub fn get<'s>(&self, store: &'s DataStore) -> Result<Option<&'s T>, StoreError> {
        store.get(self.id)
    }

    pub fn get_mut<'s>(&self, store: &'s mut DataStore) -> Result<Option<&'s mut T>, StoreError> {
        store.get_mut(self.id)
    }

    pub fn is_valid(&self, store: &DataStore) -> bool {
        store.is_created(self.id)
    }
}

/// Handle to an array entry.
pub struct StoreArray<T> {
    id: EntryId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StoreArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StoreArray<T> {}

impl<T> fmt::Debug for StoreArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreArray({})", self.id.index())
    }
}

impl<T: StoreObject> StoreArray<T> {
    pub(crate) fn new(id: EntryId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn create(&self, store: &mut DataStore) -> Result<(), StoreError> {
        store.create(self.id)
    }

    /// Appends, creating the array first if this is the first element of the event.
    pub fn append(&self, store: &mut DataStore, value: T) -> Result<usize, StoreError> {
        if !store.is_created(self.id) {
            store.create(self.id)?;
        }
        store.append(self.id, value)
    }

    pub fn get<'s>(&self, store: &'s DataStore) -> Result<Option<&'s [T]>, StoreError> {
        store.array(self.id)
    }

    pub fn element_mut<'s>(
        &self,
        store: &'s mut DataStore,
        index: usize,
    ) -> Result<Option<&'s mut T>, StoreError> {
        store.element_mut(self.id, index)
    }

    pub fn len(&self, store: &DataStore) -> usize {
        store.array_len(self.id).unwrap_or(0)
    }

    pub fn is_empty(&self, store: &DataStore) -> bool {
        self.len(store) == 0
    }

    pub fn is_valid(&self, store: &DataStore) -> bool {
        store.is_created(self.id)
    }
}
