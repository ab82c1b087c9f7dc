use crate::error::{Error, Result};
use crate::rt::{barrier, execution};

use std::fmt;
use std::marker::PhantomData;

/// Typed handle to an object living in a `Store`.
pub(crate) struct Ref<T> {
    /// Index in the store
    index: usize,

    /// Execution the object is part of
    execution_id: execution::Id,

    _p: PhantomData<T>,
}

/// Stores objects
#[derive(Debug)]
pub(crate) struct Store {
    /// Execution this store is part of
    execution_id: execution::Id,

    /// Stored state for all objects.
    entries: Vec<Entry>,
}

/// Entry in the object store. Enumerates the different kinds of objects that
/// can be stored.
#[derive(Debug)]
pub(crate) enum Entry {
    Barrier(barrier::State),

    /// The object was disposed. The slot is never reused, so stale handles
    /// keep failing instead of aliasing a newer object.
    Disposed,
}

/// Implemented by the states that can be kept in a `Store`.
pub(crate) trait Object: Sized {
    fn into_entry(self) -> Entry;

    fn get_ref(entry: &Entry) -> Option<&Self>;

    fn get_mut(entry: &mut Entry) -> Option<&mut Self>;
}

impl Object for barrier::State {
    fn into_entry(self) -> Entry {
        Entry::Barrier(self)
    }

    fn get_ref(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::Barrier(state) => Some(state),
            _ => None,
        }
    }

    fn get_mut(entry: &mut Entry) -> Option<&mut Self> {
        match entry {
            Entry::Barrier(state) => Some(state),
            _ => None,
        }
    }
}

impl Store {
    /// Create a new, empty, object store
    pub(crate) fn new(execution_id: execution::Id) -> Store {
        Store {
            execution_id,
            entries: vec![],
        }
    }

    pub(crate) fn insert<T: Object>(&mut self, state: T) -> Ref<T> {
        let index = self.entries.len();
        self.entries.push(state.into_entry());

        Ref {
            index,
            execution_id: self.execution_id,
            _p: PhantomData,
        }
    }

    /// Number of objects that have not been disposed.
    pub(crate) fn live(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !matches!(entry, Entry::Disposed))
            .count()
    }
}

impl<T: Object> Ref<T> {
    pub(crate) fn get<'a>(&self, store: &'a Store) -> Result<&'a T> {
        let entry = self.entry(store)?;
        T::get_ref(entry).ok_or(Error::InvalidHandle("object has been disposed"))
    }

    pub(crate) fn get_mut<'a>(&self, store: &'a mut Store) -> Result<&'a mut T> {
        self.check_execution(store)?;
        let entry = &mut store.entries[self.index];
        T::get_mut(entry).ok_or(Error::InvalidHandle("object has been disposed"))
    }

    /// Release the object's slot. Only the first call succeeds.
    pub(crate) fn dispose(&self, store: &mut Store) -> Result<()> {
        self.get(store)?;
        store.entries[self.index] = Entry::Disposed;
        Ok(())
    }

    fn entry<'a>(&self, store: &'a Store) -> Result<&'a Entry> {
        self.check_execution(store)?;
        Ok(&store.entries[self.index])
    }

    fn check_execution(&self, store: &Store) -> Result<()> {
        if self.execution_id != store.execution_id {
            return Err(Error::InvalidHandle(
                "object belongs to a different simulation run",
            ));
        }

        Ok(())
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Ref<T> {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Ref({}, {:?})", self.index, self.execution_id)
    }
}
