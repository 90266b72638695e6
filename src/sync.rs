// src/sync.rs
//! Same-origin storage shared by several open tabs.
//!
//! Every tab attaches to one [`SharedStore`] and gets a [`TabStorage`] handle.
//! A write through one handle queues a [`StorageEvent`] for every *other*
//! attached handle, which is how tabs learn about each other's changes. The
//! writing tab never sees its own event. Delivery happens when a tab drains its
//! mailbox, so a tab that is not pumping simply accumulates events.

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::store::{KeyValueStore, StoreError};

type TabId = u64;

/// Storage-change notification delivered to the other tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// `None` when the whole store was cleared.
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

struct Inner {
    backend: Box<dyn KeyValueStore>,
    next_tab: TabId,
    mailboxes: BTreeMap<TabId, VecDeque<StorageEvent>>,
}

impl Inner {
    fn notify_others(&mut self, from: TabId, event: &StorageEvent) {
        for (tab, mailbox) in &mut self.mailboxes {
            if *tab != from {
                mailbox.push_back(event.clone());
            }
        }
        trace!(key = ?event.key, from, "queued storage event");
    }
}

#[derive(Clone)]
pub struct SharedStore {
    inner: Rc<RefCell<Inner>>,
    /// Tabs dropped while `inner` was borrowed. Their mailboxes are removed on
    /// the next mutable access.
    detached: Rc<RefCell<Vec<TabId>>>,
}

impl SharedStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                backend: Box::new(backend),
                next_tab: 1,
                mailboxes: BTreeMap::new(),
            })),
            detached: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn lock(&self) -> RefMut<'_, Inner> {
        let mut inner = self.inner.borrow_mut();
        for tab in self.detached.borrow_mut().drain(..) {
            inner.mailboxes.remove(&tab);
            debug!(tab, "deferred detach completed");
        }
        inner
    }

    /// Registers a new tab and returns its storage handle.
    #[must_use]
    pub fn attach(&self) -> TabStorage {
        let mut inner = self.lock();
        let id = inner.next_tab;
        inner.next_tab += 1;
        inner.mailboxes.insert(id, VecDeque::new());
        debug!(tab = id, "tab attached to shared store");
        TabStorage {
            store: self.clone(),
            id,
        }
    }

    #[must_use]
    pub fn attached_tabs(&self) -> usize {
        self.inner.borrow().mailboxes.len()
    }

    /// Reads a key without going through a tab.
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.borrow().backend.get(key)
    }

    /// Writes a key from outside any tab (another program sharing the store).
    /// Every attached tab is notified.
    /// # Errors
    /// Returns `StoreError` if the backend rejects the write.
    pub fn set_external(&self, key: &str, value: &str) -> Result<(), StoreError> {
        write(self, 0, key, Some(value))
    }

    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.borrow().backend.keys()
    }
}

fn write(store: &SharedStore, from: TabId, key: &str, value: Option<&str>) -> Result<(), StoreError> {
    let mut inner = store.lock();
    let old_value = inner.backend.get(key)?;
    match value {
        Some(v) => inner.backend.set(key, v)?,
        None => inner.backend.remove(key)?,
    }
    // Writing an identical value is not a change and notifies nobody.
    if old_value.as_deref() != value {
        let event = StorageEvent {
            key: Some(key.to_string()),
            old_value,
            new_value: value.map(str::to_string),
        };
        inner.notify_others(from, &event);
    }
    Ok(())
}

/// One tab's view of the shared store. Dropping it detaches the tab.
pub struct TabStorage {
    store: SharedStore,
    id: TabId,
}

impl TabStorage {
    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.inner.borrow().backend.get(key)
    }

    /// # Errors
    /// Returns `StoreError` if the backend rejects the write.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        write(&self.store, self.id, key, Some(value))
    }

    /// # Errors
    /// Returns `StoreError` if the backend rejects the removal.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        write(&self.store, self.id, key, None)
    }

    /// Wipes every key in the store.
    /// # Errors
    /// Returns `StoreError` if the backend rejects the removal.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.store.lock();
        inner.backend.clear()?;
        let event = StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
        };
        inner.notify_others(self.id, &event);
        Ok(())
    }

    /// # Errors
    /// Returns `StoreError` if the backend cannot be read.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.store.keys()
    }

    /// Drains the notifications queued for this tab, oldest first.
    #[must_use]
    pub fn take_events(&self) -> Vec<StorageEvent> {
        self.store
            .lock()
            .mailboxes
            .get_mut(&self.id)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.store
            .inner
            .borrow()
            .mailboxes
            .get(&self.id)
            .map_or(0, VecDeque::len)
    }

    #[must_use]
    pub fn shared(&self) -> &SharedStore {
        &self.store
    }
}

impl Drop for TabStorage {
    fn drop(&mut self) {
        match self.store.inner.try_borrow_mut() {
            Ok(mut inner) => {
                inner.mailboxes.remove(&self.id);
                debug!(tab = self.id, "tab detached from shared store");
            }
            Err(_) => {
                warn!(tab = self.id, "shared store busy while dropping tab, detach deferred");
                self.store.detached.borrow_mut().push(self.id);
            }
        }
    }
}
