use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::{error::Error, provider::TitleProvider, slot::RefreshSlot};

/// Identity of a shared slot: the owner's name within a top-level scope.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SlotKey {
    name: String,
    scope: String,
}

impl SlotKey {
    pub fn new(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in scope {:?}", self.name, self.scope)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HandleId(u64);

struct Entry {
    slot: Arc<RefreshSlot>,
    owner: Option<HandleId>,
    readers: HashSet<HandleId>,
}

impl Entry {
    fn is_referenced(&self) -> bool {
        self.owner.is_some() || !self.readers.is_empty()
    }
}

/// Shared lookup of refresh slots, so several views can read one fetch.
pub struct SlotRegistry {
    provider: Arc<dyn TitleProvider>,
    slots: Mutex<HashMap<SlotKey, Entry>>,
    next_handle: AtomicU64,
}

impl SlotRegistry {
    /// New slots fetch through `provider`.
    pub fn new(provider: Arc<dyn TitleProvider>) -> Self {
        Self {
            provider,
            slots: Mutex::default(),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn next_handle_id(&self) -> HandleId {
        HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Return the slot for `key`, creating it if absent.
    pub fn resolve(&self, key: &SlotKey) -> Arc<RefreshSlot> {
        let mut slots = self.slots.lock();
        Arc::clone(&self.entry(&mut slots, key).slot)
    }

    /// Resolve the slot for `key` and record `owner` as its single owner.
    pub fn claim(&self, key: &SlotKey, owner: HandleId) -> Result<Arc<RefreshSlot>, Error> {
        let mut slots = self.slots.lock();
        let entry = self.entry(&mut slots, key);
        match entry.owner {
            Some(current) if current != owner => Err(Error::SlotAlreadyOwned(key.clone())),
            _ => {
                entry.owner = Some(owner);
                Ok(Arc::clone(&entry.slot))
            }
        }
    }

    /// Non-creating lookup.
    pub fn lookup(&self, key: &SlotKey) -> Option<Arc<RefreshSlot>> {
        self.slots
            .lock()
            .get(key)
            .map(|entry| Arc::clone(&entry.slot))
    }

    /// Attach `reader` to an existing slot.  Never creates one.
    pub fn attach_reader(&self, key: &SlotKey, reader: HandleId) -> Result<Arc<RefreshSlot>, Error> {
        let mut slots = self.slots.lock();
        let entry = slots
            .get_mut(key)
            .ok_or_else(|| Error::NoSuchOwner(key.clone()))?;
        entry.readers.insert(reader);
        Ok(Arc::clone(&entry.slot))
    }

    /// Release `handle`'s reference to the slot at `key`.  When the owner (or
    /// the last handle of an unowned slot) detaches, the slot's in-flight fetch
    /// is awaited and the slot is removed.
    pub fn detach(&self, key: &SlotKey, handle: HandleId) {
        let slot = {
            let mut slots = self.slots.lock();
            let Some(entry) = slots.get_mut(key) else {
                return;
            };
            if entry.owner == Some(handle) {
                entry.owner = None;
                Arc::clone(&entry.slot)
            } else {
                entry.readers.remove(&handle);
                if entry.is_referenced() {
                    return;
                }
                Arc::clone(&entry.slot)
            }
        };

        slot.wait_idle();

        let mut slots = self.slots.lock();
        let released = slots
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.slot, &slot) && entry.owner.is_none());
        if released {
            slots.remove(key);
            log::debug!("released slot {}", key);
        }
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.slots.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry<'a>(&self, slots: &'a mut HashMap<SlotKey, Entry>, key: &SlotKey) -> &'a mut Entry {
        slots.entry(key.clone()).or_insert_with(|| {
            log::debug!("creating slot {}", key);
            Entry {
                slot: Arc::new(RefreshSlot::new(Arc::clone(&self.provider))),
                owner: None,
                readers: HashSet::new(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use super::*;
    use crate::{config::SlotConfig, title::TitleList};

    fn registry() -> SlotRegistry {
        SlotRegistry::new(Arc::new(|_: &SlotConfig| -> Result<TitleList, Error> {
            Ok(TitleList::new())
        }))
    }

    #[test]
    fn concurrent_resolve_creates_one_slot() {
        let registry = Arc::new(registry());
        let key = SlotKey::new("History", "skin");
        let barrier = Arc::new(Barrier::new(8));

        let slots: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let key = key.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.resolve(&key)
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| t.join().unwrap())
            .collect();

        assert_eq!(registry.len(), 1);
        assert!(slots.iter().all(|slot| Arc::ptr_eq(slot, &slots[0])));
    }

    #[test]
    fn scope_disambiguates_names() {
        let registry = registry();
        let a = registry.resolve(&SlotKey::new("History", "left"));
        let b = registry.resolve(&SlotKey::new("History", "right"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn slot_has_single_owner() {
        let registry = registry();
        let key = SlotKey::new("History", "skin");
        let first = registry.next_handle_id();
        let second = registry.next_handle_id();

        registry.claim(&key, first).unwrap();
        assert!(registry.claim(&key, first).is_ok());
        assert!(matches!(
            registry.claim(&key, second),
            Err(Error::SlotAlreadyOwned(k)) if k == key
        ));
    }

    #[test]
    fn lookup_and_attach_never_create() {
        let registry = registry();
        let key = SlotKey::new("Missing", "skin");
        let reader = registry.next_handle_id();

        assert!(registry.lookup(&key).is_none());
        assert!(matches!(
            registry.attach_reader(&key, reader),
            Err(Error::NoSuchOwner(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn reader_detach_keeps_owned_slot() {
        let registry = registry();
        let key = SlotKey::new("History", "skin");
        let owner = registry.next_handle_id();
        let reader = registry.next_handle_id();

        let owned = registry.claim(&key, owner).unwrap();
        let read = registry.attach_reader(&key, reader).unwrap();
        assert!(Arc::ptr_eq(&owned, &read));

        registry.detach(&key, reader);
        assert!(registry.contains(&key));

        registry.detach(&key, owner);
        assert!(!registry.contains(&key));
    }

    #[test]
    fn owner_detach_removes_slot_with_readers_attached() {
        let registry = registry();
        let key = SlotKey::new("History", "skin");
        let owner = registry.next_handle_id();
        let reader = registry.next_handle_id();

        registry.claim(&key, owner).unwrap();
        let read = registry.attach_reader(&key, reader).unwrap();
        registry.detach(&key, owner);

        assert!(!registry.contains(&key));
        // The reader keeps its reference until it detaches itself.
        assert!(read.snapshot().titles.is_empty());
        registry.detach(&key, reader);
    }
}
