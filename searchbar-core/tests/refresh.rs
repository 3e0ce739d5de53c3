use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, Sender};
use searchbar_core::{
    action::NoActions, provider::TitleProvider, DisplayResult, Error, RefreshSlot, SlotConfig,
    SlotKey, SlotPhase, SlotRegistry, SourceKind, TitleList, ViewHandle,
};

/// Counts fetches and records whether two ever overlapped.
#[derive(Default)]
struct Instrumented {
    active: AtomicBool,
    overlapped: AtomicBool,
    fetches: AtomicUsize,
}

impl TitleProvider for Instrumented {
    fn fetch(&self, config: &SlotConfig) -> Result<TitleList, Error> {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        self.active.store(false, Ordering::SeqCst);
        Ok(TitleList::from(vec![format!("limit {}", config.item_limit)]))
    }
}

/// Blocks every fetch until the test sends its result.
struct Gate {
    entered: Sender<()>,
    release: Receiver<TitleList>,
}

impl TitleProvider for Gate {
    fn fetch(&self, _: &SlotConfig) -> Result<TitleList, Error> {
        self.entered.send(()).unwrap();
        Ok(self.release.recv().unwrap())
    }
}

fn history() -> SlotConfig {
    SlotConfig::new(SourceKind::LocalHistory)
}

#[test]
fn fetches_never_overlap() {
    let provider = Arc::new(Instrumented::default());
    let slot = Arc::new(RefreshSlot::new(provider.clone()));
    slot.configure(history());

    let barrier = Arc::new(Barrier::new(6));
    let triggers: Vec<_> = (0..6)
        .map(|_| {
            let slot = Arc::clone(&slot);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..4 {
                    slot.trigger_refresh();
                    let _ = slot.snapshot();
                }
            })
        })
        .collect();
    for trigger in triggers {
        trigger.join().unwrap();
    }
    slot.wait_idle();

    assert!(!provider.overlapped.load(Ordering::SeqCst));
    assert_eq!(provider.fetches.load(Ordering::SeqCst), 24);
    assert_eq!(slot.snapshot().phase(), SlotPhase::Ready);
}

#[test]
fn results_follow_most_recent_config() {
    let slot = RefreshSlot::new(Arc::new(Instrumented::default()));
    for limit in 1..=3 {
        slot.configure(history().with_item_limit(limit));
        slot.trigger_refresh();
    }
    slot.wait_idle();

    let snapshot = slot.snapshot();
    assert!(!snapshot.loading);
    assert!(snapshot.data_ready);
    assert_eq!(*snapshot.titles, TitleList::from(vec!["limit 3".to_owned()]));
}

#[test]
fn readers_share_one_fetch() {
    let provider = Arc::new(Instrumented::default());
    let registry = SlotRegistry::new(provider.clone());
    let key = SlotKey::new("Trends", "skin");

    let first = registry.resolve(&key);
    let second = registry.resolve(&key);
    first.configure(SlotConfig::new(SourceKind::TrendingSearches));
    first.trigger_refresh();
    first.wait_idle();

    assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(first.snapshot().titles, second.snapshot().titles);
    assert!(!second.snapshot().titles.is_empty());
}

#[test]
fn poll_shows_loading_then_keeps_cached_titles() {
    let (entered_send, entered) = bounded(1);
    let (release, release_recv) = bounded(1);
    let registry = Arc::new(SlotRegistry::new(Arc::new(Gate {
        entered: entered_send,
        release: release_recv,
    })));
    let key = SlotKey::new("History", "skin");

    let owner =
        ViewHandle::attach_as_owner(&registry, Arc::new(NoActions), key.clone(), history())
            .unwrap();
    let reader = ViewHandle::attach_as_reader(&registry, key).unwrap();
    entered.recv().unwrap();
    assert_eq!(owner.poll(), DisplayResult::Loading);
    assert_eq!(reader.poll(), DisplayResult::Loading);

    release
        .send(TitleList::from(vec!["A".to_owned(), "B".to_owned()]))
        .unwrap();
    registry
        .lookup(owner.key())
        .unwrap()
        .wait_idle();
    assert_eq!(owner.poll(), DisplayResult::Titles("A | B".into()));
    assert_eq!(reader.poll(), DisplayResult::Titles("A".into()));

    owner.reconfigure(history().with_item_limit(1)).unwrap();
    entered.recv().unwrap();
    assert!(owner.snapshot().unwrap().loading);
    assert_eq!(owner.poll(), DisplayResult::Titles("A | B".into()));

    release.send(TitleList::new()).unwrap();
    reader.detach();
    owner.detach();
    assert!(registry.is_empty());
}

#[test]
fn owner_detach_waits_for_in_flight_fetch() {
    let (entered_send, entered) = bounded(1);
    let (release, release_recv) = bounded(1);
    let registry = Arc::new(SlotRegistry::new(Arc::new(Gate {
        entered: entered_send,
        release: release_recv,
    })));
    let key = SlotKey::new("History", "skin");
    let owner =
        ViewHandle::attach_as_owner(&registry, Arc::new(NoActions), key.clone(), history())
            .unwrap();
    let slot = registry.lookup(&key).unwrap();
    entered.recv().unwrap();

    let detaching = thread::spawn(move || owner.detach());
    thread::sleep(Duration::from_millis(20));
    assert!(!detaching.is_finished());
    assert!(slot.snapshot().loading);

    release.send(TitleList::new()).unwrap();
    detaching.join().unwrap();
    assert_eq!(slot.snapshot().phase(), SlotPhase::Ready);
    assert!(!registry.contains(&key));
}
