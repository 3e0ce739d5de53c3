use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;

use crate::{
    config::SlotConfig,
    provider::{fetch_or_empty, TitleProvider},
    title::TitleList,
    util::join_worker,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotPhase {
    /// Created or reconfigured, no fetch has completed for the current config.
    Uninitialized,
    /// A fetch is in flight.
    Loading,
    /// The last fetch for the current config has completed.
    Ready,
}

/// Consistent copy of a slot's published state.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub titles: Arc<TitleList>,
    pub loading: bool,
    pub data_ready: bool,
}

impl Snapshot {
    pub fn phase(&self) -> SlotPhase {
        if self.loading {
            SlotPhase::Loading
        } else if self.data_ready {
            SlotPhase::Ready
        } else {
            SlotPhase::Uninitialized
        }
    }
}

/// Everything readers may observe, mutated only as a whole under one lock.
struct SlotState {
    config: SlotConfig,
    titles: Arc<TitleList>,
    loading: bool,
    data_ready: bool,
    action_fired: bool,
    // Bumped on every reconfiguration, so a fetch started for an older config
    // cannot mark the current one as ready.
    generation: u64,
}

impl SlotState {
    fn publish(&mut self, generation: u64, titles: TitleList) {
        self.titles = titles.into_shared();
        self.loading = false;
        if generation == self.generation {
            self.data_ready = true;
        } else {
            log::debug!("fetch of superseded generation {} landed", generation);
        }
    }
}

/// Cached result of one refreshable source, with at most one fetch in flight.
///
/// Readers call `snapshot()` at any time without waiting for a fetch.  Fetches
/// run on a dedicated worker thread per `trigger_refresh()` call; a new trigger
/// joins the previous worker before spawning the next one.
pub struct RefreshSlot {
    provider: Arc<dyn TitleProvider>,
    state: Arc<Mutex<SlotState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshSlot {
    pub fn new(provider: Arc<dyn TitleProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(SlotState {
                config: SlotConfig::default(),
                titles: Arc::default(),
                loading: false,
                data_ready: false,
                action_fired: false,
                generation: 0,
            })),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> SlotConfig {
        self.state.lock().config.clone()
    }

    /// Replace the config and start a new ready cycle.  Cached titles stay
    /// visible until the next fetch lands.  A config without a source is
    /// ignored and `false` is returned.
    pub fn configure(&self, config: SlotConfig) -> bool {
        if config.source.is_none() {
            log::debug!("ignoring slot config without a source");
            return false;
        }
        let mut state = self.state.lock();
        state.config = config;
        state.generation += 1;
        state.data_ready = false;
        state.action_fired = false;
        true
    }

    /// Start a background fetch for the current config.  Blocks while a
    /// previous fetch of this slot is still running.
    pub fn trigger_refresh(&self) {
        let mut worker = self.worker.lock();
        if let Some(previous) = worker.take() {
            log::debug!("waiting for the previous refresh to finish");
            join_worker(previous, "refresh");
        }

        let (config, generation) = {
            let mut state = self.state.lock();
            if state.config.source.is_none() {
                log::debug!("slot has no source, not refreshing");
                return;
            }
            state.loading = true;
            state.data_ready = false;
            (state.config.clone(), state.generation)
        };

        let spawned = thread::Builder::new()
            .name("refresh".into())
            .spawn({
                let provider = Arc::clone(&self.provider);
                let state = Arc::clone(&self.state);
                move || {
                    let titles = fetch_or_empty(provider.as_ref(), &config);
                    state.lock().publish(generation, titles);
                }
            });
        match spawned {
            Ok(handle) => {
                worker.replace(handle);
            }
            Err(err) => {
                log::error!("failed to spawn refresh worker: {}", err);
                self.state.lock().publish(generation, TitleList::new());
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            titles: Arc::clone(&state.titles),
            loading: state.loading,
            data_ready: state.data_ready,
        }
    }

    /// Returns `true` to exactly one caller per ready cycle.
    pub fn consume_completion_signal(&self) -> bool {
        let mut state = self.state.lock();
        if state.data_ready && !state.action_fired {
            state.action_fired = true;
            true
        } else {
            false
        }
    }

    /// Block until no fetch is in flight.
    pub fn wait_idle(&self) {
        if let Some(worker) = self.worker.lock().take() {
            join_worker(worker, "refresh");
        }
    }
}
