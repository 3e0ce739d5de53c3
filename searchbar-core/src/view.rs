use std::{fmt, sync::Arc};

use crate::{
    action::ActionExecutor,
    config::{SlotConfig, ViewOptions},
    error::Error,
    registry::{HandleId, SlotKey, SlotRegistry},
    slot::{RefreshSlot, Snapshot},
};

pub const LOADING_TEXT: &str = "Loading...";
pub const NO_DATA_TEXT: &str = "No data found.";
pub const INITIALIZING_TEXT: &str = "Initializing...";

/// What a view shows on one poll.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisplayResult {
    /// The selected title, or all titles joined when the selector is 0.
    Titles(String),
    Loading,
    NoData,
    Initializing,
}

impl DisplayResult {
    /// Cached titles win over the loading placeholder, so a view keeps
    /// showing the last good data while a new fetch runs.
    pub fn render(snapshot: &Snapshot, selector_index: usize) -> Self {
        if !snapshot.titles.is_empty() {
            let text = match selector_index {
                0 => snapshot.titles.join(),
                n => snapshot.titles.nth(n).unwrap_or_default().to_owned(),
            };
            Self::Titles(text)
        } else if snapshot.loading {
            Self::Loading
        } else if snapshot.data_ready {
            Self::NoData
        } else {
            Self::Initializing
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Titles(text) => text,
            Self::Loading => LOADING_TEXT,
            Self::NoData => NO_DATA_TEXT,
            Self::Initializing => INITIALIZING_TEXT,
        }
    }
}

impl fmt::Display for DisplayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Role {
    Owner {
        actions: Arc<dyn ActionExecutor>,
        completion_action: String,
    },
    Reader,
}

/// One consumer of a refresh slot.  The owner drives refreshes and fires the
/// completion action; readers only observe the owner's slot.  An unbound view
/// (failed configuration) shows "Initializing..." forever.
pub struct ViewHandle {
    id: HandleId,
    key: SlotKey,
    role: Role,
    selector_index: usize,
    slot: Option<Arc<RefreshSlot>>,
    registry: Arc<SlotRegistry>,
}

impl ViewHandle {
    /// Claim the slot at `key`, configure it and start the first refresh.
    pub fn attach_as_owner(
        registry: &Arc<SlotRegistry>,
        actions: Arc<dyn ActionExecutor>,
        key: SlotKey,
        config: SlotConfig,
    ) -> Result<Self, Error> {
        let id = registry.next_handle_id();
        let slot = registry.claim(&key, id)?;
        slot.configure(config);
        slot.trigger_refresh();
        log::info!("attached owner {}", key);
        Ok(Self {
            id,
            key,
            role: Role::Owner {
                actions,
                completion_action: String::new(),
            },
            selector_index: 0,
            slot: Some(slot),
            registry: Arc::clone(registry),
        })
    }

    /// Read the slot of an existing owner.  Fails with `NoSuchOwner` when the
    /// owner is not attached.
    pub fn attach_as_reader(registry: &Arc<SlotRegistry>, owner: SlotKey) -> Result<Self, Error> {
        let id = registry.next_handle_id();
        let slot = registry.attach_reader(&owner, id)?;
        log::info!("attached reader of {}", owner);
        Ok(Self {
            id,
            key: owner,
            role: Role::Reader,
            selector_index: 1,
            slot: Some(slot),
            registry: Arc::clone(registry),
        })
    }

    /// Attach according to host options.  Configuration errors are logged and
    /// produce an unbound view.
    pub fn from_options(
        registry: &Arc<SlotRegistry>,
        actions: &Arc<dyn ActionExecutor>,
        options: &ViewOptions,
    ) -> Self {
        let (key, attached) = match options.reader_of() {
            Some(owner) => {
                let key = SlotKey::new(owner, &options.scope);
                let attached = Self::attach_as_reader(registry, key.clone());
                (key, attached)
            }
            None => {
                let key = SlotKey::new(&options.name, &options.scope);
                let attached = options.slot_config().and_then(|config| {
                    Self::attach_as_owner(registry, Arc::clone(actions), key.clone(), config)
                });
                (key, attached)
            }
        };
        match attached {
            Ok(view) => view
                .with_selector_index(options.selector_index())
                .with_completion_action(&options.completion_action_text),
            Err(err) => {
                log::error!("{}: {}", options.name, err);
                Self {
                    id: registry.next_handle_id(),
                    key,
                    role: Role::Reader,
                    selector_index: options.selector_index(),
                    slot: None,
                    registry: Arc::clone(registry),
                }
            }
        }
    }

    pub fn with_selector_index(mut self, selector_index: usize) -> Self {
        self.selector_index = selector_index;
        self
    }

    /// Action text handed to the executor once per completed refresh cycle.
    /// Ignored on readers.
    pub fn with_completion_action(mut self, action: &str) -> Self {
        if let Role::Owner {
            completion_action, ..
        } = &mut self.role
        {
            *completion_action = action.trim().to_owned();
        } else if !action.trim().is_empty() {
            log::warn!("ignoring completion action of reader view of {}", self.key);
        }
        self
    }

    pub fn key(&self) -> &SlotKey {
        &self.key
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.role, Role::Owner { .. })
    }

    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    pub fn selector_index(&self) -> usize {
        self.selector_index
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.slot.as_ref().map(|slot| slot.snapshot())
    }

    /// Never blocks.  On the owner, the completion action is fired the first
    /// time a refresh cycle's result is seen.
    pub fn poll(&self) -> DisplayResult {
        let Some(slot) = &self.slot else {
            return DisplayResult::Initializing;
        };
        if let Role::Owner {
            actions,
            completion_action,
        } = &self.role
        {
            if slot.consume_completion_signal() && !completion_action.is_empty() {
                log::debug!("firing completion action of {}", self.key);
                actions.execute(completion_action);
            }
        }
        DisplayResult::render(&slot.snapshot(), self.selector_index)
    }

    /// Replace the owner's config and refresh.
    pub fn reconfigure(&self, config: SlotConfig) -> Result<(), Error> {
        match (&self.role, &self.slot) {
            (Role::Owner { .. }, Some(slot)) => {
                slot.configure(config);
                slot.trigger_refresh();
                Ok(())
            }
            _ => Err(Error::NotOwner),
        }
    }

    /// Refresh the bound slot with its current config.  Readers forward the
    /// request to the owner's slot.
    pub fn refresh(&self) {
        if let Some(slot) = &self.slot {
            slot.trigger_refresh();
        }
    }

    /// Release the slot.  Detaching the owner waits for its in-flight fetch.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.slot.take().is_some() {
            self.registry.detach(&self.key, self.id);
        }
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.release();
    }
}
