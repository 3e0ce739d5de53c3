use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{unbounded, RecvTimeoutError};
use serde::Deserialize;

use searchbar_core::{
    action::{ActionExecutor, ShellActionRunner},
    provider::SourceProvider,
    util::{join_worker, proxy_from_env},
    Error, SlotConfig, SlotRegistry, ViewHandle, ViewOptions,
};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HostConfig {
    pub poll_interval_ms: u64,
    pub views: Vec<ViewOptions>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            views: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Views without an explicit scope share the scope of the config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        log::info!("loading config: {:?}", path);
        let file = File::open(path)?;
        let mut config: HostConfig = serde_json::from_reader(file)?;
        let scope = path.display().to_string();
        for view in config.views.iter_mut().filter(|view| view.scope.is_empty()) {
            view.scope = scope.clone();
        }
        if config.poll_interval_ms == 0 {
            config.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

enum HostCommand {
    Reload,
    Quit,
}

struct View {
    options: ViewOptions,
    handle: Arc<ViewHandle>,
}

impl View {
    fn name(&self) -> &str {
        &self.options.name
    }
}

pub fn run(config_path: &Path) -> Result<(), Error> {
    let config = HostConfig::load(config_path)?;

    let provider = SourceProvider::new(proxy_from_env().as_deref());
    let registry = Arc::new(SlotRegistry::new(Arc::new(provider)));
    let runner = Arc::new(ShellActionRunner::spawn()?);
    let actions: Arc<dyn ActionExecutor> = runner.clone();

    let mut views = attach_views(&registry, &actions, &config.views);

    let (command_send, command_recv) = unbounded();
    let _input_thread = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line.as_deref().map(str::trim) {
                Ok("r") => {
                    let _ = command_send.send(HostCommand::Reload);
                }
                Ok("q") | Err(_) => break,
                _ => log::warn!("unknown command, use \"r\" to reload or \"q\" to quit"),
            }
        }
        let _ = command_send.send(HostCommand::Quit);
    });

    let mut reconfigure_worker: Option<JoinHandle<()>> = None;
    loop {
        for view in &views {
            println!("{}: {}", view.name(), view.handle.poll());
        }
        match command_recv.recv_timeout(config.poll_interval()) {
            Ok(HostCommand::Reload) => {
                if reconfigure_worker.as_ref().is_some_and(|worker| !worker.is_finished()) {
                    log::warn!("previous reload is still running, ignoring");
                    continue;
                }
                if let Some(worker) = reconfigure_worker.take() {
                    join_worker(worker, "reconfigure");
                }
                match HostConfig::load(config_path) {
                    Ok(reloaded) => {
                        // Planned first, reattached owners already fetch the new config.
                        let plan = reconfigure_plan(&views, &reloaded.views);
                        reattach_unbound(&registry, &actions, &mut views, &reloaded.views);
                        reconfigure_worker = spawn_reconfigure(plan);
                    }
                    Err(err) => log::error!("failed to reload config: {}", err),
                }
            }
            Ok(HostCommand::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    if let Some(worker) = reconfigure_worker.take() {
        join_worker(worker, "reconfigure");
    }
    // Readers go first, owners wait for their in-flight fetch.
    let (owners, readers): (Vec<_>, Vec<_>) =
        views.into_iter().partition(|view| view.handle.is_owner());
    for view in readers.into_iter().chain(owners) {
        if let Ok(handle) = Arc::try_unwrap(view.handle) {
            handle.detach();
        }
    }
    runner.shutdown();
    Ok(())
}

/// Owners are attached before readers, so readers can find them regardless of
/// their order in the config.
fn attach_views(
    registry: &Arc<SlotRegistry>,
    actions: &Arc<dyn ActionExecutor>,
    options: &[ViewOptions],
) -> Vec<View> {
    let mut attached: Vec<Option<ViewHandle>> = options.iter().map(|_| None).collect();
    for (index, view) in owners_first(options.iter().enumerate()) {
        attached[index] = Some(ViewHandle::from_options(registry, actions, view));
    }
    options
        .iter()
        .zip(attached)
        .filter_map(|(view, handle)| {
            handle.map(|handle| View {
                options: view.clone(),
                handle: Arc::new(handle),
            })
        })
        .collect()
}

fn owners_first<'a, T>(
    views: impl Iterator<Item = (T, &'a ViewOptions)>,
) -> Vec<(T, &'a ViewOptions)> {
    let (readers, mut owners): (Vec<_>, Vec<_>) =
        views.partition(|(_, view)| view.reader_of().is_some());
    owners.extend(readers);
    owners
}

/// Retry views whose configuration failed, with their entry from the reloaded
/// config.  Attaching never waits for a fetch, so this runs on the poll loop.
fn reattach_unbound(
    registry: &Arc<SlotRegistry>,
    actions: &Arc<dyn ActionExecutor>,
    views: &mut [View],
    reloaded: &[ViewOptions],
) {
    let unbound = views
        .iter()
        .enumerate()
        .filter(|(_, view)| !view.handle.is_bound())
        .filter_map(|(index, view)| {
            let options = reloaded.iter().find(|options| options.name == view.name())?;
            Some((index, options))
        });
    let retries = owners_first(unbound);
    for (index, options) in retries {
        let handle = ViewHandle::from_options(registry, actions, options);
        if handle.is_bound() {
            log::info!("{}: attached after reload", options.name);
        }
        views[index] = View {
            options: options.clone(),
            handle: Arc::new(handle),
        };
    }
}

/// Pair every bound owner with its config from the reloaded file.
fn reconfigure_plan(
    views: &[View],
    reloaded: &[ViewOptions],
) -> Vec<(Arc<ViewHandle>, SlotConfig)> {
    views
        .iter()
        .filter(|view| view.handle.is_owner() && view.handle.is_bound())
        .filter_map(|view| {
            let Some(options) = reloaded.iter().find(|options| options.name == view.name())
            else {
                log::warn!("{}: no longer configured, keeping previous config", view.name());
                return None;
            };
            match options.slot_config() {
                Ok(config) => Some((Arc::clone(&view.handle), config)),
                Err(err) => {
                    log::error!("{}: {}", view.name(), err);
                    None
                }
            }
        })
        .collect()
}

/// Reconfiguring waits for each owner's in-flight fetch, so it runs on its own
/// thread and the poll loop keeps printing cached titles meanwhile.
fn spawn_reconfigure(plan: Vec<(Arc<ViewHandle>, SlotConfig)>) -> Option<JoinHandle<()>> {
    if plan.is_empty() {
        return None;
    }
    let spawned = thread::Builder::new()
        .name("reconfigure".into())
        .spawn(move || {
            for (handle, config) in plan {
                if let Err(err) = handle.reconfigure(config) {
                    log::error!("{}: {}", handle.key(), err);
                }
            }
        });
    match spawned {
        Ok(worker) => Some(worker),
        Err(err) => {
            log::error!("failed to spawn reconfigure worker: {}", err);
            None
        }
    }
}
