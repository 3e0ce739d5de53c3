use std::{
    convert::Infallible,
    process::{Command, Stdio},
};

use crossbeam_channel::TrySendError;
use parking_lot::Mutex;

use crate::{
    actor::{Act, Actor, ActorHandle},
    error::Error,
};

/// Host mechanism that carries out a view's completion action.
pub trait ActionExecutor: Send + Sync {
    /// Must not block the polling caller.
    fn execute(&self, action: &str);
}

/// Executor that drops every action.
pub struct NoActions;

impl ActionExecutor for NoActions {
    fn execute(&self, action: &str) {
        log::debug!("no executor for action {:?}", action);
    }
}

pub enum ActionMsg {
    Run(String),
    Shutdown,
}

/// Runs completion actions through the platform shell, one at a time, on a
/// background thread.
pub struct ShellActionRunner {
    actor: Mutex<Option<ActorHandle<ActionMsg>>>,
}

impl ShellActionRunner {
    const QUEUE_CAPACITY: usize = 32;

    pub fn spawn() -> Result<Self, Error> {
        let actor = ShellWorker.spawn(Self::QUEUE_CAPACITY)?;
        Ok(Self {
            actor: Mutex::new(Some(actor)),
        })
    }

    /// Run the already queued actions and stop the worker.
    pub fn shutdown(&self) {
        // Release the lock before joining, `execute` must not wait for queued
        // actions.
        let actor = self.actor.lock().take();
        if let Some(actor) = actor {
            let _ = actor.send(ActionMsg::Shutdown);
            actor.join();
        }
    }
}

impl ActionExecutor for ShellActionRunner {
    fn execute(&self, action: &str) {
        let actor = self.actor.lock();
        let Some(actor) = actor.as_ref() else {
            log::warn!("action runner is shut down, dropping {:?}", action);
            return;
        };
        match actor.try_send(ActionMsg::Run(action.to_owned())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("action queue is full, dropping {:?}", action);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::error!("action runner has stopped, dropping {:?}", action);
            }
        }
    }
}

impl Drop for ShellActionRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ShellWorker;

impl Actor for ShellWorker {
    type Message = ActionMsg;
    type Error = Infallible;

    const NAME: &'static str = "action_runner";

    fn handle(&mut self, msg: ActionMsg) -> Result<Act, Infallible> {
        match msg {
            ActionMsg::Run(action) => {
                run_in_shell(&action);
                Ok(Act::Continue)
            }
            ActionMsg::Shutdown => Ok(Act::Shutdown),
        }
    }
}

fn run_in_shell(action: &str) {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.arg("/C");
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c");
        command
    };
    let status = command.arg(action).stdin(Stdio::null()).status();
    match status {
        Ok(status) if status.success() => {
            log::info!("action {:?} finished", action);
        }
        Ok(status) => {
            log::warn!("action {:?} exited with {}", action, status);
        }
        Err(err) => {
            log::error!("failed to run action {:?}: {}", action, err);
        }
    }
}
