use std::{
    fmt::Display,
    io,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{bounded, Receiver, SendError, Sender, TrySendError};

use crate::util::join_worker;

pub enum Act {
    Continue,
    Shutdown,
}

/// A worker owning its state on a dedicated thread, fed through a bounded
/// mailbox.
pub trait Actor: Sized + Send + 'static {
    type Message: Send + 'static;
    type Error: Display;

    const NAME: &'static str;

    fn handle(&mut self, msg: Self::Message) -> Result<Act, Self::Error>;

    fn process(mut self, recv: Receiver<Self::Message>) {
        for msg in recv {
            match self.handle(msg) {
                Ok(Act::Continue) => {}
                Ok(Act::Shutdown) => {
                    break;
                }
                Err(err) => {
                    log::error!("{} error: {}", Self::NAME, err);
                    break;
                }
            }
        }
        log::debug!("{} stopped", Self::NAME);
    }

    fn spawn(self, capacity: usize) -> io::Result<ActorHandle<Self::Message>> {
        let (send, recv) = bounded(capacity);
        let thread = thread::Builder::new()
            .name(Self::NAME.into())
            .spawn(move || self.process(recv))?;
        Ok(ActorHandle {
            name: Self::NAME,
            sender: send,
            thread,
        })
    }
}

pub struct ActorHandle<M> {
    name: &'static str,
    thread: JoinHandle<()>,
    sender: Sender<M>,
}

impl<M> ActorHandle<M> {
    pub fn send(&self, msg: M) -> Result<(), SendError<M>> {
        self.sender.send(msg)
    }

    pub fn try_send(&self, msg: M) -> Result<(), TrySendError<M>> {
        self.sender.try_send(msg)
    }

    pub fn join(self) {
        join_worker(self.thread, self.name);
    }
}
