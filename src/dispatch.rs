//! Request queue and dispatch loop.
//!
//! Requests are produced by any number of threads (the stdin reader in
//! the daemon, test harnesses) and consumed by one dispatcher, which
//! processes them strictly one at a time:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ producer A  │────▶│              │     │              │
//! │ producer B  │────▶│ bounded queue│────▶│  Dispatcher  │
//! │ ...         │────▶│              │     │  (one thread)│
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Each request runs arbitration, persistence, and the LED writes to
//! completion before the next one is taken, so the arbitration tables
//! need no locking.  A write that hangs blocks the whole loop; there is
//! no timeout at this layer.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender};

use log::{debug, info, warn};

use crate::app::commands::GroupCommand;
use crate::app::overrides::OverrideHandler;
use crate::app::ports::{EventSink, GroupStorePort, PhysicalLedPort};
use crate::app::service::{LedService, StartupReport};
use crate::error::Result;

/// Reply channel for one request.
pub type Reply = Sender<Result<bool>>;

#[derive(Debug)]
pub enum Request {
    /// Run a group command; the outcome goes to `reply` if present.
    Group { command: GroupCommand, reply: Option<Reply> },
    /// Stop the loop after everything queued before it.
    Shutdown,
}

impl Request {
    /// A request plus the receiver its reply will arrive on.
    pub fn with_reply(command: GroupCommand) -> (Self, Receiver<Result<bool>>) {
        let (tx, rx) = mpsc::channel();
        (Self::Group { command, reply: Some(tx) }, rx)
    }
}

/// Bounded request queue.  Producers block when `depth` requests are pending.
pub fn queue(depth: usize) -> (SyncSender<Request>, Receiver<Request>) {
    mpsc::sync_channel(depth)
}

/// Owns the service and every adapter it talks to.
pub struct Dispatcher<H, S, L, E> {
    service: LedService<H>,
    store: S,
    leds: L,
    sink: E,
}

impl<H, S, L, E> Dispatcher<H, S, L, E>
where
    H: OverrideHandler,
    S: GroupStorePort,
    L: PhysicalLedPort,
    E: EventSink,
{
    pub fn new(service: LedService<H>, store: S, leds: L, sink: E) -> Self {
        Self {
            service,
            store,
            leds,
            sink,
        }
    }

    /// Replay persisted intent.  Call once before [`run`](Self::run).
    pub fn start(&mut self) -> StartupReport {
        self.service.start(&self.store, &mut self.leds, &mut self.sink)
    }

    /// Execute one command to completion.
    pub fn handle(&mut self, command: &GroupCommand) -> Result<bool> {
        match command {
            GroupCommand::SetAsserted { group, value } => self.service.set_asserted(
                group,
                *value,
                &mut self.store,
                &mut self.leds,
                &mut self.sink,
            ),
            GroupCommand::GetAsserted { group } => self.service.asserted(group),
        }
    }

    /// Serve requests until `Shutdown` or until every producer is gone.
    /// Returns the number of group requests processed.
    pub fn run(&mut self, requests: &Receiver<Request>) -> usize {
        let mut processed = 0;
        info!("Dispatcher: waiting for requests");
        while let Ok(request) = requests.recv() {
            match request {
                Request::Group { command, reply } => {
                    let outcome = self.handle(&command);
                    if let Err(e) = &outcome {
                        warn!("{:?} failed: {}", command, e);
                    }
                    if let Some(reply) = reply {
                        if reply.send(outcome).is_err() {
                            debug!("requester went away before the reply");
                        }
                    }
                    processed += 1;
                }
                Request::Shutdown => {
                    info!("Dispatcher: shutdown requested");
                    break;
                }
            }
        }
        processed
    }

    pub fn service(&self) -> &LedService<H> {
        &self.service
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }
}
