//! Engine event bus scoped to one viewer handle
//!
//! Each attach creates a fresh channel tagged with the session token. The
//! engine keeps the `EventBus` sender; the bridge keeps the
//! `EventSubscription`. Closing the subscription makes every later dispatch
//! a no-op, so a torn-down handle can never reach a newer session.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic load generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events emitted by the rendering engine (`pagesinit`, `scalechanging`, `pagechanging`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    PagesInit {
        current_page_number: u32,
        current_scale: f64,
        pages_count: u32,
    },
    ScaleChanging {
        scale: f64,
    },
    PageChanging {
        page_number: u32,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::PagesInit { .. } => "pagesinit",
            EngineEvent::ScaleChanging { .. } => "scalechanging",
            EngineEvent::PageChanging { .. } => "pagechanging",
        }
    }
}

/// Sending half handed to the engine instance
#[derive(Debug, Clone)]
pub struct EventBus {
    token: SessionToken,
    tx: UnboundedSender<EngineEvent>,
}

impl EventBus {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Publish an event; returns `false` once the subscription is gone
    pub fn dispatch(&self, event: EngineEvent) -> bool {
        self.tx.unbounded_send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half owned by the rendering bridge
#[derive(Debug)]
pub struct EventSubscription {
    token: SessionToken,
    rx: UnboundedReceiver<EngineEvent>,
    closed: bool,
}

impl EventSubscription {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        while let Ok(Some(event)) = self.rx.try_next() {
            events.push(event);
        }
        events
    }

    /// Unregister: later dispatches fail and queued events are discarded
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.rx.close();
        while let Ok(Some(_)) = self.rx.try_next() {}
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Create a bus/subscription pair for one viewer handle
pub fn channel(token: SessionToken) -> (EventBus, EventSubscription) {
    let (tx, rx) = mpsc::unbounded();
    (
        EventBus { token, tx },
        EventSubscription {
            token,
            rx,
            closed: false,
        },
    )
}
