//! Session event bus: how presentation learns that state changed.
//!
//! Single-threaded (WASM constraint), interior mutability via RefCell.
//! With no listener registered, events are buffered for `drain`. Once a
//! listener is registered with `subscribe`, events are pushed to it instead
//! and nothing accumulates.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use assistant_types::event::SessionEvent;

pub type Listener = Rc<dyn Fn(&SessionEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Shared event bus: clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    pending: RefCell<VecDeque<SessionEvent>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: SessionEvent) {
        // Snapshot so a listener may subscribe or unsubscribe re-entrantly
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        if listeners.is_empty() {
            self.inner.pending.borrow_mut().push_back(event);
            return;
        }
        for listener in listeners {
            listener(&event);
        }
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.inner.pending.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }

    /// Events still buffered from before the first subscription stay
    /// available to `drain`.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }
}
