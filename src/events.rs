//! Typed notification bus decoupling the canvas from surrounding panels.
//!
//! The canvas only ever pushes events here; the hosting console either
//! drains the queue after each gesture or registers subscriber callbacks.
//! No global event mechanism is involved.

use crate::model::NodeId;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilAction {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LooseAction {
    Set,
    Clear,
}

/// Fire-and-forget events consumed by the excluded surrounding UI: the
/// order/summary panel, the stencil palette, the validation banner, and the
/// property side panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasEvent {
    UpdateServiceOrderItems { node: NodeId, action: OrderAction },
    UpdateStencil { type_name: String, action: StencilAction },
    LooseElement { node: NodeId, action: LooseAction },
    SendCellToSidebar { node: Option<NodeId> },
}

type Subscriber = Box<dyn FnMut(&CanvasEvent)>;

#[derive(Default)]
pub struct NotificationBus {
    queue: VecDeque<CanvasEvent>,
    subscribers: Vec<Subscriber>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: CanvasEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.queue.push_back(event);
    }

    /// Remove and return everything emitted since the last drain.
    pub fn drain(&mut self) -> Vec<CanvasEvent> {
        self.queue.drain(..).collect()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&CanvasEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("queue", &self.queue)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
