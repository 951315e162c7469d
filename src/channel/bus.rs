use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Channel name that receives every message.
pub const ANY_CHANNEL: &str = "*";

/// A message routable by channel name.
pub trait Message: Clone + 'static {
    /// Channel this message is delivered on.
    fn channel(&self) -> &'static str;
}

/// Identifies one subscription for [`MessageBus::unsubscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<M> = Rc<dyn Fn(&M)>;

struct Subscriber<M> {
    id: SubscriptionId,
    channel: String,
    key: Option<String>,
    handler: Handler<M>,
}

struct Inner<M> {
    next_id: u64,
    subscribers: Vec<Subscriber<M>>,
    queue: VecDeque<M>,
    delivering: bool,
}

/// Single-threaded publish/subscribe bus with FIFO delivery.
///
/// `send` only enqueues; `pump` delivers. Handlers may send further messages, which are delivered
/// by the same pump after everything queued before them.
pub struct MessageBus<M: Message> {
    inner: Rc<RefCell<Inner<M>>>,
}

impl<M: Message> Clone for MessageBus<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<M: Message> Default for MessageBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> std::fmt::Debug for MessageBus<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MessageBus")
            .field("subscribers", &inner.subscribers.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl<M: Message> MessageBus<M> {
    /// Empty bus.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                next_id: 0,
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                delivering: false,
            })),
        }
    }

    /// Register `handler` for `channel` ([`ANY_CHANNEL`] for all).
    pub fn subscribe(&self, channel: &str, handler: impl Fn(&M) + 'static) -> SubscriptionId {
        self.insert(channel, None, Rc::new(handler))
    }

    /// Register `handler` under `key`, replacing any earlier handler with the same channel and key.
    ///
    /// The replaced handler keeps its id and delivery position.
    pub fn subscribe_keyed(
        &self,
        channel: &str,
        key: &str,
        handler: impl Fn(&M) + 'static,
    ) -> SubscriptionId {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(existing) = inner
                .subscribers
                .iter_mut()
                .find(|s| s.channel == channel && s.key.as_deref() == Some(key))
            {
                existing.handler = Rc::new(handler);
                return existing.id;
            }
        }
        self.insert(channel, Some(key.to_owned()), Rc::new(handler))
    }

    fn insert(&self, channel: &str, key: Option<String>, handler: Handler<M>) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            channel: channel.to_owned(),
            key,
            handler,
        });
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }

    /// Handlers that would receive a message on `channel`, excluding [`ANY_CHANNEL`] listeners.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.channel == channel)
            .count()
    }

    /// Enqueue `msg` for the next [`MessageBus::pump`].
    pub fn send(&self, msg: M) {
        tracing::trace!(channel = msg.channel(), "queue message");
        self.inner.borrow_mut().queue.push_back(msg);
    }

    /// Messages waiting for delivery.
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Deliver queued messages in order until the queue is empty. Returns how many were delivered.
    ///
    /// A nested call from inside a handler returns `0`; the outer pump picks up the new messages.
    pub fn pump(&self) -> usize {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.delivering {
                return 0;
            }
            inner.delivering = true;
        }
        let _delivering = DeliveringGuard(&*self.inner);

        let mut delivered = 0;
        loop {
            let (msg, handlers) = {
                let mut inner = self.inner.borrow_mut();
                let Some(msg) = inner.queue.pop_front() else {
                    break;
                };
                let channel = msg.channel();
                let handlers: Vec<Handler<M>> = inner
                    .subscribers
                    .iter()
                    .filter(|s| s.channel == channel || s.channel == ANY_CHANNEL)
                    .map(|s| Rc::clone(&s.handler))
                    .collect();
                (msg, handlers)
            };
            if handlers.is_empty() {
                tracing::debug!(channel = msg.channel(), "no subscriber for message");
            }
            for handler in handlers {
                handler(&msg);
            }
            delivered += 1;
        }
        delivered
    }
}

/// Clears the delivering flag when a pump ends, including by a panicking handler.
struct DeliveringGuard<'a, M>(&'a RefCell<Inner<M>>);

impl<M> Drop for DeliveringGuard<'_, M> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.delivering = false;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/bus.rs"]
mod tests;
