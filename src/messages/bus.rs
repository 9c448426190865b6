//! # Message bus: addressed, bounded delivery between components.
//!
//! Unlike the event [`Bus`](crate::events::Bus), which broadcasts, the
//! [`MessageBus`] routes each [`Message`] to exactly one registered [`Target`].
//!
//! ```text
//! caller ──post(resolver, ResolvePluginPath)──► [resolver mailbox] ──► Executor
//!   ▲                                                                     │
//!   └──────── [caller mailbox] ◄──post(destination, PluginPathResolved)───┘
//! ```
//!
//! ## Rules
//! - One mailbox per target; registering twice fails.
//! - `post` never waits: a full mailbox is reported as [`BusError::Full`].
//! - Dropping a [`Mailbox`] unregisters its target.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::message::{Message, Target};
use crate::error::BusError;

type Routes = RwLock<HashMap<Target, mpsc::Sender<Message>>>;

/// Router of messages to registered targets. Cheap to clone.
#[derive(Clone, Default)]
pub struct MessageBus {
    routes: Arc<Routes>,
}

impl MessageBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` with a mailbox of `capacity` messages (minimum 1).
    pub fn register(
        &self,
        target: impl Into<Target>,
        capacity: usize,
    ) -> Result<Mailbox, BusError> {
        let target = target.into();
        let mut routes = self.routes.write();
        if routes.get(&target).is_some_and(|tx| !tx.is_closed()) {
            return Err(BusError::AlreadyRegistered {
                target: target.to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        routes.insert(target.clone(), tx);
        Ok(Mailbox {
            target,
            rx,
            routes: Arc::downgrade(&self.routes),
        })
    }

    /// Posts `msg` to `target` without waiting.
    pub fn post(&self, target: &Target, msg: Message) -> Result<(), BusError> {
        let tx = self
            .routes
            .read()
            .get(target)
            .cloned()
            .ok_or_else(|| BusError::UnknownTarget {
                target: target.to_string(),
            })?;

        tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BusError::Full,
            mpsc::error::TrySendError::Closed(_) => BusError::Closed,
        })
    }

    /// Returns true if `target` has a live mailbox.
    pub fn is_registered(&self, target: &Target) -> bool {
        self.routes
            .read()
            .get(target)
            .is_some_and(|tx| !tx.is_closed())
    }
}

/// Receiving end of a registered target.
pub struct Mailbox {
    target: Target,
    rx: mpsc::Receiver<Message>,
    routes: Weak<Routes>,
}

impl Mailbox {
    /// Target this mailbox receives for.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Receives the next message; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Receives a message if one is queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(routes) = self.routes.upgrade() {
            let mut routes = routes.write();
            if routes.get(&self.target).is_some_and(|tx| tx.is_closed()) {
                routes.remove(&self.target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_to_registered_target() {
        let bus = MessageBus::new();
        let mut mailbox = bus.register("ui", 4).expect("register");

        bus.post(&Target::from("ui"), Message::StopAllResolutions)
            .expect("post");
        assert!(matches!(
            mailbox.recv().await,
            Some(Message::StopAllResolutions)
        ));
    }

    #[test]
    fn unknown_and_duplicate_targets_fail() {
        let bus = MessageBus::new();
        let err = bus
            .post(&Target::from("nobody"), Message::StopAllResolutions)
            .unwrap_err();
        assert_eq!(err, BusError::UnknownTarget { target: "nobody".into() });

        let _mailbox = bus.register("ui", 1).expect("register");
        let err = bus.register("ui", 1).err();
        assert_eq!(err, Some(BusError::AlreadyRegistered { target: "ui".into() }));
    }

    #[test]
    fn full_mailbox_is_reported() {
        let bus = MessageBus::new();
        let _mailbox = bus.register("ui", 1).expect("register");
        let ui = Target::from("ui");

        bus.post(&ui, Message::StopAllResolutions).expect("first fits");
        assert_eq!(
            bus.post(&ui, Message::StopAllResolutions),
            Err(BusError::Full)
        );
    }

    #[test]
    fn dropping_mailbox_unregisters() {
        let bus = MessageBus::new();
        let ui = Target::from("ui");
        let mailbox = bus.register(ui.clone(), 1).expect("register");
        assert!(bus.is_registered(&ui));

        drop(mailbox);
        assert!(!bus.is_registered(&ui));
        assert!(bus.register(ui, 1).is_ok());
    }
}
