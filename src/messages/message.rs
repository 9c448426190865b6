//! Messages exchanged over the [`MessageBus`](crate::MessageBus).

use std::fmt;
use std::sync::Arc;

use crate::item::ItemRef;

/// Address of a message receiver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target(Arc<str>);

impl Target {
    /// Creates a target from a name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Target name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to turn an item's plugin reference into a playable location.
#[derive(Clone, Debug)]
pub struct ResolveRequest {
    /// Item to resolve in place.
    pub item: ItemRef,
    /// Player hint forwarded untouched with the reply.
    pub player: Option<String>,
    /// Whether playback should resume.
    pub resume: bool,
    /// Where the resolved item is posted.
    pub destination: Target,
}

impl ResolveRequest {
    /// Creates a request replying to `destination`.
    pub fn new(item: ItemRef, destination: impl Into<Target>) -> Self {
        Self {
            item,
            player: None,
            resume: false,
            destination: destination.into(),
        }
    }

    /// Sets the player hint.
    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    /// Sets the resume flag.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}

/// Message bus payloads.
#[derive(Clone, Debug)]
pub enum Message {
    /// Resolve the request's item; no-op if it is no longer a plugin reference.
    ResolvePluginPath(ResolveRequest),
    /// Cancel every in-flight resolution.
    StopAllResolutions,
    /// Reply: the item now has a concrete location.
    PluginPathResolved {
        /// The resolved item (same handle as in the request).
        item: ItemRef,
        /// Player hint from the request.
        player: Option<String>,
    },
}
