//! # Media items and plugin locations.
//!
//! A [`MediaItem`] is what a caller wants to play. Its *location* is either a
//! concrete path or an indirect `plugin://` reference naming an addon script that
//! has to run to produce the real location.
//!
//! Items travel between the caller, the executor and a worker task, so they are
//! shared through [`ItemRef`] (`Arc<RwLock<MediaItem>>`): an item cannot be
//! dropped while a resolution referencing it is outstanding.
//!
//! ## Location rules
//! - location = `dyn_path` when non-empty, otherwise `path`
//! - a resolved item keeps its original `path`; only `dyn_path` points at the
//!   playable location

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Scheme prefix of indirect plugin references.
pub const PLUGIN_SCHEME: &str = "plugin://";

/// Shared, lockable handle to a [`MediaItem`].
pub type ItemRef = Arc<RwLock<MediaItem>>;

/// Returns true if `path` is an indirect plugin reference.
///
/// Only the scheme is checked; the rest of the reference is the script's business.
pub fn is_plugin_path(path: &str) -> bool {
    path.len() >= PLUGIN_SCHEME.len()
        && path.as_bytes()[..PLUGIN_SCHEME.len()].eq_ignore_ascii_case(PLUGIN_SCHEME.as_bytes())
}

/// A playable (or not-yet-playable) media item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaItem {
    /// Path the item was listed with (e.g. `plugin://plugin.video.foo/?id=1`).
    pub path: String,
    /// Dynamic path filled in by resolution; empty until resolved.
    pub dyn_path: String,
    /// Display label.
    pub label: String,
    /// Mime type reported by the resolver, if any.
    pub mime_type: String,
    /// Whether the player should probe the content type itself.
    pub content_lookup: bool,
    /// Free-form properties (stream headers, inputstream hints, ...).
    pub properties: HashMap<String, String>,
}

impl MediaItem {
    /// Creates an item listed under `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_lookup: true,
            ..Self::default()
        }
    }

    /// Wraps the item in a shared [`ItemRef`].
    pub fn into_ref(self) -> ItemRef {
        Arc::new(RwLock::new(self))
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the location used for playback.
    pub fn location(&self) -> &str {
        if self.dyn_path.is_empty() {
            &self.path
        } else {
            &self.dyn_path
        }
    }

    /// Returns true if the item still needs a plugin to produce its location.
    pub fn has_plugin_path(&self) -> bool {
        is_plugin_path(self.location())
    }

    /// Copies the resolved fields into this item.
    pub fn apply(&mut self, resolved: &ResolvedItem) {
        self.dyn_path.clone_from(&resolved.path);
        if let Some(mime) = &resolved.mime_type {
            self.mime_type.clone_from(mime);
        }
        if let Some(label) = resolved.label.as_ref().filter(|l| !l.is_empty()) {
            self.label.clone_from(label);
        }
        self.content_lookup = resolved.content_lookup;
        self.properties.extend(
            resolved
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}

/// Result data reported by a resolving script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedItem {
    /// Playable location. May itself be another plugin reference.
    pub path: String,
    /// Mime type, when the script knows it.
    pub mime_type: Option<String>,
    /// Replacement label, when the script provides one.
    pub label: Option<String>,
    /// Whether the player should probe the content type itself.
    pub content_lookup: bool,
    /// Extra properties merged into the item.
    pub properties: HashMap<String, String>,
}

impl ResolvedItem {
    /// Creates a result pointing at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: None,
            label: None,
            content_lookup: true,
            properties: HashMap::new(),
        }
    }

    /// Sets the mime type (and disables content lookup).
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self.content_lookup = false;
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
