//! # Event subscribers for the resolver runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and, behind the `logging` feature, the [`LogWriter`] subscriber.
//!
//! ```text
//! Action/Executor ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                 ┌──────┴──────┐
//!                                                                 ▼             ▼
//!                                                             LogWriter      Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
