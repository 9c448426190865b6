//! Request/response messaging between callers and the executor.
//!
//! - [`Message`], [`ResolveRequest`], [`Target`] payloads and addresses
//! - [`MessageBus`], [`Mailbox`] addressed bounded delivery

mod bus;
mod message;

pub use bus::{Mailbox, MessageBus};
pub use message::{Message, ResolveRequest, Target};
