//! Event bus seam.
//!
//! Defines the publish/consume contract the services agree on: topics,
//! typed wire payloads, at-least-once delivery with explicit
//! acknowledgement, and a topic-to-handler dispatcher. The in-memory bus
//! implements the same contract a broker adapter would.

mod bus;
mod dispatcher;
mod error;
mod memory;
pub mod events;
pub mod topics;

pub use bus::{Delivery, EventBus, EventBusExt};
pub use dispatcher::{Dispatcher, EventHandler, HandlerError};
pub use error::BusError;
pub use memory::InMemoryBus;
