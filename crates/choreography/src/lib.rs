//! Choreography of the order saga.
//!
//! No central orchestrator: each handler reacts to the events it subscribes
//! to, drives its own aggregate, and emits follow-up events. Compensation
//! is forward-only and best-effort: a failed multi-item reservation
//! releases what it already took and reports the original failure.

mod commands;
mod error;
mod order_flow;
pub mod steps;
mod stock_flow;

pub use commands::OrderCommands;
pub use error::ChoreographyError;
pub use order_flow::OrderLifecycleHandler;
pub use stock_flow::{ReservationLedger, StockReservationHandler};
