//! Step names reported in `order.failed` events.

/// Reserving stock for the order's items.
pub const STOCK_RESERVATION: &str = "stock_reservation";

/// Confirming the order after a successful reservation.
pub const ORDER_CONFIRMATION: &str = "order_confirmation";
