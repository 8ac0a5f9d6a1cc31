//! Topic names shared by every service.

/// Order created in PENDING state, stock not yet reserved.
pub const ORDER_INITIATED: &str = "order.initiated";

/// Order repriced from reservation data.
pub const ORDER_CREATED: &str = "order.created";

/// Order reached CONFIRMED.
pub const ORDER_CONFIRMED: &str = "order.confirmed";

/// Order reached FAILED.
pub const ORDER_FAILED: &str = "order.failed";

/// Order reached CANCELLED.
pub const ORDER_CANCELLED: &str = "order.cancelled";

/// Every item of an order reserved.
pub const STOCK_RESERVED: &str = "stock.reserved";

/// Reservation aborted; any partial reservations were compensated.
pub const STOCK_RESERVATION_FAILED: &str = "stock.reservation.failed";

/// A reservation returned to available stock.
pub const STOCK_RELEASED: &str = "stock.released";

/// Every topic in the system, in no particular order.
pub const ALL: [&str; 8] = [
    ORDER_INITIATED,
    ORDER_CREATED,
    ORDER_CONFIRMED,
    ORDER_FAILED,
    ORDER_CANCELLED,
    STOCK_RESERVED,
    STOCK_RESERVATION_FAILED,
    STOCK_RELEASED,
];
