//! Per-product stock record.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// Monotonic record version used by the optimistic strategy's
/// conditional writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived stock status; a pure function of the available quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    /// Units are available for reservation.
    Available,

    /// No units left to reserve.
    OutOfStock,
}

impl StockStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "AVAILABLE",
            StockStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stock counters for a single product.
///
/// Counters move only through [`InventoryRecord::reserve`] and
/// [`InventoryRecord::release`], which the engine invokes under one of its
/// locking disciplines; `available + reserved` is conserved across any
/// paired reserve/release sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    product_id: ProductId,
    product_name: String,
    available: u32,
    reserved: u32,
    price: Money,
    version: Version,
}

impl InventoryRecord {
    /// Creates a new record with the full quantity available.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        available: u32,
        price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            available,
            reserved: 0,
            price,
            version: Version::default(),
        }
    }

    /// Returns the product ID.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Returns the quantity available for reservation.
    pub fn available(&self) -> u32 {
        self.available
    }

    /// Returns the quantity currently reserved.
    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Returns the unit price.
    pub fn price(&self) -> Money {
        self.price
    }

    /// Returns the current record version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the derived stock status.
    pub fn status(&self) -> StockStatus {
        if self.available == 0 {
            StockStatus::OutOfStock
        } else {
            StockStatus::Available
        }
    }

    /// Returns true if `quantity` units can be reserved right now.
    pub fn can_reserve(&self, quantity: u32) -> bool {
        self.available >= quantity && self.status() == StockStatus::Available
    }

    /// Returns the total units tracked by this record.
    pub fn total_units(&self) -> u32 {
        self.available + self.reserved
    }

    /// Moves `quantity` units from available to reserved.
    pub(crate) fn reserve(&mut self, quantity: u32) -> Result<()> {
        if !self.can_reserve(quantity) {
            return Err(InventoryError::InsufficientStock {
                product_id: self.product_id.clone(),
                available: self.available,
                requested: quantity,
            });
        }
        self.available -= quantity;
        self.reserved += quantity;
        self.version = self.version.next();
        Ok(())
    }

    /// Moves `quantity` units from reserved back to available.
    ///
    /// Releasing more than is reserved clamps to the reserved amount, so
    /// the total unit count is conserved.
    pub(crate) fn release(&mut self, quantity: u32) {
        let returned = quantity.min(self.reserved);
        self.reserved -= returned;
        self.available += returned;
        self.version = self.version.next();
    }
}
