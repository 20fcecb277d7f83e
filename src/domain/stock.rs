use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Quantity on hand and net units sold for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub quantity: i32,
    pub purchase_count: i32,
}

impl StockLevel {
    pub fn new(quantity: i32, purchase_count: i32) -> Self {
        Self {
            quantity,
            purchase_count,
        }
    }

    pub fn available(&self) -> bool {
        self.quantity != 0
    }

    /// Takes `delta` units out of stock and books them as sold.
    pub fn reserve(&self, listing_id: Uuid, delta: i32) -> AppResult<StockLevel> {
        ensure_positive(delta)?;
        if delta > self.quantity {
            return Err(AppError::InsufficientStock {
                listing_id,
                requested: delta,
                available: self.quantity,
            });
        }
        let purchase_count = self
            .purchase_count
            .checked_add(delta)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("purchase count overflow")))?;
        Ok(StockLevel {
            quantity: self.quantity - delta,
            purchase_count,
        })
    }

    /// Exact inverse of [`StockLevel::reserve`], used when an order is cancelled.
    pub fn release(&self, listing_id: Uuid, delta: i32) -> AppResult<StockLevel> {
        ensure_positive(delta)?;
        if delta > self.purchase_count {
            return Err(AppError::Internal(anyhow::anyhow!(
                "release of {delta} units exceeds purchase count {} on listing {listing_id}",
                self.purchase_count
            )));
        }
        let quantity = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("quantity overflow")))?;
        Ok(StockLevel {
            quantity,
            purchase_count: self.purchase_count - delta,
        })
    }
}

fn ensure_positive(delta: i32) -> AppResult<()> {
    if delta <= 0 {
        return Err(AppError::BadRequest(format!(
            "stock delta must be greater than 0, got {delta}"
        )));
    }
    Ok(())
}
