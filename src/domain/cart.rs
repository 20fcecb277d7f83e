use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};

/// What an upsert request does to the cart once it has been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Remove { entry_id: Uuid },
    Update { entry_id: Uuid, amount: i32 },
    Insert { amount: i32 },
}

/// Decides how `amount` units of a listing land in the cart.
///
/// `existing_entry` is the cart's current entry for the listing, `listing_quantity`
/// is `None` when the listing does not exist. Stock is only checked here, never held.
pub fn plan_upsert(
    listing_id: Uuid,
    existing_entry: Option<Uuid>,
    listing_quantity: Option<i32>,
    amount: i32,
) -> AppResult<CartChange> {
    if amount < 0 {
        return Err(AppError::Validation(FieldErrors::single(
            "amount",
            "amount must not be negative",
        )));
    }

    if amount == 0 {
        return match existing_entry {
            Some(entry_id) => Ok(CartChange::Remove { entry_id }),
            None => Err(AppError::NotFound),
        };
    }

    let available = listing_quantity.ok_or(AppError::NotFound)?;
    if amount > available {
        return Err(AppError::InsufficientStock {
            listing_id,
            requested: amount,
            available,
        });
    }

    Ok(match existing_entry {
        Some(entry_id) => CartChange::Update { entry_id, amount },
        None => CartChange::Insert { amount },
    })
}
