//! Stock ledger. Every mutation runs on the caller's transaction against a row
//! locked `FOR UPDATE`, so concurrent checkouts and cancellations serialise per
//! listing.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, EntityTrait, QuerySelect, Set,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    domain::stock::StockLevel,
    entity::{
        Listings,
        listings::{ActiveModel as ListingActive, Model as ListingModel},
    },
    error::{AppError, AppResult},
};

pub async fn lock_listing(txn: &DatabaseTransaction, listing_id: Uuid) -> AppResult<ListingModel> {
    let listing = Listings::find_by_id(listing_id)
        .lock(LockType::Update)
        .one(txn)
        .await?;
    match listing {
        Some(listing) => Ok(listing),
        None => Err(AppError::NotFound),
    }
}

/// Moves `delta` units from stock to sold.
pub async fn reserve(
    txn: &DatabaseTransaction,
    listing_id: Uuid,
    delta: i32,
) -> AppResult<StockLevel> {
    let listing = lock_listing(txn, listing_id).await?;
    let level = StockLevel::new(listing.quantity, listing.purchase_count).reserve(listing_id, delta)?;
    store_level(txn, listing, level).await?;
    tracing::debug!(%listing_id, delta, quantity = level.quantity, "stock reserved");
    Ok(level)
}

/// Puts `delta` previously reserved units back into stock.
pub async fn release(
    txn: &DatabaseTransaction,
    listing_id: Uuid,
    delta: i32,
) -> AppResult<StockLevel> {
    let listing = lock_listing(txn, listing_id).await?;
    let level = StockLevel::new(listing.quantity, listing.purchase_count).release(listing_id, delta)?;
    store_level(txn, listing, level).await?;
    tracing::debug!(%listing_id, delta, quantity = level.quantity, "stock released");
    Ok(level)
}

async fn store_level(
    txn: &DatabaseTransaction,
    listing: ListingModel,
    level: StockLevel,
) -> AppResult<ListingModel> {
    let mut active: ListingActive = listing.into();
    active.quantity = Set(level.quantity);
    active.purchase_count = Set(level.purchase_count);
    active.available = Set(level.available());
    active.modified_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}
