use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::{LockType, OnConflict},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        catalog::ProductState,
        wishlist::{ensure_name_free, normalize_name},
    },
    dto::{
        RemovedCount,
        wishlists::{
            RemoveWishlistsRequest, UpsertWishlistRequest, WishlistDetails, WishlistEntryRequest,
            WishlistLine, WishlistList, WishlistUpserted,
        },
    },
    entity::{
        Listings, WishlistEntries, Wishlists,
        listings::{self, Column as ListingCol},
        products::Column as ProductCol,
        sellers::Column as SellerCol,
        wishlist_entries::{self, ActiveModel as EntryActive, Column as EntryCol},
        wishlists::{ActiveModel as WishlistActive, Column as WishlistCol, Model as WishlistModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    models::WishList,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn owned_wishlist<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    id: Uuid,
) -> AppResult<WishlistModel> {
    let wishlist = Wishlists::find()
        .filter(
            Condition::all()
                .add(WishlistCol::Id.eq(id))
                .add(WishlistCol::CustomerId.eq(customer_id)),
        )
        .one(conn)
        .await?;
    match wishlist {
        Some(w) => Ok(w),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_wishlists(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistList>> {
    ensure_customer(user)?;
    let items = Wishlists::find()
        .filter(WishlistCol::CustomerId.eq(user.user_id))
        .order_by_asc(WishlistCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WishList::from)
        .collect();
    Ok(ApiResponse::success(
        "Wishlists",
        WishlistList { items },
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct WishlistLineRow {
    entry_id: Uuid,
    listing_id: Uuid,
    product_name: String,
    product_state: String,
    price: Decimal,
    company_name: String,
    available: bool,
}

pub async fn get_wishlist(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<WishlistDetails>> {
    ensure_customer(user)?;
    let wishlist = owned_wishlist(&state.orm, user.user_id, id).await?;

    let rows = WishlistEntries::find()
        .select_only()
        .column_as(EntryCol::Id, "entry_id")
        .column_as(EntryCol::ListingId, "listing_id")
        .column_as(ProductCol::Name, "product_name")
        .column_as(ListingCol::ProductState, "product_state")
        .column_as(ListingCol::Price, "price")
        .column_as(ListingCol::Available, "available")
        .column_as(SellerCol::CompanyName, "company_name")
        .join(JoinType::InnerJoin, wishlist_entries::Relation::Listings.def())
        .join(JoinType::InnerJoin, listings::Relation::Products.def())
        .join(JoinType::InnerJoin, listings::Relation::Sellers.def())
        .filter(EntryCol::WishlistId.eq(wishlist.id))
        .order_by_asc(EntryCol::CreatedAt)
        .into_model::<WishlistLineRow>()
        .all(&state.orm)
        .await?;

    let entries = rows
        .into_iter()
        .map(|row| {
            Ok(WishlistLine {
                entry_id: row.entry_id,
                listing_id: row.listing_id,
                product_name: row.product_name,
                product_state: ProductState::from_db(&row.product_state)?,
                price_per_unit: row.price,
                company_name: row.company_name,
                available: row.available,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let is_empty = entries.is_empty();
    Ok(ApiResponse::success(
        "Wishlist",
        WishlistDetails {
            wishlist: WishList::from(wishlist),
            entries,
            is_empty,
        },
        Some(Meta::empty()),
    ))
}

/// Renames the given wishlist, or creates one when no id is supplied.
/// Names are unique per customer.
pub async fn upsert_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertWishlistRequest,
) -> AppResult<ApiResponse<WishlistUpserted>> {
    ensure_customer(user)?;
    let name = normalize_name(&payload.wishlist_name)?;

    let txn = state.orm.begin().await?;

    let target = match payload.wishlist_id {
        Some(id) => {
            let wishlist = Wishlists::find()
                .filter(
                    Condition::all()
                        .add(WishlistCol::Id.eq(id))
                        .add(WishlistCol::CustomerId.eq(user.user_id)),
                )
                .lock(LockType::Update)
                .one(&txn)
                .await?;
            match wishlist {
                Some(w) => Some(w),
                None => return Err(AppError::NotFound),
            }
        }
        None => None,
    };

    let holder = Wishlists::find()
        .filter(
            Condition::all()
                .add(WishlistCol::CustomerId.eq(user.user_id))
                .add(WishlistCol::Name.eq(name.as_str())),
        )
        .one(&txn)
        .await?;
    ensure_name_free(&name, holder.map(|w| w.id), target.as_ref().map(|w| w.id))?;

    // A concurrent request can still claim the name after the check above.
    let duplicate = || AppError::DuplicateName(name.clone());
    let (wishlist, created) = match target {
        Some(existing) => {
            let mut active: WishlistActive = existing.into();
            active.name = Set(name.clone());
            let wishlist = active
                .update(&txn)
                .await
                .map_err(|err| AppError::unique_or(err, duplicate))?;
            (wishlist, false)
        }
        None => {
            let wishlist = WishlistActive {
                id: Set(Uuid::new_v4()),
                customer_id: Set(user.user_id),
                name: Set(name.clone()),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(|err| AppError::unique_or(err, duplicate))?;
            (wishlist, true)
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        if created { "wishlist_create" } else { "wishlist_rename" },
        "wishlists",
        json!({ "wishlist_id": wishlist.id, "name": name }),
    )
    .await;

    Ok(ApiResponse::success(
        if created { "Wishlist created" } else { "Wishlist updated" },
        WishlistUpserted {
            wishlist: WishList::from(wishlist),
            created,
        },
        Some(Meta::empty()),
    ))
}

/// Adding a listing that is already on the wishlist succeeds without a new row.
pub async fn add_entry(
    state: &AppState,
    user: &AuthUser,
    wishlist_id: Uuid,
    payload: WishlistEntryRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;
    let wishlist = owned_wishlist(&state.orm, user.user_id, wishlist_id).await?;

    if Listings::find_by_id(payload.listing_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let inserted = WishlistEntries::insert(EntryActive {
        id: Set(Uuid::new_v4()),
        wishlist_id: Set(wishlist.id),
        listing_id: Set(payload.listing_id),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::columns([EntryCol::WishlistId, EntryCol::ListingId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    let entry = WishlistEntries::find()
        .filter(
            Condition::all()
                .add(EntryCol::WishlistId.eq(wishlist.id))
                .add(EntryCol::ListingId.eq(payload.listing_id)),
        )
        .one(&state.orm)
        .await?;
    let entry = match entry {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    if inserted == 0 {
        return Ok(ApiResponse::success(
            "Listing already in wishlist",
            json!({ "entry_id": entry.id, "added": false }),
            Some(Meta::empty()),
        ));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "wishlist_add",
        "wishlist_entries",
        json!({ "wishlist_id": wishlist.id, "listing_id": payload.listing_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wishlist entry added",
        json!({ "entry_id": entry.id, "added": true }),
        Some(Meta::empty()),
    ))
}

pub async fn remove_entry(
    state: &AppState,
    user: &AuthUser,
    wishlist_id: Uuid,
    listing_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;
    let wishlist = owned_wishlist(&state.orm, user.user_id, wishlist_id).await?;

    let result = WishlistEntries::delete_many()
        .filter(
            Condition::all()
                .add(EntryCol::WishlistId.eq(wishlist.id))
                .add(EntryCol::ListingId.eq(listing_id)),
        )
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "wishlist_remove",
        "wishlist_entries",
        json!({ "wishlist_id": wishlist.id, "listing_id": listing_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wishlist entry removed",
        json!({ "wishlist_id": wishlist.id, "listing_id": listing_id }),
        Some(Meta::empty()),
    ))
}

/// Deletes whichever of the given wishlists the caller owns.
pub async fn remove_wishlists(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveWishlistsRequest,
) -> AppResult<ApiResponse<RemovedCount>> {
    ensure_customer(user)?;

    let mut ids = payload.wishlist_ids;
    ids.sort();
    ids.dedup();
    let requested = ids.len() as u64;

    let removed = if ids.is_empty() {
        0
    } else {
        Wishlists::delete_many()
            .filter(
                Condition::all()
                    .add(WishlistCol::CustomerId.eq(user.user_id))
                    .add(WishlistCol::Id.is_in(ids)),
            )
            .exec(&state.orm)
            .await?
            .rows_affected
    };

    if removed > 0 {
        audit::record(
            &state.pool,
            user.user_id,
            "wishlist_delete",
            "wishlists",
            json!({ "requested": requested, "removed": removed }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Wishlists removed",
        RemovedCount { requested, removed },
        Some(Meta::empty()),
    ))
}
