use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::{CartChange, plan_upsert},
        catalog::ProductState,
    },
    dto::{
        RemovedCount,
        cart::{
            CartAction, CartLine, CartUpsertResult, CartView, RemoveCartEntriesRequest,
            UpsertCartRequest,
        },
    },
    entity::{
        CartEntries, Carts, Listings,
        cart_entries::{self, ActiveModel as CartEntryActive, Column as CartEntryCol},
        carts::{Column as CartCol, Model as CartModel},
        listings::{self, Column as ListingCol},
        products::Column as ProductCol,
        sellers::Column as SellerCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn customer_cart<C: ConnectionTrait>(conn: &C, customer_id: Uuid) -> AppResult<CartModel> {
    let cart = Carts::find()
        .filter(CartCol::CustomerId.eq(customer_id))
        .one(conn)
        .await?;
    match cart {
        Some(c) => Ok(c),
        None => Err(AppError::NotFound),
    }
}

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    entry_id: Uuid,
    listing_id: Uuid,
    amount: i32,
    product_id: Uuid,
    product_name: String,
    product_state: String,
    company_name: String,
    price: Decimal,
    quantity: i32,
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_customer(user)?;
    let cart = customer_cart(&state.orm, user.user_id).await?;

    let rows = CartEntries::find()
        .select_only()
        .column_as(CartEntryCol::Id, "entry_id")
        .column_as(CartEntryCol::ListingId, "listing_id")
        .column_as(CartEntryCol::Amount, "amount")
        .column_as(ListingCol::ProductId, "product_id")
        .column_as(ListingCol::ProductState, "product_state")
        .column_as(ListingCol::Price, "price")
        .column_as(ListingCol::Quantity, "quantity")
        .column_as(ProductCol::Name, "product_name")
        .column_as(SellerCol::CompanyName, "company_name")
        .join(JoinType::InnerJoin, cart_entries::Relation::Listings.def())
        .join(JoinType::InnerJoin, listings::Relation::Products.def())
        .join(JoinType::InnerJoin, listings::Relation::Sellers.def())
        .filter(CartEntryCol::CartId.eq(cart.id))
        .order_by_asc(CartEntryCol::CreatedAt)
        .into_model::<CartLineRow>()
        .all(&state.orm)
        .await?;

    let mut cart_total = Decimal::ZERO;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let line_total = row.price * Decimal::from(row.amount);
        cart_total += line_total;
        entries.push(CartLine {
            entry_id: row.entry_id,
            listing_id: row.listing_id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_state: ProductState::from_db(&row.product_state)?,
            company_name: row.company_name,
            price_per_unit: row.price,
            amount: row.amount,
            line_total,
            listing_quantity: row.quantity,
        });
    }

    let is_empty = entries.is_empty();
    Ok(ApiResponse::success(
        "Cart",
        CartView {
            cart_id: cart.id,
            entries,
            cart_total,
            is_empty,
        },
        Some(Meta::empty()),
    ))
}

/// Sets the amount of one listing in the cart. An amount of zero removes the entry.
pub async fn upsert_entry(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertCartRequest,
) -> AppResult<ApiResponse<CartUpsertResult>> {
    ensure_customer(user)?;

    let txn = state.orm.begin().await?;
    let cart = customer_cart(&txn, user.user_id).await?;

    let existing = CartEntries::find()
        .filter(
            Condition::all()
                .add(CartEntryCol::CartId.eq(cart.id))
                .add(CartEntryCol::ListingId.eq(payload.listing_id)),
        )
        .lock_exclusive()
        .one(&txn)
        .await?;
    let listing = Listings::find_by_id(payload.listing_id).one(&txn).await?;

    let change = plan_upsert(
        payload.listing_id,
        existing.as_ref().map(|e| e.id),
        listing.as_ref().map(|l| l.quantity),
        payload.amount,
    )?;

    let result = match (change, existing) {
        (CartChange::Remove { entry_id }, _) => {
            CartEntries::delete_by_id(entry_id).exec(&txn).await?;
            CartUpsertResult {
                action: CartAction::Removed,
                entry_id,
            }
        }
        (CartChange::Update { entry_id, amount }, Some(entry)) => {
            let mut active: CartEntryActive = entry.into();
            active.amount = Set(amount);
            active.update(&txn).await?;
            CartUpsertResult {
                action: CartAction::Updated,
                entry_id,
            }
        }
        (CartChange::Insert { amount }, _) => {
            let entry = CartEntryActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                listing_id: Set(payload.listing_id),
                amount: Set(amount),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
            CartUpsertResult {
                action: CartAction::Created,
                entry_id: entry.id,
            }
        }
        (CartChange::Update { .. }, None) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "cart update planned without an entry"
            )));
        }
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_update",
        "cart_entries",
        json!({ "listing_id": payload.listing_id, "amount": payload.amount, "action": result.action }),
    )
    .await;

    Ok(ApiResponse::success("OK", result, Some(Meta::empty())))
}

/// Deletes the given entries if they belong to the caller's cart. Unknown ids are skipped.
pub async fn remove_entries(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveCartEntriesRequest,
) -> AppResult<ApiResponse<RemovedCount>> {
    ensure_customer(user)?;
    let cart = customer_cart(&state.orm, user.user_id).await?;

    let mut ids = payload.entry_ids;
    ids.sort();
    ids.dedup();
    let requested = ids.len() as u64;

    let removed = if ids.is_empty() {
        0
    } else {
        CartEntries::delete_many()
            .filter(
                Condition::all()
                    .add(CartEntryCol::CartId.eq(cart.id))
                    .add(CartEntryCol::Id.is_in(ids)),
            )
            .exec(&state.orm)
            .await?
            .rows_affected
    };

    audit::record(
        &state.pool,
        user.user_id,
        "cart_remove",
        "cart_entries",
        json!({ "requested": requested, "removed": removed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        RemovedCount { requested, removed },
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<RemovedCount>> {
    ensure_customer(user)?;
    let cart = customer_cart(&state.orm, user.user_id).await?;

    let removed = CartEntries::delete_many()
        .filter(CartEntryCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?
        .rows_affected;

    if removed > 0 {
        audit::record(
            &state.pool,
            user.user_id,
            "cart_clear",
            "cart_entries",
            json!({ "removed": removed }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Cart cleared",
        RemovedCount {
            requested: removed,
            removed,
        },
        Some(Meta::empty()),
    ))
}
