use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        catalog::{ProductState, check_listing_fields},
        stock::StockLevel,
    },
    dto::listings::{CreateListingRequest, ListingList, ListingView, UpdateListingRequest},
    entity::{
        ListingReviews, Listings, OrderEntries, Products, Sellers,
        listing_reviews::Column as ReviewCol,
        listings::{ActiveModel as ListingActive, Column as ListingCol, Model as ListingModel},
        order_entries::Column as OrderEntryCol,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_seller},
    models::Listing,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

fn owned(id: Uuid, seller_id: Uuid) -> Condition {
    Condition::all()
        .add(ListingCol::Id.eq(id))
        .add(ListingCol::SellerId.eq(seller_id))
}

pub async fn create_listing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    ensure_seller(user)?;

    let mut errors = FieldErrors::default();
    check_listing_fields(&mut errors, Some(payload.quantity), Some(payload.price));
    let product_state = match payload.product_state.parse::<ProductState>() {
        Ok(s) => Some(s),
        Err(_) => {
            errors.add("product_state", format!("Invalid product_state: {}", payload.product_state));
            None
        }
    };
    errors.into_result()?;
    let product_state = product_state.unwrap_or(ProductState::New);

    if Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let now = Utc::now();
    let listing = ListingActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        seller_id: Set(user.user_id),
        quantity: Set(payload.quantity),
        price: Set(payload.price),
        product_state: Set(product_state.as_str().to_string()),
        available: Set(StockLevel::new(payload.quantity, 0).available()),
        purchase_count: Set(0),
        view_count: Set(0),
        created_at: Set(now.into()),
        modified_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "listing_create",
        "listings",
        json!({ "listing_id": listing.id, "product_id": listing.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Listing created",
        Listing::from_entity(listing)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_own_listings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ListingList>> {
    ensure_seller(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Listings::find()
        .filter(ListingCol::SellerId.eq(user.user_id))
        .order_by_desc(ListingCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Listing::from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        ListingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_own_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Listing>> {
    ensure_seller(user)?;
    let listing = match Listings::find().filter(owned(id, user.user_id)).one(&state.orm).await? {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "OK",
        Listing::from_entity(listing)?,
        Some(Meta::empty()),
    ))
}

/// Partial update. `available` follows the new quantity.
pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    ensure_seller(user)?;

    let mut errors = FieldErrors::default();
    check_listing_fields(&mut errors, payload.quantity, payload.price);
    let product_state = match payload.product_state.as_deref().map(str::parse::<ProductState>) {
        Some(Ok(s)) => Some(s),
        Some(Err(_)) => {
            errors.add("product_state", "Invalid product_state");
            None
        }
        None => None,
    };
    errors.into_result()?;

    let txn = state.orm.begin().await?;
    let listing = Listings::find()
        .filter(owned(id, user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let listing: ListingModel = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    let mut active: ListingActive = listing.into();
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
        active.available = Set(quantity != 0);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(product_state) = product_state {
        active.product_state = Set(product_state.as_str().to_string());
    }
    active.modified_at = Set(Utc::now().into());
    let listing = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "listing_update",
        "listings",
        json!({ "listing_id": listing.id, "quantity": listing.quantity, "price": listing.price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Listing updated",
        Listing::from_entity(listing)?,
        Some(Meta::empty()),
    ))
}

/// Listings that were already ordered stay, their entries reference them.
pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_seller(user)?;

    let txn = state.orm.begin().await?;
    let listing = Listings::find()
        .filter(owned(id, user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if listing.is_none() {
        return Err(AppError::NotFound);
    }

    let ordered = OrderEntries::find()
        .filter(OrderEntryCol::ListingId.eq(id))
        .count(&txn)
        .await?;
    if ordered > 0 {
        return Err(AppError::BadRequest(
            "Listing has orders and cannot be deleted, set its quantity to 0 instead".into(),
        ));
    }

    Listings::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "listing_delete",
        "listings",
        json!({ "listing_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Listing deleted",
        json!({ "listing_id": id }),
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct ReviewSummary {
    average_rating: f64,
    review_count: i64,
}

/// Public listing page. Each call counts as one view.
pub async fn view_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ListingView>> {
    let updated = Listings::update_many()
        .col_expr(ListingCol::ViewCount, Expr::col(ListingCol::ViewCount).add(1))
        .filter(ListingCol::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    let listing = match Listings::find_by_id(id).one(&state.orm).await? {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    let product = match Products::find_by_id(listing.product_id).one(&state.orm).await? {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let seller = match Sellers::find_by_id(listing.seller_id).one(&state.orm).await? {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let summary = ListingReviews::find()
        .select_only()
        .column_as(
            Expr::cust("COALESCE(AVG(rating), 0)::float8"),
            "average_rating",
        )
        .column_as(Expr::cust("COUNT(*)"), "review_count")
        .filter(ReviewCol::ListingId.eq(id))
        .into_model::<ReviewSummary>()
        .one(&state.orm)
        .await?;
    let (average_rating, review_count) = match summary {
        Some(s) => (s.average_rating, s.review_count),
        None => (0.0, 0),
    };

    Ok(ApiResponse::success(
        "Listing",
        ListingView {
            listing: Listing::from_entity(listing)?,
            product_name: product.name,
            product_description: product.description,
            company_name: seller.company_name,
            average_rating,
            review_count,
        },
        Some(Meta::empty()),
    ))
}
