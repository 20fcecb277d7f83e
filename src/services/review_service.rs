use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, EditReviewRequest, ReviewList},
    entity::{
        ListingReviews, Listings,
        listing_reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as ReviewEntity},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_customer},
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::{ReviewOrder, ReviewQuery},
    state::AppState,
};

const MAX_TITLE_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 2048;

fn check_text(errors: &mut FieldErrors, title: Option<&str>, description: Option<&str>) {
    if let Some(title) = title {
        errors.require_text("title", title, MAX_TITLE_LEN);
    }
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.add(
                "description",
                format!("description must be at most {MAX_DESCRIPTION_LEN} characters"),
            );
        }
    }
}

fn ordered(finder: Select<ReviewEntity>, order: ReviewOrder) -> Select<ReviewEntity> {
    match order {
        ReviewOrder::Newest => finder.order_by_desc(ReviewCol::CreatedAt),
        ReviewOrder::Oldest => finder.order_by_asc(ReviewCol::CreatedAt),
        ReviewOrder::Highest => finder
            .order_by_desc(ReviewCol::Rating)
            .order_by_desc(ReviewCol::CreatedAt),
        ReviewOrder::Lowest => finder
            .order_by_asc(ReviewCol::Rating)
            .order_by_desc(ReviewCol::CreatedAt),
    }
}

async fn paged(
    state: &AppState,
    finder: Select<ReviewEntity>,
    query: &ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = ordered(finder, query.order_by.unwrap_or_default());
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// One review per customer and listing.
pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    listing_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_customer(user)?;

    let mut errors = FieldErrors::default();
    check_text(&mut errors, Some(&payload.title), payload.description.as_deref());
    errors.into_result()?;

    if Listings::find_by_id(listing_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = ListingReviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::CustomerId.eq(user.user_id))
                .add(ReviewCol::ListingId.eq(listing_id)),
        )
        .count(&state.orm)
        .await?;
    if existing > 0 {
        return Err(AppError::AlreadyExists("Review".into()));
    }

    let now = Utc::now();
    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        listing_id: Set(listing_id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.map(|d| d.trim().to_string())),
        rating: Set(payload.rating.value()),
        created_at: Set(now.into()),
        modified_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::unique_or(err, || AppError::AlreadyExists("Review".into())))?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_create",
        "listing_reviews",
        json!({ "review_id": review.id, "listing_id": listing_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        Review::from_entity(review)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_own_reviews(
    state: &AppState,
    user: &AuthUser,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_customer(user)?;
    let finder = ListingReviews::find().filter(ReviewCol::CustomerId.eq(user.user_id));
    paged(state, finder, &query).await
}

pub async fn list_listing_reviews(
    state: &AppState,
    listing_id: Uuid,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    if Listings::find_by_id(listing_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let finder = ListingReviews::find().filter(ReviewCol::ListingId.eq(listing_id));
    paged(state, finder, &query).await
}

/// Only supplied fields change; `modified_at` is always refreshed.
pub async fn edit_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: EditReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_customer(user)?;

    let mut errors = FieldErrors::default();
    check_text(&mut errors, payload.title.as_deref(), payload.description.as_deref());
    errors.into_result()?;

    let review = ListingReviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::Id.eq(id))
                .add(ReviewCol::CustomerId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let review = match review {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let mut active: ReviewActive = review.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description.trim().to_string()));
    }
    if let Some(rating) = payload.rating {
        active.rating = Set(rating.value());
    }
    active.modified_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_edit",
        "listing_reviews",
        json!({ "review_id": review.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review updated",
        Review::from_entity(review)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;

    let result = ListingReviews::delete_many()
        .filter(
            Condition::all()
                .add(ReviewCol::Id.eq(id))
                .add(ReviewCol::CustomerId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "review_delete",
        "listing_reviews",
        json!({ "review_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review deleted",
        json!({ "review_id": id }),
        Some(Meta::empty()),
    ))
}
