use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        RemovedCount,
        wishlists::{
            RemoveWishlistsRequest, UpsertWishlistRequest, WishlistDetails, WishlistEntryRequest,
            WishlistList, WishlistUpserted,
        },
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlists).post(upsert_wishlist))
        .route("/remove", post(remove_wishlists))
        .route("/{id}", get(get_wishlist))
        .route("/{id}/entries", post(add_entry))
        .route("/{id}/entries/{listing_id}", delete(remove_entry))
}

#[utoipa::path(
    get,
    path = "/api/wishlists",
    responses(
        (status = 200, description = "Wishlists of the current customer", body = ApiResponse<WishlistList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn list_wishlists(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::list_wishlists(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlists",
    request_body = UpsertWishlistRequest,
    responses(
        (status = 200, description = "Wishlist created or renamed", body = ApiResponse<WishlistUpserted>),
        (status = 404, description = "Wishlist not found"),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn upsert_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertWishlistRequest>,
) -> AppResult<Json<ApiResponse<WishlistUpserted>>> {
    let resp = wishlist_service::upsert_wishlist(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlists/remove",
    request_body = RemoveWishlistsRequest,
    responses(
        (status = 200, description = "Owned wishlists removed", body = ApiResponse<RemovedCount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn remove_wishlists(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RemoveWishlistsRequest>,
) -> AppResult<Json<ApiResponse<RemovedCount>>> {
    let resp = wishlist_service::remove_wishlists(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wishlists/{id}",
    params(("id" = Uuid, Path, description = "Wishlist ID")),
    responses(
        (status = 200, description = "Wishlist with entries", body = ApiResponse<WishlistDetails>),
        (status = 404, description = "Wishlist not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistDetails>>> {
    let resp = wishlist_service::get_wishlist(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlists/{id}/entries",
    params(("id" = Uuid, Path, description = "Wishlist ID")),
    request_body = WishlistEntryRequest,
    responses(
        (status = 200, description = "Listing on the wishlist", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Wishlist or listing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn add_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<WishlistEntryRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::add_entry(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlists/{id}/entries/{listing_id}",
    params(
        ("id" = Uuid, Path, description = "Wishlist ID"),
        ("listing_id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing removed from the wishlist", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Wishlist or entry not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlists"
)]
pub async fn remove_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, listing_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::remove_entry(&state, &user, id, listing_id).await?;
    Ok(Json(resp))
}
