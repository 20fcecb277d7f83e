use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        RemovedCount,
        cart::{CartUpsertResult, CartView, RemoveCartEntriesRequest, UpsertCartRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).put(upsert_entry).delete(clear_cart))
        .route("/remove", post(remove_entries))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart entries with line totals", body = ApiResponse<CartView>),
        (status = 404, description = "Cart not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart",
    request_body = UpsertCartRequest,
    responses(
        (status = 200, description = "Entry created, updated or removed (amount 0)", body = ApiResponse<CartUpsertResult>),
        (status = 404, description = "Listing or entry not found"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn upsert_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertCartRequest>,
) -> AppResult<Json<ApiResponse<CartUpsertResult>>> {
    let resp = cart_service::upsert_entry(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/remove",
    request_body = RemoveCartEntriesRequest,
    responses(
        (status = 200, description = "Entries removed, foreign ids are skipped", body = ApiResponse<RemovedCount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_entries(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RemoveCartEntriesRequest>,
) -> AppResult<Json<ApiResponse<RemovedCount>>> {
    let resp = cart_service::remove_entries(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<RemovedCount>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RemovedCount>>> {
    let resp = cart_service::clear_cart(&state, &user).await?;
    Ok(Json(resp))
}
