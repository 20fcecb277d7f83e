use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::auth::{DeleteAccountRequest, DeletionScheduled, EditProfileRequest, RegisterRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Account,
    response::ApiResponse,
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me).patch(edit_profile).delete(request_deletion))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register a customer or seller account", body = ApiResponse<Account>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Account>>)> {
    let resp = account_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account with its role profile", body = ApiResponse<Account>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Account>>> {
    let resp = account_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/auth/me",
    request_body = EditProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Account>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn edit_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<EditProfileRequest>,
) -> AppResult<Json<ApiResponse<Account>>> {
    let resp = account_service::edit_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/auth/me",
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, description = "Deletion scheduled after the grace period", body = ApiResponse<DeletionScheduled>),
        (status = 400, description = "Missing reason"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Deletion already requested")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn request_deletion(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteAccountRequest>,
) -> AppResult<Json<ApiResponse<DeletionScheduled>>> {
    let resp = account_service::request_deletion(&state, &user, payload).await?;
    Ok(Json(resp))
}
