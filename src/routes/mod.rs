use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod listings;
pub mod orders;
pub mod params;
pub mod reviews;
pub mod seller;
pub mod wishlists;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/seller", seller::router())
        .nest("/listings", listings::router())
        .nest("/reviews", reviews::router())
        .nest("/wishlists", wishlists::router())
}
