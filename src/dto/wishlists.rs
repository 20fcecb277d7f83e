use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::catalog::ProductState, models::WishList};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertWishlistRequest {
    pub wishlist_id: Option<Uuid>,
    pub wishlist_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistUpserted {
    pub wishlist: WishList,
    pub created: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WishlistEntryRequest {
    pub listing_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveWishlistsRequest {
    pub wishlist_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistList {
    pub items: Vec<WishList>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistLine {
    pub entry_id: Uuid,
    pub listing_id: Uuid,
    pub product_name: String,
    pub product_state: ProductState,
    pub price_per_unit: Decimal,
    pub company_name: String,
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistDetails {
    pub wishlist: WishList,
    pub entries: Vec<WishlistLine>,
    pub is_empty: bool,
}
