use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Listing;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub product_state: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
    pub product_state: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingList {
    pub items: Vec<Listing>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingView {
    pub listing: Listing,
    pub product_name: String,
    pub product_description: Option<String>,
    pub company_name: String,
    pub average_rating: f64,
    pub review_count: i64,
}
