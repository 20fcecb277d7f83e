use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::ProductState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertCartRequest {
    pub listing_id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartAction {
    Created,
    Updated,
    Removed,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartUpsertResult {
    pub action: CartAction,
    pub entry_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartEntriesRequest {
    pub entry_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub entry_id: Uuid,
    pub listing_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_state: ProductState,
    pub company_name: String,
    pub price_per_unit: Decimal,
    pub amount: i32,
    pub line_total: Decimal,
    pub listing_quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart_id: Uuid,
    pub entries: Vec<CartLine>,
    pub cart_total: Decimal,
    pub is_empty: bool,
}
