use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::order_status::OrderStatus,
    error::{AppResult, FieldErrors},
    models::{Order, ShippingAddress},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address_street: String,
    pub address_city: String,
    pub address_state: String,
    pub address_country: String,
    pub address_postal_code: String,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<ShippingAddress> {
        let mut errors = FieldErrors::default();
        errors.require_text("address_street", &self.address_street, 128);
        errors.require_text("address_city", &self.address_city, 64);
        errors.require_text("address_state", &self.address_state, 64);
        errors.require_text("address_country", &self.address_country, 64);
        errors.require_text("address_postal_code", &self.address_postal_code, 16);
        errors.into_result()?;

        Ok(ShippingAddress {
            street: self.address_street.trim().to_string(),
            city: self.address_city.trim().to_string(),
            state: self.address_state.trim().to_string(),
            country: self.address_country.trim().to_string(),
            postal_code: self.address_postal_code.trim().to_string(),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// One purchased line, joined with its listing and product.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLine {
    pub entry_id: Uuid,
    pub listing_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub seller_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub entries: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusChanged {
    pub order_id: Uuid,
    pub new_status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderSummary {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub purchased_at: DateTime<Utc>,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderList {
    pub items: Vec<SellerOrderSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
}

/// Seller view of an order: only the lines that reference the seller's listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderDetails {
    pub order: Order,
    pub customer: CustomerContact,
    pub entries: Vec<OrderLine>,
}
