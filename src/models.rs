use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        catalog::{ProductState, ReviewRating},
        order_status::OrderStatus,
        user::AccountProfile,
    },
    entity::{
        cart_entries, customer_addresses, listing_reviews, listings, order_entries, orders,
        wishlists,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub created_at: DateTime<Utc>,
    pub profile: AccountProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerAddress {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

impl From<customer_addresses::Model> for CustomerAddress {
    fn from(model: customer_addresses::Model) -> Self {
        Self {
            id: model.id,
            street: model.street,
            city: model.city,
            state: model.state,
            country: model.country,
            postal_code: model.postal_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub product_state: ProductState,
    pub available: bool,
    pub purchase_count: i32,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Listing {
    pub fn from_entity(model: listings::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            product_id: model.product_id,
            seller_id: model.seller_id,
            quantity: model.quantity,
            price: model.price,
            product_state: ProductState::from_db(&model.product_state)?,
            available: model.available,
            purchase_count: model.purchase_count,
            view_count: model.view_count,
            created_at: model.created_at.with_timezone(&Utc),
            modified_at: model.modified_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartEntry {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub listing_id: Uuid,
    pub amount: i32,
}

impl From<cart_entries::Model> for CartEntry {
    fn from(model: cart_entries::Model) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            listing_id: model.listing_id,
            amount: model.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub price: Decimal,
    pub status: OrderStatus,
    pub purchased_at: DateTime<Utc>,
    pub shipping_address: ShippingAddress,
}

impl Order {
    pub fn from_entity(model: orders::Model) -> AppResult<Self> {
        Ok(Self {
            id: model.id,
            customer_id: model.customer_id,
            price: model.price,
            status: OrderStatus::from_db(&model.order_status)?,
            purchased_at: model.purchased_at.with_timezone(&Utc),
            shipping_address: ShippingAddress {
                street: model.address_street,
                city: model.address_city,
                state: model.address_state,
                country: model.address_country,
                postal_code: model.address_postal_code,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub listing_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl From<order_entries::Model> for OrderEntry {
    fn from(model: order_entries::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            listing_id: model.listing_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishList {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<wishlists::Model> for WishList {
    fn from(model: wishlists::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub listing_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: ReviewRating,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Review {
    pub fn from_entity(model: listing_reviews::Model) -> AppResult<Self> {
        let rating = ReviewRating::try_from(model.rating)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        Ok(Self {
            id: model.id,
            customer_id: model.customer_id,
            listing_id: model.listing_id,
            title: model.title,
            description: model.description,
            rating,
            created_at: model.created_at.with_timezone(&Utc),
            modified_at: model.modified_at.with_timezone(&Utc),
        })
    }
}
