use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductState {
    New,
    Used,
    Refurbished,
}

impl ProductState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductState::New => "new",
            ProductState::Used => "used",
            ProductState::Refurbished => "refurbished",
        }
    }

    pub fn from_db(value: &str) -> AppResult<ProductState> {
        value
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown product state '{value}'")))
    }
}

impl fmt::Display for ProductState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(ProductState::New),
            "used" => Ok(ProductState::Used),
            "refurbished" => Ok(ProductState::Refurbished),
            _ => Err(AppError::Validation(FieldErrors::single(
                "product_state",
                "Invalid product_state",
            ))),
        }
    }
}

/// Star rating of a review, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i16", into = "i16")]
#[schema(value_type = i16)]
pub struct ReviewRating(i16);

impl ReviewRating {
    pub fn value(&self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for ReviewRating {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(ReviewRating(value))
        } else {
            Err(format!("rating must be between 1 and 5, got {value}"))
        }
    }
}

impl From<ReviewRating> for i16 {
    fn from(rating: ReviewRating) -> Self {
        rating.0
    }
}

pub fn min_listing_price() -> Decimal {
    Decimal::new(1, 2)
}

pub fn max_listing_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Collects listing field problems into `errors`.
pub fn check_listing_fields(
    errors: &mut FieldErrors,
    quantity: Option<i32>,
    price: Option<Decimal>,
) {
    if let Some(quantity) = quantity {
        if quantity < 0 {
            errors.add("quantity", "Invalid quantity: quantity must not be negative");
        }
    }
    if let Some(price) = price {
        if price < min_listing_price() || price > max_listing_price() || price.scale() > 2 {
            errors.add(
                "price",
                "Invalid price: Price must be between 0.01 and 99999999.99",
            );
        }
    }
}
