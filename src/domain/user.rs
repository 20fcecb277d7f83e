use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::CustomerAddress,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_db(value: &str) -> AppResult<UserRole> {
        value
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("unknown user role '{value}'")))
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(UserRole::Customer),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            _ => Err(AppError::Validation(FieldErrors::single(
                "role",
                format!("Invalid role: {s}"),
            ))),
        }
    }
}

/// Role specific part of an account, stored next to the shared `users` row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AccountProfile {
    Customer {
        phone_number: Option<String>,
        addresses: Vec<CustomerAddress>,
    },
    Seller {
        company_name: String,
        #[schema(value_type = Option<String>)]
        rating: Option<Decimal>,
    },
    Admin,
}

impl AccountProfile {
    pub fn role(&self) -> UserRole {
        match self {
            AccountProfile::Customer { .. } => UserRole::Customer,
            AccountProfile::Seller { .. } => UserRole::Seller,
            AccountProfile::Admin => UserRole::Admin,
        }
    }
}
