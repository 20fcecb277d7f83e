use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub company_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Claims carried by bearer tokens from the identity provider.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Partial profile update. `phone_number` applies to customers, `company_name` to sellers.
/// A blank `phone_number` clears it.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct EditProfileRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct DeleteAccountRequest {
    pub reason: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DeletionScheduled {
    pub requested_at: DateTime<Utc>,
    pub to_be_removed_at: DateTime<Utc>,
}
