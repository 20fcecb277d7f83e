use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::catalog::ReviewRating, models::Review};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub title: String,
    pub description: Option<String>,
    pub rating: ReviewRating,
}

/// Only the fields that are present overwrite the stored review.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EditReviewRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<ReviewRating>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
