use serde::Serialize;
use utoipa::ToSchema;

pub mod auth;
pub mod cart;
pub mod listings;
pub mod orders;
pub mod reviews;
pub mod wishlists;

/// Outcome of a bulk delete: ids that did not belong to the caller are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RemovedCount {
    pub requested: u64,
    pub removed: u64,
}
