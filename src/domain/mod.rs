//! Business rules that do not touch storage.
//!
//! Services load rows, hand the relevant values to these functions and persist
//! whatever they return, so every rule here is checked inside the caller's
//! transaction.

pub mod cart;
pub mod catalog;
pub mod order_status;
pub mod stock;
pub mod user;
pub mod wishlist;
