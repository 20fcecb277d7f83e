pub mod account_service;
pub mod cart_service;
pub mod inventory_service;
pub mod listing_service;
pub mod order_service;
pub mod review_service;
pub mod wishlist_service;
