pub mod audit_logs;
pub mod cart_entries;
pub mod carts;
pub mod customer_addresses;
pub mod customers;
pub mod delete_requests;
pub mod listing_reviews;
pub mod listings;
pub mod order_entries;
pub mod orders;
pub mod products;
pub mod sellers;
pub mod users;
pub mod wishlist_entries;
pub mod wishlists;

pub use audit_logs::Entity as AuditLogs;
pub use cart_entries::Entity as CartEntries;
pub use carts::Entity as Carts;
pub use customer_addresses::Entity as CustomerAddresses;
pub use customers::Entity as Customers;
pub use delete_requests::Entity as DeleteRequests;
pub use listing_reviews::Entity as ListingReviews;
pub use listings::Entity as Listings;
pub use order_entries::Entity as OrderEntries;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use sellers::Entity as Sellers;
pub use users::Entity as Users;
pub use wishlist_entries::Entity as WishlistEntries;
pub use wishlists::Entity as Wishlists;
