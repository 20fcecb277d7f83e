use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        catalog::{ProductState, ReviewRating},
        order_status::OrderStatus,
        user::{AccountProfile, UserRole},
    },
    dto::{
        RemovedCount,
        auth::{DeleteAccountRequest, DeletionScheduled, EditProfileRequest, RegisterRequest},
        cart::{CartAction, CartLine, CartUpsertResult, CartView, RemoveCartEntriesRequest, UpsertCartRequest},
        listings::{CreateListingRequest, ListingList, ListingView, UpdateListingRequest},
        orders::{
            CreateOrderRequest, CustomerContact, OrderCreated, OrderDetails, OrderLine, OrderList,
            OrderStatusChanged, SellerOrderDetails, SellerOrderList, SellerOrderSummary,
            UpdateOrderStatusRequest,
        },
        reviews::{CreateReviewRequest, EditReviewRequest, ReviewList},
        wishlists::{
            RemoveWishlistsRequest, UpsertWishlistRequest, WishlistDetails, WishlistEntryRequest,
            WishlistLine, WishlistList, WishlistUpserted,
        },
    },
    error::FieldErrors,
    models::{Account, CustomerAddress, Listing, Order, Review, ShippingAddress, WishList},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, listings, orders, params, reviews, seller, wishlists},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::me,
        auth::edit_profile,
        auth::request_deletion,
        cart::view_cart,
        cart::upsert_entry,
        cart::remove_entries,
        cart::clear_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        seller::list_listings,
        seller::create_listing,
        seller::get_listing,
        seller::update_listing,
        seller::delete_listing,
        seller::list_orders,
        seller::get_order,
        seller::update_order_status,
        listings::view_listing,
        listings::list_reviews,
        listings::create_review,
        reviews::list_own_reviews,
        reviews::edit_review,
        reviews::delete_review,
        wishlists::list_wishlists,
        wishlists::upsert_wishlist,
        wishlists::remove_wishlists,
        wishlists::get_wishlist,
        wishlists::add_entry,
        wishlists::remove_entry
    ),
    components(
        schemas(
            Account,
            AccountProfile,
            UserRole,
            CustomerAddress,
            Listing,
            ProductState,
            ReviewRating,
            Order,
            OrderStatus,
            ShippingAddress,
            Review,
            WishList,
            FieldErrors,
            RemovedCount,
            RegisterRequest,
            EditProfileRequest,
            DeleteAccountRequest,
            DeletionScheduled,
            CartAction,
            CartLine,
            CartUpsertResult,
            CartView,
            UpsertCartRequest,
            RemoveCartEntriesRequest,
            CreateListingRequest,
            UpdateListingRequest,
            ListingList,
            ListingView,
            CreateOrderRequest,
            OrderCreated,
            OrderList,
            OrderLine,
            OrderDetails,
            UpdateOrderStatusRequest,
            OrderStatusChanged,
            SellerOrderSummary,
            SellerOrderList,
            SellerOrderDetails,
            CustomerContact,
            CreateReviewRequest,
            EditReviewRequest,
            ReviewList,
            UpsertWishlistRequest,
            WishlistUpserted,
            WishlistEntryRequest,
            RemoveWishlistsRequest,
            WishlistList,
            WishlistLine,
            WishlistDetails,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            params::ReviewOrder,
            params::ReviewQuery,
            Meta,
            ApiResponse<Account>,
            ApiResponse<CartView>,
            ApiResponse<OrderDetails>,
            ApiResponse<OrderList>,
            ApiResponse<Listing>,
            ApiResponse<WishlistDetails>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Account registration and profile"),
        (name = "Cart", description = "Customer cart endpoints"),
        (name = "Orders", description = "Customer order endpoints"),
        (name = "Seller", description = "Seller listings and orders"),
        (name = "Listings", description = "Public listing endpoints"),
        (name = "Reviews", description = "Customer review endpoints"),
        (name = "Wishlists", description = "Customer wishlist endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
